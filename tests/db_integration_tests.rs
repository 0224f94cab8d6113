//! Integration tests for the database layer.
//!
//! These tests verify account and task storage using an in-memory SQLite database.

use task_store::db::Database;
use task_store::error::{ApiError, ErrorCode};
use task_store::types::{Scope, TaskPatch};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn error_code(err: anyhow::Error) -> ErrorCode {
    ApiError::from(err).code
}

mod user_tests {
    use super::*;

    #[test]
    fn create_user_assigns_id_and_timestamp() {
        let db = setup_db();

        let user = db.create_user("alice", "$2b$04$hash").unwrap();
        assert!(user.id > 0);
        assert_eq!(user.username, "alice");
        assert!(!user.created_at.is_empty());

        let fetched = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched, user);
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let db = setup_db();
        db.create_user("alice", "h1").unwrap();

        let err = db.create_user("alice", "h2").unwrap_err();
        assert_eq!(error_code(err), ErrorCode::AlreadyExists);
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let db = setup_db();
        db.create_user("alice", "h1").unwrap();
        assert!(db.create_user("Alice", "h2").is_ok());
    }

    #[test]
    fn find_by_username_returns_hash() {
        let db = setup_db();
        let user = db.create_user("bob", "stored-hash").unwrap();

        let creds = db.find_user_by_username("bob").unwrap().unwrap();
        assert_eq!(creds.user.id, user.id);
        assert_eq!(creds.password_hash, "stored-hash");

        assert!(db.find_user_by_username("nobody").unwrap().is_none());
    }
}

mod task_tests {
    use super::*;

    #[test]
    fn create_task_starts_incomplete() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();

        let task = db.create_task(Scope::Owner(alice.id), "buy milk").unwrap();
        assert_eq!(task.text, "buy milk");
        assert!(!task.done);
        assert!(!task.created_at.is_empty());
    }

    #[test]
    fn create_task_rejects_blank_text() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();

        for text in ["", "   "] {
            let err = db.create_task(Scope::Owner(alice.id), text).unwrap_err();
            assert_eq!(error_code(err), ErrorCode::MissingRequiredField);
        }
        assert!(db.list_tasks(Scope::Owner(alice.id)).unwrap().is_empty());
    }

    #[test]
    fn list_is_newest_first_and_ids_increase() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();
        let scope = Scope::Owner(alice.id);

        let first = db.create_task(scope, "one").unwrap();
        let second = db.create_task(scope, "two").unwrap();
        let third = db.create_task(scope, "three").unwrap();
        assert!(first.id < second.id && second.id < third.id);

        let texts: Vec<String> = db
            .list_tasks(scope)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["three", "two", "one"]);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();
        let scope = Scope::Owner(alice.id);

        let first = db.create_task(scope, "one").unwrap();
        db.delete_task(scope, first.id).unwrap();
        let second = db.create_task(scope, "two").unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn partial_update_leaves_other_fields() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();
        let scope = Scope::Owner(alice.id);
        let task = db.create_task(scope, "buy milk").unwrap();

        let done = db
            .update_task(
                scope,
                task.id,
                &TaskPatch {
                    text: None,
                    done: Some(true),
                },
            )
            .unwrap();
        assert!(done.done);
        assert_eq!(done.text, "buy milk");
        assert_eq!(done.created_at, task.created_at);

        let renamed = db
            .update_task(
                scope,
                task.id,
                &TaskPatch {
                    text: Some("buy oat milk".to_string()),
                    done: None,
                },
            )
            .unwrap();
        assert!(renamed.done);
        assert_eq!(renamed.text, "buy oat milk");
    }

    #[test]
    fn empty_patch_returns_task_unchanged() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();
        let scope = Scope::Owner(alice.id);
        let task = db.create_task(scope, "buy milk").unwrap();

        let same = db.update_task(scope, task.id, &TaskPatch::default()).unwrap();
        assert_eq!(same, task);
    }

    #[test]
    fn update_rejects_blank_text() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();
        let scope = Scope::Owner(alice.id);
        let task = db.create_task(scope, "buy milk").unwrap();

        let patch = TaskPatch {
            text: Some(String::new()),
            done: None,
        };
        let err = db.update_task(scope, task.id, &patch).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::InvalidFieldValue);
        assert_eq!(db.get_task(scope, task.id).unwrap().unwrap().text, "buy milk");
    }

    #[test]
    fn missing_task_is_not_found() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();
        let scope = Scope::Owner(alice.id);

        let err = db
            .update_task(
                scope,
                999,
                &TaskPatch {
                    text: None,
                    done: Some(true),
                },
            )
            .unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);

        let err = db.delete_task(scope, 999).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);

        let err = db.update_task(scope, 999, &TaskPatch::default()).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);
    }
}

mod scoping_tests {
    use super::*;

    #[test]
    fn owners_see_only_their_tasks() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();
        let bob = db.create_user("bob", "h").unwrap();

        db.create_task(Scope::Owner(alice.id), "alice task").unwrap();
        db.create_task(Scope::Owner(bob.id), "bob task").unwrap();

        let alice_tasks = db.list_tasks(Scope::Owner(alice.id)).unwrap();
        assert_eq!(alice_tasks.len(), 1);
        assert_eq!(alice_tasks[0].text, "alice task");

        let bob_tasks = db.list_tasks(Scope::Owner(bob.id)).unwrap();
        assert_eq!(bob_tasks.len(), 1);
        assert_eq!(bob_tasks[0].text, "bob task");
    }

    #[test]
    fn foreign_task_looks_missing_and_is_untouched() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();
        let bob = db.create_user("bob", "h").unwrap();
        let task = db.create_task(Scope::Owner(alice.id), "private").unwrap();

        assert!(db.get_task(Scope::Owner(bob.id), task.id).unwrap().is_none());

        let patch = TaskPatch {
            text: Some("hijacked".to_string()),
            done: Some(true),
        };
        let err = db.update_task(Scope::Owner(bob.id), task.id, &patch).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);

        let err = db.delete_task(Scope::Owner(bob.id), task.id).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);

        let unchanged = db.get_task(Scope::Owner(alice.id), task.id).unwrap().unwrap();
        assert_eq!(unchanged, task);
    }

    #[test]
    fn global_scope_sees_everything() {
        let db = setup_db();
        let alice = db.create_user("alice", "h").unwrap();

        db.create_task(Scope::Owner(alice.id), "owned").unwrap();
        let orphan = db.create_task(Scope::Global, "unowned").unwrap();

        assert_eq!(db.list_tasks(Scope::Global).unwrap().len(), 2);
        // Unowned tasks never show up for a signed-in user.
        assert!(db.get_task(Scope::Owner(alice.id), orphan.id).unwrap().is_none());
    }
}
