//! Integration tests for the script, execution, and user repositories.
//!
//! Exercises the repository layer against a real SQLite database to verify:
//! - Soft-deleted scripts and executions are hidden from reads
//! - An execution leaves `running` exactly once
//! - A worker can still finish a record that was deleted while it ran
//! - Listing is newest-first and filterable by script

use assert_matches::assert_matches;
use runlet_core::scripting::outcome::ExecutionOutcome;
use runlet_core::scripting::status::ExecutionStatus;
use runlet_db::models::execution::CreateExecution;
use runlet_db::models::script::{CreateScript, Script, UpdateScript};
use runlet_db::models::user::CreateUser;
use runlet_db::repositories::{ExecutionRepo, ScriptRepo, UserRepo};
use runlet_db::DbPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_script(pool: &DbPool, name: &str) -> Script {
    ScriptRepo::create(
        pool,
        &CreateScript {
            name: name.to_string(),
            script_type: "shell".to_string(),
            content: "echo hi".to_string(),
        },
    )
    .await
    .unwrap()
}

async fn new_execution(pool: &DbPool, script: &Script) -> i64 {
    ExecutionRepo::create(
        pool,
        &CreateExecution::for_script(script.id, &script.name, &script.script_type),
    )
    .await
    .unwrap()
    .id
}

fn success(output: &str) -> ExecutionOutcome {
    ExecutionOutcome {
        status: ExecutionStatus::Success,
        output: output.to_string(),
        error_message: None,
        exit_code: Some(0),
        duration_ms: Some(5),
    }
}

// ---------------------------------------------------------------------------
// Scripts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_script_crud(pool: DbPool) {
    let script = new_script(&pool, "first").await;
    assert_eq!(script.script_type, "shell");

    let updated = ScriptRepo::update(
        &pool,
        script.id,
        &UpdateScript {
            content: Some("echo changed".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .expect("script exists");
    assert_eq!(updated.name, "first");
    assert_eq!(updated.content, "echo changed");

    let second = new_script(&pool, "second").await;
    let all = ScriptRepo::list(&pool).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![script.id, second.id]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_script_soft_delete_hides_row(pool: DbPool) {
    let script = new_script(&pool, "doomed").await;

    assert!(ScriptRepo::soft_delete(&pool, script.id).await.unwrap());
    assert!(ScriptRepo::find_by_id(&pool, script.id).await.unwrap().is_none());
    assert!(ScriptRepo::list(&pool).await.unwrap().is_empty());

    // Idempotent: second delete reports nothing changed.
    assert!(!ScriptRepo::soft_delete(&pool, script.id).await.unwrap());

    // Deleted scripts cannot be updated.
    let result = ScriptRepo::update(&pool, script.id, &UpdateScript::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Executions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_execution_created_running(pool: DbPool) {
    let script = new_script(&pool, "job").await;
    let id = new_execution(&pool, &script).await;

    let record = ExecutionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Running.as_str());
    assert_eq!(record.output, "");
    assert!(record.end_time.is_none());
    assert!(record.error_message.is_none());
    assert_eq!(record.script_name, "job");
    assert!(record.name.starts_with(&format!("shell_{}_job_", script.id)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_execution_finishes_exactly_once(pool: DbPool) {
    let script = new_script(&pool, "job").await;
    let id = new_execution(&pool, &script).await;

    assert!(ExecutionRepo::finish(&pool, id, &success("hi\n")).await.unwrap());

    let late = ExecutionOutcome::scheduling_failed("worker queue is full");
    assert!(!ExecutionRepo::finish(&pool, id, &late).await.unwrap());

    let record = ExecutionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Success.as_str());
    assert_eq!(record.output, "hi\n");
    assert_eq!(record.exit_code, Some(0));
    assert_eq!(record.duration_ms, Some(5));
    assert!(record.end_time.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_execution_keeps_detail(pool: DbPool) {
    let script = new_script(&pool, "job").await;
    let id = new_execution(&pool, &script).await;

    let outcome = ExecutionOutcome {
        status: ExecutionStatus::Failed,
        output: "partial\n".to_string(),
        error_message: Some("process exited with status 3".to_string()),
        exit_code: Some(3),
        duration_ms: Some(9),
    };
    ExecutionRepo::finish(&pool, id, &outcome).await.unwrap();

    let record = ExecutionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Failed.as_str());
    assert_eq!(record.output, "partial\n");
    assert_eq!(
        record.error_message.as_deref(),
        Some("process exited with status 3")
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleted_execution_can_still_finish(pool: DbPool) {
    let script = new_script(&pool, "job").await;
    let id = new_execution(&pool, &script).await;

    assert!(ExecutionRepo::soft_delete(&pool, id).await.unwrap());
    assert!(ExecutionRepo::find_by_id(&pool, id).await.unwrap().is_none());

    assert!(ExecutionRepo::finish(&pool, id, &success("")).await.unwrap());
    let status: String = sqlx::query_scalar("SELECT status FROM executions WHERE id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "success");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fail_abandoned_only_touches_running(pool: DbPool) {
    let script = new_script(&pool, "job").await;
    let done = new_execution(&pool, &script).await;
    ExecutionRepo::finish(&pool, done, &success("ok\n")).await.unwrap();
    let stuck = new_execution(&pool, &script).await;
    let hidden = new_execution(&pool, &script).await;
    ExecutionRepo::soft_delete(&pool, hidden).await.unwrap();

    let changed = ExecutionRepo::fail_abandoned(&pool, "server restarted").await.unwrap();
    assert_eq!(changed, 2);

    let record = ExecutionRepo::find_by_id(&pool, stuck).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Failed.as_str());
    assert_eq!(record.error_message.as_deref(), Some("server restarted"));
    assert!(record.end_time.is_some());

    let record = ExecutionRepo::find_by_id(&pool, done).await.unwrap().unwrap();
    assert_eq!(record.status, ExecutionStatus::Success.as_str());
    assert_eq!(record.output, "ok\n");

    // A finished record is never reopened by a late worker.
    assert!(!ExecutionRepo::finish(&pool, stuck, &success("")).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_newest_first_with_filter(pool: DbPool) {
    let a = new_script(&pool, "a").await;
    let b = new_script(&pool, "b").await;

    let a1 = new_execution(&pool, &a).await;
    let b1 = new_execution(&pool, &b).await;
    let a2 = new_execution(&pool, &a).await;

    let all: Vec<i64> = ExecutionRepo::list(&pool, None)
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(all, vec![a2, b1, a1]);

    let only_a: Vec<i64> = ExecutionRepo::list(&pool, Some(a.id))
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(only_a, vec![a2, a1]);

    ExecutionRepo::soft_delete(&pool, a2).await.unwrap();
    let after_delete = ExecutionRepo::list(&pool, Some(a.id)).await.unwrap();
    assert_eq!(after_delete.len(), 1);
    assert_eq!(after_delete[0].id, a1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_execution_requires_existing_script(pool: DbPool) {
    let result = ExecutionRepo::create(
        &pool,
        &CreateExecution::for_script(999, "ghost", "shell"),
    )
    .await;
    assert_matches!(result, Err(sqlx::Error::Database(_)));
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_user_lookup_and_password_update(pool: DbPool) {
    let user = UserRepo::create(
        &pool,
        &CreateUser {
            username: "alice".to_string(),
            password_hash: "hash-1".to_string(),
        },
    )
    .await
    .unwrap();

    let found = UserRepo::find_by_username(&pool, "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user.id);
    assert!(UserRepo::find_by_username(&pool, "bob").await.unwrap().is_none());

    assert!(UserRepo::update_password(&pool, user.id, "hash-2").await.unwrap());
    let reloaded = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.password_hash, "hash-2");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_username_rejected(pool: DbPool) {
    let input = CreateUser {
        username: "alice".to_string(),
        password_hash: "hash".to_string(),
    };
    UserRepo::create(&pool, &input).await.unwrap();
    let result = UserRepo::create(&pool, &input).await;
    assert_matches!(result, Err(sqlx::Error::Database(_)));
}
