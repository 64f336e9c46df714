//! Task CRUD operations.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Task;

/// Create a new task under a service.
pub async fn create_task(pool: &SqlitePool, task: &Task) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tasks (id, organization_id, service_id, title, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.id)
    .bind(&task.organization_id)
    .bind(&task.service_id)
    .bind(&task.title)
    .bind(&task.status)
    .execute(pool)
    .await?;

    Ok(())
}

/// List a service's tasks, ordered by title.
pub async fn list_tasks_for_service(pool: &SqlitePool, service_id: &str) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, organization_id, service_id, title, status, created_at
        FROM tasks
        WHERE service_id = ?
        ORDER BY title
        "#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(tasks)
}
