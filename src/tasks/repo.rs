use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{Task, TaskStatus};
use crate::db::{PgStore, StoreResult};

/// Owner-scoped task persistence. Every query carries `user_id`; a task owned by
/// someone else behaves exactly like a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: &Task) -> StoreResult<Task>;

    async fn list_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn get_task(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Task>>;

    /// Writes every mutable column of `task`, matched on `(id, user_id)`.
    async fn update_task(&self, task: &Task) -> StoreResult<Option<Task>>;

    async fn delete_tasks(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64>;

    async fn set_tasks_status(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
        status: TaskStatus,
    ) -> StoreResult<u64>;
}

const TASK_COLUMNS: &str = "id, user_id, title, short_desc, long_desc, priority, status, due_time, due_date, tags, created_at, updated_at";

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<Task> {
        let sql = format!(
            r#"
            INSERT INTO tasks (id, user_id, title, short_desc, long_desc, priority, status,
                               due_time, due_date, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TASK_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(task.user_id)
            .bind(&task.title)
            .bind(&task.short_desc)
            .bind(&task.long_desc)
            .bind(&task.priority)
            .bind(task.status.as_str())
            .bind(&task.due_time)
            .bind(&task.due_date)
            .bind(&task.tags)
            .fetch_one(&self.pool)
            .await
            .context("insert task")?;
        Ok(row)
    }

    async fn list_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("list tasks")?;
        Ok(rows)
    }

    async fn get_task(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("get task")?;
        Ok(row)
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        let sql = format!(
            r#"
            UPDATE tasks
               SET title = $3, short_desc = $4, long_desc = $5, priority = $6, status = $7,
                   due_time = $8, due_date = $9, tags = $10, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(task.user_id)
            .bind(&task.title)
            .bind(&task.short_desc)
            .bind(&task.long_desc)
            .bind(&task.priority)
            .bind(task.status.as_str())
            .bind(&task.due_time)
            .bind(&task.due_date)
            .bind(&task.tags)
            .fetch_optional(&self.pool)
            .await
            .context("update task")?;
        Ok(row)
    }

    async fn delete_tasks(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let res = sqlx::query("DELETE FROM tasks WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .execute(&self.pool)
            .await
            .context("delete tasks")?;
        Ok(res.rows_affected())
    }

    async fn set_tasks_status(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
        status: TaskStatus,
    ) -> StoreResult<u64> {
        let res = sqlx::query(
            r#"
            UPDATE tasks
               SET status = $3, updated_at = now()
             WHERE user_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(ids)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .context("set tasks status")?;
        Ok(res.rows_affected())
    }
}
