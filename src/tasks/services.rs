use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    db::StoreError,
    error::AppError,
    state::AppState,
    tasks::{
        dto::{CreateTaskRequest, TaskStatusRequest, UpdateTaskRequest},
        repo::TaskStore,
        repo_types::{Task, TaskStatus, DEFAULT_PRIORITY},
    },
};

fn store_failure(msg: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |e| {
        error!(error = %e, "{}", msg);
        AppError::internal(msg)
    }
}

fn parse_status(raw: Option<&str>) -> Result<TaskStatus, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(TaskStatus::default()),
        Some(s) => s
            .parse::<TaskStatus>()
            .map_err(|e| AppError::validation(e.to_string())),
    }
}

fn or_default_priority(priority: Option<String>) -> String {
    priority
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PRIORITY.to_string())
}

fn not_found() -> AppError {
    AppError::not_found("Task not found")
}

pub async fn create(
    state: &AppState,
    user_id: Uuid,
    req: CreateTaskRequest,
) -> Result<Task, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Task title is required"));
    }
    let status = parse_status(req.status.as_deref())?;

    let now = OffsetDateTime::now_utc();
    let task = Task {
        id: Uuid::new_v4(),
        user_id,
        title: title.to_string(),
        short_desc: req.short_desc,
        long_desc: req.long_desc,
        priority: or_default_priority(req.priority),
        status,
        due_time: req.time,
        due_date: req.date,
        tags: req.tags,
        created_at: now,
        updated_at: now,
    };

    let task = state
        .store
        .insert_task(&task)
        .await
        .map_err(store_failure("Failed to create task"))?;

    info!(%user_id, task_id = %task.id, "task created");
    Ok(task)
}

pub async fn list(state: &AppState, user_id: Uuid) -> Result<Vec<Task>, AppError> {
    state
        .store
        .list_tasks(user_id)
        .await
        .map_err(store_failure("Failed to get tasks"))
}

pub async fn get(state: &AppState, user_id: Uuid, id: Uuid) -> Result<Task, AppError> {
    state
        .store
        .get_task(user_id, id)
        .await
        .map_err(store_failure("Failed to get task"))?
        .ok_or_else(not_found)
}

/// Applies the supplied fields over the caller's task. Read and write are both scoped
/// to the caller, so a task that changes hands in between is reported as missing.
pub async fn update(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    req: UpdateTaskRequest,
) -> Result<Task, AppError> {
    let mut task = get(state, user_id, id).await?;

    if let Some(title) = req.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Task title is required"));
        }
        task.title = title.to_string();
    }
    // Blank status or priority leaves the stored value alone.
    if let Some(status) = req.status.as_deref().filter(|s| !s.trim().is_empty()) {
        task.status = parse_status(Some(status))?;
    }
    if let Some(priority) = req.priority.filter(|p| !p.trim().is_empty()) {
        task.priority = priority.trim().to_string();
    }
    if let Some(v) = req.short_desc {
        task.short_desc = v;
    }
    if let Some(v) = req.long_desc {
        task.long_desc = v;
    }
    if let Some(v) = req.time {
        task.due_time = v;
    }
    if let Some(v) = req.date {
        task.due_date = v;
    }
    if let Some(v) = req.tags {
        task.tags = v;
    }

    let task = state
        .store
        .update_task(&task)
        .await
        .map_err(store_failure("Failed to update task"))?
        .ok_or_else(not_found)?;

    info!(%user_id, task_id = %task.id, "task updated");
    Ok(task)
}

/// Deletes the caller's tasks among `ids`. Foreign or unknown ids are skipped; if
/// none matched the result is `NotFound`.
pub async fn delete_many(state: &AppState, user_id: Uuid, ids: &[Uuid]) -> Result<u64, AppError> {
    if ids.is_empty() {
        return Err(AppError::validation("No IDs provided"));
    }
    let deleted = state
        .store
        .delete_tasks(user_id, ids)
        .await
        .map_err(store_failure("Failed to delete tasks"))?;
    if deleted == 0 {
        warn!(%user_id, requested = ids.len(), "batch delete matched nothing");
        return Err(not_found());
    }
    info!(%user_id, deleted, "tasks deleted");
    Ok(deleted)
}

pub async fn set_status_many(
    state: &AppState,
    user_id: Uuid,
    req: TaskStatusRequest,
) -> Result<u64, AppError> {
    if req.ids.is_empty() {
        return Err(AppError::validation("No IDs provided"));
    }
    if req.status.trim().is_empty() {
        return Err(AppError::validation("Status is required"));
    }
    let status = parse_status(Some(&req.status))?;

    let updated = state
        .store
        .set_tasks_status(user_id, &req.ids, status)
        .await
        .map_err(store_failure("Failed to update tasks"))?;
    if updated == 0 {
        return Err(not_found());
    }
    info!(%user_id, updated, %status, "task status updated");
    Ok(updated)
}
