use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    envelope::Envelope,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
    tasks::{
        dto::{CreateTaskRequest, TaskIdsRequest, TaskStatusRequest, UpdateTaskRequest},
        repo_types::Task,
        services,
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tasks",
            get(list_tasks).post(create_task).delete(delete_tasks),
        )
        .route("/tasks/status", put(update_tasks_status))
        .route("/tasks/:id", get(get_task).put(update_task))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> ApiResult<Task> {
    let task = services::create(&state, user_id, payload).await?;
    Ok(Envelope::ok("Task created successfully", task))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<Task>> {
    let tasks = services::list(&state, user_id).await?;
    Ok(Envelope::ok("Tasks retrieved successfully", tasks))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Task> {
    let task = services::get(&state, user_id, id).await?;
    Ok(Envelope::ok("Task retrieved successfully", task))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Task> {
    let task = services::update(&state, user_id, id, payload).await?;
    Ok(Envelope::ok("Task updated successfully", task))
}

#[instrument(skip(state, payload))]
pub async fn delete_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<TaskIdsRequest>,
) -> ApiResult<()> {
    services::delete_many(&state, user_id, &payload.ids).await?;
    Ok(Envelope::message("Tasks deleted successfully"))
}

#[instrument(skip(state, payload))]
pub async fn update_tasks_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<TaskStatusRequest>,
) -> ApiResult<()> {
    services::set_status_many(&state, user_id, payload).await?;
    Ok(Envelope::message("Tasks updated successfully"))
}
