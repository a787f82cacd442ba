use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    categories::{dto::CategoryRequest, repo_types::Category, services},
    envelope::Envelope,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            put(update_category).delete(delete_category),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> ApiResult<Category> {
    let category = services::create(&state, user_id, payload).await?;
    Ok(Envelope::ok("Category created successfully", category))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<Category>> {
    let categories = services::list(&state, user_id).await?;
    Ok(Envelope::ok("Categories retrieved successfully", categories))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> ApiResult<Category> {
    let category = services::update(&state, user_id, id, payload).await?;
    Ok(Envelope::ok("Category updated successfully", category))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    services::delete(&state, user_id, id).await?;
    Ok(Envelope::message("Category deleted successfully"))
}
