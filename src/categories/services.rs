use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    categories::{
        dto::CategoryRequest,
        repo::CategoryStore,
        repo_types::{Category, DEFAULT_COLOR},
    },
    db::StoreError,
    error::AppError,
    state::AppState,
};

fn store_failure(msg: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |e| {
        error!(error = %e, "{}", msg);
        AppError::internal(msg)
    }
}

fn not_found() -> AppError {
    AppError::not_found("Category not found")
}

fn color_or_default(color: String) -> String {
    let color = color.trim();
    if color.is_empty() {
        DEFAULT_COLOR.to_string()
    } else {
        color.to_string()
    }
}

pub async fn create(
    state: &AppState,
    user_id: Uuid,
    req: CategoryRequest,
) -> Result<Category, AppError> {
    let name = req.name.unwrap_or_default();
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }

    let now = OffsetDateTime::now_utc();
    let category = Category {
        id: Uuid::new_v4(),
        user_id,
        name: name.to_string(),
        color: color_or_default(req.color.unwrap_or_default()),
        created_at: now,
        updated_at: now,
    };

    let category = state
        .store
        .insert_category(&category)
        .await
        .map_err(store_failure("Failed to create category"))?;

    info!(%user_id, category_id = %category.id, "category created");
    Ok(category)
}

pub async fn list(state: &AppState, user_id: Uuid) -> Result<Vec<Category>, AppError> {
    state
        .store
        .list_categories(user_id)
        .await
        .map_err(store_failure("Failed to retrieve categories"))
}

/// Merges the body over the stored category. A name given as blank is rejected; a
/// blank color falls back to the default.
pub async fn update(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    req: CategoryRequest,
) -> Result<Category, AppError> {
    let mut category = state
        .store
        .get_category(user_id, id)
        .await
        .map_err(store_failure("Failed to update category"))?
        .ok_or_else(not_found)?;

    if let Some(name) = req.name {
        category.name = name.trim().to_string();
    }
    if category.name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if let Some(color) = req.color {
        category.color = color_or_default(color);
    }

    let category = state
        .store
        .update_category(&category)
        .await
        .map_err(store_failure("Failed to update category"))?
        .ok_or_else(not_found)?;

    info!(%user_id, category_id = %category.id, "category updated");
    Ok(category)
}

pub async fn delete(state: &AppState, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let deleted = state
        .store
        .delete_category(user_id, id)
        .await
        .map_err(store_failure("Failed to delete category"))?;
    if !deleted {
        return Err(not_found());
    }
    info!(%user_id, category_id = %id, "category deleted");
    Ok(())
}
