use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::Category;
use crate::db::{PgStore, StoreResult};

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn insert_category(&self, category: &Category) -> StoreResult<Category>;

    async fn list_categories(&self, user_id: Uuid) -> StoreResult<Vec<Category>>;

    async fn get_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Category>>;

    /// Saves name and color, matched on `(id, user_id)`.
    async fn update_category(&self, category: &Category) -> StoreResult<Option<Category>>;

    async fn delete_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, color, created_at, updated_at";

#[async_trait]
impl CategoryStore for PgStore {
    async fn insert_category(&self, category: &Category) -> StoreResult<Category> {
        let sql = format!(
            r#"
            INSERT INTO categories (id, user_id, name, color)
            VALUES ($1, $2, $3, $4)
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(category.user_id)
            .bind(&category.name)
            .bind(&category.color)
            .fetch_one(&self.pool)
            .await
            .context("insert category")?;
        Ok(row)
    }

    async fn list_categories(&self, user_id: Uuid) -> StoreResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, Category>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("list categories")?;
        Ok(rows)
    }

    async fn get_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Category>> {
        let sql =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("get category")?;
        Ok(row)
    }

    async fn update_category(&self, category: &Category) -> StoreResult<Option<Category>> {
        let sql = format!(
            r#"
            UPDATE categories
               SET name = $3, color = $4, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(category.user_id)
            .bind(&category.name)
            .bind(&category.color)
            .fetch_optional(&self.pool)
            .await
            .context("update category")?;
        Ok(row)
    }

    async fn delete_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("delete category")?;
        Ok(res.rows_affected() == 1)
    }
}
