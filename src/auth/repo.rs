use anyhow::Context;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::db::{classify, PgStore, StoreResult};

/// Credential store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; a taken email yields `StoreError::Conflict`.
    async fn create_user(&self, name: &str, email: &str, password_hash: &str)
        -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn update_user_name(&self, id: Uuid, name: &str) -> StoreResult<Option<User>>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;

    /// Writes the code and its expiry together.
    async fn set_otp(&self, id: Uuid, otp: &str, expires_at: OffsetDateTime)
        -> StoreResult<bool>;

    /// Replaces the password and clears the OTP pair, but only while `otp` is still the
    /// stored, unexpired code. Returns false when the code was already used.
    async fn consume_otp(&self, id: Uuid, otp: &str, password_hash: &str) -> StoreResult<bool>;
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, otp, otp_expires_at, created_at, updated_at";

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "insert user"))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("find user by id")?;
        Ok(user)
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET name = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("update user name")?;
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $2, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .context("update password")?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_otp(
        &self,
        id: Uuid,
        otp: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET otp = $2, otp_expires_at = $3, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(otp)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .context("set otp")?;
        Ok(res.rows_affected() > 0)
    }

    async fn consume_otp(&self, id: Uuid, otp: &str, password_hash: &str) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $3, otp = NULL, otp_expires_at = NULL, updated_at = now()
             WHERE id = $1 AND otp = $2 AND otp_expires_at > now()
            "#,
        )
        .bind(id)
        .bind(otp)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .context("consume otp")?;
        Ok(res.rows_affected() > 0)
    }
}
