use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{auth::repo::UserStore, categories::repo::CategoryStore, tasks::repo::TaskStore};

/// Failure of a store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (duplicate email).
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the handlers need from persistence, as one object-safe bound.
pub trait Store: UserStore + TaskStore + CategoryStore {}

impl<T> Store for T where T: UserStore + TaskStore + CategoryStore {}

/// Postgres-backed store. Each trait method is a single statement, so every call is
/// atomic on its own; nothing spans multiple statements.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// Maps a sqlx error to `Conflict` on unique violations and wraps everything else.
pub(crate) fn classify(err: sqlx::Error, what: &'static str) -> StoreError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict,
        other => StoreError::Backend(anyhow::Error::new(other).context(what)),
    }
}
