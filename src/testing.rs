//! In-memory collaborators for unit and router tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use anyhow::bail;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app,
    auth::{
        oauth::{OAuthProfile, OAuthProvider},
        repo::UserStore,
        repo_types::User,
    },
    categories::{repo::CategoryStore, repo_types::Category},
    config::{AppConfig, GoogleConfig, JwtConfig, SmtpConfig},
    db::{StoreError, StoreResult},
    mailer::{MailError, Mailer},
    state::AppState,
    tasks::{
        repo::TaskStore,
        repo_types::{Task, TaskStatus},
    },
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    tasks: Vec<Task>,
    categories: Vec<Category>,
}

/// Store that keeps everything in a mutex'd map. Same ownership filters as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn user(&self, id: Uuid) -> Option<User> {
        self.tables.lock().unwrap().users.get(&id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            otp: None,
            otp_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.user(id))
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> StoreResult<Option<User>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.users.get_mut(&id).map(|u| {
            u.name = name.into();
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.users
            .get_mut(&id)
            .map(|u| u.password_hash = password_hash.into())
            .is_some())
    }

    async fn set_otp(&self, id: Uuid, otp: &str, expires_at: OffsetDateTime) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.users
            .get_mut(&id)
            .map(|u| {
                u.otp = Some(otp.into());
                u.otp_expires_at = Some(expires_at);
            })
            .is_some())
    }

    async fn consume_otp(&self, id: Uuid, otp: &str, password_hash: &str) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let Some(u) = t.users.get_mut(&id) else {
            return Ok(false);
        };
        let live = u.otp.as_deref() == Some(otp)
            && u.otp_expires_at
                .is_some_and(|exp| exp > OffsetDateTime::now_utc());
        if !live {
            return Ok(false);
        }
        u.password_hash = password_hash.into();
        u.otp = None;
        u.otp_expires_at = None;
        Ok(true)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: &Task) -> StoreResult<Task> {
        self.tables.lock().unwrap().tasks.push(task.clone());
        Ok(task.clone())
    }

    async fn list_tasks(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let t = self.tables.lock().unwrap();
        Ok(t.tasks.iter().filter(|x| x.user_id == user_id).cloned().collect())
    }

    async fn get_task(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let t = self.tables.lock().unwrap();
        Ok(t.tasks
            .iter()
            .find(|x| x.id == id && x.user_id == user_id)
            .cloned())
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.tasks
            .iter_mut()
            .find(|x| x.id == task.id && x.user_id == task.user_id)
            .map(|x| {
                *x = Task {
                    created_at: x.created_at,
                    updated_at: OffsetDateTime::now_utc(),
                    ..task.clone()
                };
                x.clone()
            }))
    }

    async fn delete_tasks(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let before = t.tasks.len();
        t.tasks
            .retain(|x| !(x.user_id == user_id && ids.contains(&x.id)));
        Ok((before - t.tasks.len()) as u64)
    }

    async fn set_tasks_status(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
        status: TaskStatus,
    ) -> StoreResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let mut n = 0;
        for x in t
            .tasks
            .iter_mut()
            .filter(|x| x.user_id == user_id && ids.contains(&x.id))
        {
            x.status = status;
            x.updated_at = OffsetDateTime::now_utc();
            n += 1;
        }
        Ok(n)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn insert_category(&self, category: &Category) -> StoreResult<Category> {
        self.tables.lock().unwrap().categories.push(category.clone());
        Ok(category.clone())
    }

    async fn list_categories(&self, user_id: Uuid) -> StoreResult<Vec<Category>> {
        let t = self.tables.lock().unwrap();
        Ok(t.categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Category>> {
        let t = self.tables.lock().unwrap();
        Ok(t.categories
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn update_category(&self, category: &Category) -> StoreResult<Option<Category>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.categories
            .iter_mut()
            .find(|c| c.id == category.id && c.user_id == category.user_id)
            .map(|c| {
                c.name = category.name.clone();
                c.color = category.color.clone();
                c.updated_at = OffsetDateTime::now_utc();
                c.clone()
            }))
    }

    async fn delete_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.categories.len();
        t.categories.retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(t.categories.len() < before)
    }
}

/// Records outgoing mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
    fail_next: AtomicBool,
}

impl RecordingMailer {
    /// `(to, subject, body)` in send order.
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn last_otp_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _, _)| to == email)
            .and_then(|(_, _, body)| body.strip_prefix("Your OTP code is: "))
            .map(|code| code.trim().to_string())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(MailError::Transport("connection refused".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.into(), subject.into(), body.into()));
        Ok(())
    }
}

/// Accepts only `good-code`, which resolves to Gina.
pub struct FakeOAuth;

#[async_trait]
impl OAuthProvider for FakeOAuth {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://consent.test/?state={state}")
    }

    async fn exchange(&self, code: &str) -> anyhow::Result<OAuthProfile> {
        if code != "good-code" {
            bail!("invalid_grant");
        }
        Ok(OAuthProfile {
            email: "gina@example.com".into(),
            name: "Gina".into(),
        })
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        jwt: JwtConfig {
            secret: "test-secret-with-enough-entropy".into(),
            issuer: "todolist".into(),
            audience: "todolist-users".into(),
            ttl_minutes: 1440,
        },
        otp_ttl_minutes: 5,
        smtp: SmtpConfig {
            host: "smtp.test".into(),
            port: 587,
            user: "noreply@example.com".into(),
            pass: String::new(),
            from: "noreply@example.com".into(),
        },
        google: Some(GoogleConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_url: "http://localhost:8080/api/auth/google/callback".into(),
            frontend_url: "http://frontend.test".into(),
        }),
    }
}

pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestHarness {
    pub fn app(&self) -> Router {
        app::build_app(self.state.clone())
    }
}

pub fn test_state() -> TestHarness {
    let store = Arc::new(MemoryStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::from_parts(
        store.clone(),
        Arc::new(test_config()),
        mailer.clone(),
        Some(Arc::new(FakeOAuth)),
    );
    TestHarness {
        state,
        store,
        mailer,
    }
}

pub async fn raw_call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> Response {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(b) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(b.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(req.body(body).unwrap())
        .await
        .unwrap()
}

/// Sends one request and decodes the envelope.
pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let res = raw_call(app, method, uri, token, body).await;
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
