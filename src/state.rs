use std::sync::Arc;

use crate::auth::jwt::JwtKeys;
use crate::auth::oauth::{GoogleOAuth, OAuthProvider};
use crate::config::AppConfig;
use crate::db::{PgStore, Store};
use crate::mailer::{Mailer, SmtpMailer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub mailer: Arc<dyn Mailer>,
    pub oauth: Option<Arc<dyn OAuthProvider>>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = PgStore::connect(&config.database_url).await?;
        store.migrate().await?;
        tracing::info!("database ready");

        let mailer = Arc::new(SmtpMailer::new(&config.smtp)?) as Arc<dyn Mailer>;

        let oauth = match &config.google {
            Some(google) => {
                Some(Arc::new(GoogleOAuth::new(google)?) as Arc<dyn OAuthProvider>)
            }
            None => {
                tracing::info!("google login disabled; GOOGLE_CLIENT_ID/SECRET not set");
                None
            }
        };

        Ok(Self::from_parts(Arc::new(store), Arc::new(config), mailer, oauth))
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        config: Arc<AppConfig>,
        mailer: Arc<dyn Mailer>,
        oauth: Option<Arc<dyn OAuthProvider>>,
    ) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self {
            store,
            config,
            keys,
            mailer,
            oauth,
        }
    }
}
