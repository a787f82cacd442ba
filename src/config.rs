use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub otp_ttl_minutes: i64,
    pub smtp: SmtpConfig,
    /// Google login is only mounted when client credentials are configured.
    pub google: Option<GoogleConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => database_url_from_parts(&get)?,
        };

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "todolist".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "todolist-users".into()),
            ttl_minutes: get("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        anyhow::ensure!(!jwt.secret.is_empty(), "JWT_SECRET is empty");

        let smtp_user = get("SMTP_USER").unwrap_or_default();
        let smtp = SmtpConfig {
            host: get("SMTP_HOST").context("SMTP_HOST is not set")?,
            port: get("SMTP_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            pass: get("SMTP_PASS").unwrap_or_default(),
            from: get("SMTP_FROM").unwrap_or_else(|| smtp_user.clone()),
            user: smtp_user,
        };

        let google = match (get("GOOGLE_CLIENT_ID"), get("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_url: get("GOOGLE_REDIRECT_URL").unwrap_or_else(|| {
                    "http://localhost:8080/api/auth/google/callback".into()
                }),
                frontend_url: get("FRONTEND_URL")
                    .unwrap_or_else(|| "http://localhost:5173".into()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt,
            otp_ttl_minutes: get("OTP_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(5),
            smtp,
            google,
        })
    }
}

fn database_url_from_parts<F>(get: &F) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let host = get("DB_HOST").context("neither DATABASE_URL nor DB_HOST is set")?;
    let port = get("DB_PORT").unwrap_or_else(|| "5432".into());
    let user = get("DB_USER").unwrap_or_else(|| "postgres".into());
    let password = get("DB_PASSWORD").unwrap_or_default();
    let name = get("DB_NAME").unwrap_or_else(|| "postgres".into());
    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, name
    ))
}
