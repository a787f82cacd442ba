use time::{Duration, OffsetDateTime};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, LoginRequest, LoginResponse, PublicUser, RegisterRequest,
            ResetPasswordRequest,
        },
        otp::{check_otp, issue_otp, OtpError},
        password::{hash_password, verify_password},
        repo::UserStore,
        repo_types::User,
        validation::{is_strong_password, is_valid_email, WEAK_PASSWORD_MSG},
    },
    db::StoreError,
    error::AppError,
    state::AppState,
};

const OTP_MAIL_SUBJECT: &str = "Reset Password OTP";

fn store_failure(msg: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |e| {
        error!(error = %e, "{}", msg);
        AppError::internal(msg)
    }
}

fn hash_or_internal(plain: &str) -> Result<String, AppError> {
    hash_password(plain).map_err(|_| AppError::internal("Failed to generate password hash"))
}

async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, AppError> {
    state
        .store
        .find_user_by_id(user_id)
        .await
        .map_err(store_failure("Failed to load user"))?
        .ok_or_else(|| {
            warn!(%user_id, "token refers to unknown user");
            AppError::not_found("User not found")
        })
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<PublicUser, AppError> {
    let name = req.name.trim();
    let email = req.email.trim();

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Name, Email, and Password are required"));
    }
    if !is_valid_email(email) {
        warn!(%email, "invalid email");
        return Err(AppError::validation("Invalid email format"));
    }
    if !is_strong_password(&req.password) {
        return Err(AppError::validation(WEAK_PASSWORD_MSG));
    }

    let hash = hash_or_internal(&req.password)?;

    let user = match state.store.create_user(name, email, &hash).await {
        Ok(u) => u,
        Err(StoreError::Conflict) => {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict("Email already exists".into()));
        }
        Err(e) => return Err(store_failure("Failed to create user")(e)),
    };

    info!(user_id = %user.id, "user registered");
    Ok(user.into())
}

pub async fn login(state: &AppState, req: LoginRequest) -> Result<LoginResponse, AppError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let user = state
        .store
        .find_user_by_email(email)
        .await
        .map_err(store_failure("Failed to load user"))?;

    // Same answer for unknown email and wrong password.
    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        warn!(%email, "login rejected");
        return Err(AppError::unauthorized("Invalid email or password"));
    };

    let issued = state.keys.issue(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::internal("Failed to generate token")
    })?;

    info!(user_id = %user.id, "user logged in");
    Ok(LoginResponse {
        user: user.into(),
        token: issued.token,
        expires: issued.expires_at.unix_timestamp(),
    })
}

/// Stores a fresh OTP on the account and emails it. Re-requesting replaces the
/// previous code.
pub async fn forgot_password(state: &AppState, email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    if !is_valid_email(email) {
        return Err(AppError::validation("Invalid email format"));
    }

    let user = state
        .store
        .find_user_by_email(email)
        .await
        .map_err(store_failure("Failed to load user"))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let ttl = Duration::minutes(state.config.otp_ttl_minutes);
    let otp = issue_otp(OffsetDateTime::now_utc(), ttl);

    let stored = state
        .store
        .set_otp(user.id, &otp.code, otp.expires_at)
        .await
        .map_err(store_failure("Failed to generate OTP"))?;
    if !stored {
        return Err(AppError::internal("Failed to generate OTP"));
    }

    let body = format!("Your OTP code is: {}", otp.code);
    state
        .mailer
        .send(&user.email, OTP_MAIL_SUBJECT, &body)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "otp email failed");
            AppError::internal("Failed to send email")
        })?;

    info!(user_id = %user.id, "password reset otp issued");
    Ok(())
}

pub async fn reset_password(state: &AppState, req: ResetPasswordRequest) -> Result<(), AppError> {
    let invalid = || AppError::unauthorized(OtpError::Invalid.to_string());

    let user = state
        .store
        .find_user_by_email(req.email.trim())
        .await
        .map_err(store_failure("Failed to load user"))?
        .ok_or_else(invalid)?;

    check_otp(
        user.otp.as_deref(),
        user.otp_expires_at,
        req.otp.trim(),
        OffsetDateTime::now_utc(),
    )
    .map_err(|e| {
        warn!(user_id = %user.id, reason = %e, "otp rejected");
        AppError::unauthorized(e.to_string())
    })?;

    if !is_strong_password(&req.password) {
        return Err(AppError::validation(WEAK_PASSWORD_MSG));
    }
    if verify_password(&req.password, &user.password_hash) {
        return Err(AppError::validation(
            "New password cannot be the same as old password",
        ));
    }

    let hash = hash_or_internal(&req.password)?;

    let consumed = state
        .store
        .consume_otp(user.id, req.otp.trim(), &hash)
        .await
        .map_err(store_failure("Failed to reset password"))?;
    if !consumed {
        // Another reset used the code between our check and the write.
        warn!(user_id = %user.id, "otp consumed concurrently");
        return Err(invalid());
    }

    info!(user_id = %user.id, "password reset");
    Ok(())
}

pub async fn change_password(
    state: &AppState,
    user_id: Uuid,
    req: ChangePasswordRequest,
) -> Result<(), AppError> {
    let user = load_user(state, user_id).await?;

    if !verify_password(&req.old_password, &user.password_hash) {
        warn!(%user_id, "change password with wrong old password");
        return Err(AppError::unauthorized("Incorrect old password"));
    }
    if !is_strong_password(&req.new_password) {
        return Err(AppError::validation(WEAK_PASSWORD_MSG));
    }
    if verify_password(&req.new_password, &user.password_hash) {
        return Err(AppError::validation(
            "New password cannot be the same as old password",
        ));
    }

    let hash = hash_or_internal(&req.new_password)?;
    let updated = state
        .store
        .update_password(user_id, &hash)
        .await
        .map_err(store_failure("Failed to change password"))?;
    if !updated {
        return Err(AppError::not_found("User not found"));
    }

    info!(%user_id, "password changed");
    Ok(())
}

pub async fn profile(state: &AppState, user_id: Uuid) -> Result<PublicUser, AppError> {
    Ok(load_user(state, user_id).await?.into())
}

pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    name: &str,
) -> Result<PublicUser, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }

    let user = load_user(state, user_id).await?;
    if user.name == name {
        return Err(AppError::validation("No changes to update"));
    }

    let user = state
        .store
        .update_user_name(user_id, name)
        .await
        .map_err(store_failure("Failed to update profile"))?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    info!(%user_id, "profile updated");
    Ok(user.into())
}

/// Consent URL for Google with a freshly signed `state`.
pub fn google_login_url(state: &AppState) -> Result<String, AppError> {
    let provider = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::not_found("Google login is not configured"))?;
    let csrf = state.keys.sign_oauth_state().map_err(|e| {
        error!(error = %e, "sign oauth state failed");
        AppError::internal("Failed to start Google login")
    })?;
    Ok(provider.authorize_url(&csrf))
}

/// Completes Google login and returns the frontend URL carrying the session token.
/// First-time Google users get an account without a password.
pub async fn google_callback(
    state: &AppState,
    code: Option<String>,
    csrf: Option<String>,
) -> Result<String, AppError> {
    let (Some(provider), Some(google)) = (state.oauth.as_ref(), state.config.google.as_ref())
    else {
        return Err(AppError::not_found("Google login is not configured"));
    };

    let csrf = csrf.unwrap_or_default();
    state.keys.verify_oauth_state(&csrf).map_err(|e| {
        warn!(reason = %e, "oauth state rejected");
        AppError::unauthorized("Invalid OAuth state")
    })?;

    let code = code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::validation("Missing authorization code"))?;

    let profile = provider.exchange(&code).await.map_err(|e| {
        error!(error = %e, "google exchange failed");
        AppError::internal("Failed to exchange token from Google")
    })?;

    let existing = state
        .store
        .find_user_by_email(&profile.email)
        .await
        .map_err(store_failure("Failed to load user"))?;

    let user = match existing {
        Some(u) => u,
        None => match state.store.create_user(&profile.name, &profile.email, "").await {
            Ok(u) => {
                info!(user_id = %u.id, "user created from google login");
                u
            }
            // Lost a race with a concurrent first login for the same email.
            Err(StoreError::Conflict) => state
                .store
                .find_user_by_email(&profile.email)
                .await
                .map_err(store_failure("Failed to load user"))?
                .ok_or_else(|| AppError::internal("Failed to create user"))?,
            Err(e) => return Err(store_failure("Failed to create user")(e)),
        },
    };

    let issued = state.keys.issue(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::internal("Failed to generate token")
    })?;

    Ok(format!(
        "{}/auth/google/callback?token={}",
        google.frontend_url.trim_end_matches('/'),
        issued.token
    ))
}
