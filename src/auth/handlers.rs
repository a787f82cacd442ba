use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            AuthUrlResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
            LoginResponse, OAuthCallbackQuery, PublicUser, RegisterRequest,
            ResetPasswordRequest, UpdateProfileRequest,
        },
        extractors::AuthUser,
        services,
    },
    envelope::Envelope,
    error::{ApiResult, AppError},
    extract::ApiJson,
    state::AppState,
};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
}

/// Routes that must sit behind the auth gate.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/profile", get(get_profile))
        .route("/update-profile", post(update_profile))
        .route("/change-password", post(change_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<PublicUser> {
    let user = services::register(&state, payload).await?;
    Ok(Envelope::ok("User created successfully", user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let res = services::login(&state, payload).await?;
    Ok(Envelope::ok("Login successfully", res))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<()> {
    services::forgot_password(&state, &payload.email).await?;
    Ok(Envelope::message("OTP has been sent to your email"))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> ApiResult<()> {
    services::reset_password(&state, payload).await?;
    Ok(Envelope::message("Password reset successfully"))
}

/// Sessions are stateless; the client drops its token.
#[instrument]
pub async fn logout(AuthUser(user_id): AuthUser) -> ApiResult<()> {
    tracing::info!(%user_id, "logout");
    Ok(Envelope::message("Logout successfully"))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<PublicUser> {
    let user = services::profile(&state, user_id).await?;
    Ok(Envelope::ok("User found", user))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<PublicUser> {
    let user = services::update_profile(&state, user_id, &payload.name).await?;
    Ok(Envelope::ok("Profile updated successfully", user))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    services::change_password(&state, user_id, payload).await?;
    Ok(Envelope::message("Password changed successfully"))
}

#[instrument(skip(state))]
pub async fn google_login(State(state): State<AppState>) -> ApiResult<AuthUrlResponse> {
    let url = services::google_login_url(&state)?;
    Ok(Envelope::ok("Redirect to Google", AuthUrlResponse { url }))
}

#[instrument(skip(state, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Redirect, AppError> {
    let target = services::google_callback(&state, query.code, query.state).await?;
    Ok(Redirect::to(&target))
}
