use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod oauth;
mod otp;
mod password;
pub mod repo;
pub mod repo_types;
mod services;
mod validation;

pub fn public_router() -> Router<AppState> {
    handlers::public_routes()
}

pub fn protected_router() -> Router<AppState> {
    handlers::protected_routes()
}
