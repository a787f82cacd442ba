use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Uniform response body: `{success, message, code, data}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub code: u16,
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            code: StatusCode::OK.as_u16(),
            data: Some(data),
        })
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: status.as_u16(),
            data: None,
        }
    }
}

impl Envelope<()> {
    /// Success without a payload; `data` serializes as `null`.
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            code: StatusCode::OK.as_u16(),
            data: None,
        })
    }
}
