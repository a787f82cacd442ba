use serde::Deserialize;
use uuid::Uuid;

use crate::extract::null_as_default;

// Unknown fields (including any `user_id`) are ignored; the owner comes from the token.

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub long_desc: String,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub short_desc: Option<String>,
    pub long_desc: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub time: Option<String>,
    pub date: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TaskIdsRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ids: Vec<Uuid>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}
