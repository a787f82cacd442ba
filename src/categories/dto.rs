use serde::Deserialize;

/// Body for create and update. On update, absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}
