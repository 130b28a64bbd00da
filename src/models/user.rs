use serde::{Deserialize, Serialize};

/// Storefront account as listed by the admin users endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    /// Server timestamp, passed through as sent
    #[serde(default)]
    pub created_at: Option<String>,
}
