use serde::{Deserialize, Serialize};

/// The verified administrator identity returned by `verifyAdminToken` and
/// persisted in session storage between reloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "picture")]
    pub picture_url: String,
}
