//! Gallery user profile and auth payloads.

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User identifier.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub username: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Short biography.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UserProfile {
    /// Returns a formatted display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            self.email.as_deref().unwrap_or("anonymous")
        } else {
            &self.username
        }
    }
}

/// Partial profile update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// New email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New biography.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Login or registration credentials.
#[derive(Clone, Serialize)]
pub struct Credentials {
    /// Account email or username.
    pub email: String,
    /// Password.
    pub password: String,
    /// Display name, used by registration only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .field("username", &self.username)
            .finish()
    }
}

/// Response of the auth endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    /// Bearer token, when issued.
    #[serde(default)]
    pub token: Option<String>,
    /// Authenticated user, when returned.
    #[serde(default)]
    pub user: Option<UserProfile>,
    /// Server message.
    #[serde(default)]
    pub message: Option<String>,
}
