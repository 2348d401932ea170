use serde::{Deserialize, Serialize};

/// Claims carried by access tokens from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    #[serde(default)]
    pub iat: usize,
    /// Audience, `authenticated` for signed-in users
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Issuer (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// User email
    #[serde(default)]
    pub email: String,
    /// User role (e.g., "authenticated", "admin", "service_role")
    #[serde(default)]
    pub role: String,
}
