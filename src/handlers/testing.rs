//! Token helpers for handler tests.

use chrono::Utc;
use uuid::Uuid;

use crate::models::Claims;
use crate::services::auth::JwtVerifier;

pub const TEST_SECRET: &str = "handler-test-secret";

pub fn verifier() -> JwtVerifier {
    JwtVerifier::new(TEST_SECRET, "authenticated").unwrap()
}

pub fn bearer(user_id: Uuid, role: &str) -> (&'static str, String) {
    let now = Utc::now().timestamp() as usize;
    let token = verifier()
        .sign(&Claims {
            sub: user_id.to_string(),
            exp: now + 3600,
            iat: now,
            aud: Some("authenticated".to_string()),
            iss: None,
            email: format!("{}@example.com", role),
            role: role.to_string(),
        })
        .unwrap();
    ("Authorization", format!("Bearer {}", token))
}
