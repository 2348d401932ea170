use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};
use uuid::Uuid;

use crate::config::settings::AuthConfig;
use crate::error::AppError;
use crate::models::{AuthenticatedUser, Claims};

/// Verifies HS256 access tokens minted by the identity provider.
///
/// Built once at startup and shared through `web::Data`; there is no global
/// key state.
#[derive(Clone)]
pub struct JwtVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    audience: String,
}

impl JwtVerifier {
    pub fn new(secret: &str, audience: impl Into<String>) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::Configuration("JWT secret cannot be empty".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience: audience.into(),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Self::new(&config.jwt_secret, config.jwt_audience.clone())
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|err| {
            warn!("JWT validation failed: {}", err);
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::Auth("Token has expired".to_string()),
                jsonwebtoken::errors::ErrorKind::InvalidToken => AppError::Auth("Invalid token format".to_string()),
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AppError::Auth("Invalid token signature".to_string()),
                jsonwebtoken::errors::ErrorKind::InvalidAudience => AppError::Auth("Invalid token audience".to_string()),
                jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => {
                    AppError::Auth(format!("Token missing required claim: {}", claim))
                }
                _ => AppError::Auth(format!("Token validation failed: {:?}", err.kind())),
            }
        })?;

        debug!("JWT token verified for subject {}", token_data.claims.sub);
        Ok(token_data.claims)
    }

    /// Verifies the token and turns its claims into the request's session context.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.verify(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))?;

        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Signs claims with the shared secret. Used by tooling and tests that need
    /// tokens the verifier accepts.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn claims(user_id: Uuid, audience: &str, exp_offset_secs: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user_id.to_string(),
            exp: (now + exp_offset_secs) as usize,
            iat: now as usize,
            aud: Some(audience.to_string()),
            iss: None,
            email: "agent@example.com".to_string(),
            role: "authenticated".to_string(),
        }
    }

    #[test]
    fn test_authenticate_round_trip() {
        let verifier = JwtVerifier::new("test-secret", "authenticated").unwrap();
        let user_id = Uuid::new_v4();
        let token = verifier.sign(&claims(user_id, "authenticated", 3600)).unwrap();

        let user = verifier.authenticate(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "agent@example.com");
        assert!(!user.is_admin());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = JwtVerifier::new("test-secret", "authenticated").unwrap();
        let token = verifier.sign(&claims(Uuid::new_v4(), "authenticated", -3600)).unwrap();

        match verifier.verify(&token) {
            Err(AppError::Auth(msg)) => assert_eq!(msg, "Token has expired"),
            other => panic!("expected expiry error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let verifier = JwtVerifier::new("test-secret", "authenticated").unwrap();
        let token = verifier.sign(&claims(Uuid::new_v4(), "anon", 3600)).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let signer = JwtVerifier::new("other-secret", "authenticated").unwrap();
        let verifier = JwtVerifier::new("test-secret", "authenticated").unwrap();
        let token = signer.sign(&claims(Uuid::new_v4(), "authenticated", 3600)).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let verifier = JwtVerifier::new("test-secret", "authenticated").unwrap();
        let mut bad = claims(Uuid::new_v4(), "authenticated", 3600);
        bad.sub = "not-a-uuid".to_string();
        let token = verifier.sign(&bad).unwrap();
        assert!(matches!(verifier.authenticate(&token), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_empty_secret_is_a_configuration_error() {
        assert!(matches!(JwtVerifier::new("", "authenticated"), Err(AppError::Configuration(_))));
    }
}
