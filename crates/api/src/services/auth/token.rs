//! Session tokens: HS256 JWTs carrying the user id and role.
//!
//! Every token is issued with the single configured lifetime.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use selempangku_core::{Role, UserId};

/// Issuer claim of every token.
pub const ISSUER: &str = "selempangku";

/// Errors from issuing or validating a session token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token is past its `exp`.
    #[error("token expired")]
    Expired,
    /// Bad signature, wrong issuer, or malformed token or claims.
    #[error("invalid token: {0}")]
    Invalid(String),
    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Claims carried in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Role name as issued; parsed case-insensitively on the way in.
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// The identity a validated token proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
}

/// Issues and validates session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    /// Create a token service from the signing secret and token lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    /// The lifetime of issued tokens.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_owned(),
            iat: now,
            exp: now.saturating_add(ttl),
            iss: ISSUER.to_owned(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate a token and return the session it proves.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for an expired token and
    /// `TokenError::Invalid` for anything else that fails validation.
    pub fn verify(&self, token: &str) -> Result<Session, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        let user_id = data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenError::Invalid("subject is not a user id".to_owned()))?;
        let role = data
            .claims
            .role
            .parse::<Role>()
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        Ok(Session { user_id, role })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(ttl: Duration) -> TokenService {
        TokenService::new(
            &SecretString::from("q8Vd2LmZr7Kx0PwN4tYb9HcJ6sUe1GfA"),
            ttl,
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service(Duration::from_secs(3600));
        let token = tokens.issue(UserId::new(42), Role::Admin).unwrap();
        let session = tokens.verify(&token).unwrap();
        assert_eq!(session.user_id, UserId::new(42));
        assert_eq!(session.role, Role::Admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service(Duration::from_secs(3600))
            .issue(UserId::new(1), Role::Customer)
            .unwrap();
        let other = TokenService::new(
            &SecretString::from("Zx9Wv8Uu7Tt6Ss5Rr4Qq3Pp2Oo1Nn0Mm"),
            Duration::from_secs(3600),
        );
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service(Duration::from_secs(3600));
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_owned(),
            role: "Customer".to_owned(),
            iat: now - 7200,
            exp: now - 3600,
            iss: ISSUER.to_owned(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &tokens.encoding).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_role_claim_is_case_insensitive() {
        let tokens = service(Duration::from_secs(3600));
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "9".to_owned(),
            role: "admin".to_owned(),
            iat: now,
            exp: now + 60,
            iss: ISSUER.to_owned(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &tokens.encoding).unwrap();
        assert_eq!(tokens.verify(&token).unwrap().role, Role::Admin);
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let tokens = service(Duration::from_secs(3600));
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "9".to_owned(),
            role: "Customer".to_owned(),
            iat: now,
            exp: now + 60,
            iss: "someone-else".to_owned(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &tokens.encoding).unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = service(Duration::from_secs(3600));
        assert!(tokens.verify("not.a.jwt").is_err());
        assert!(tokens.verify("").is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let tokens = service(Duration::from_secs(60));
        assert!(format!("{tokens:?}").contains("[REDACTED]"));
    }
}
