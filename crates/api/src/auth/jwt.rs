//! Access-token claims and HS256 signing.
//!
//! Tokens are issued by the identity service. The API only verifies them;
//! [`JwtConfig::issue`] is used by tooling and the test suite.

use hsseq_core::types::{new_id, Id, Identity};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Id,
    pub company_id: Id,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub,
            company_id: self.company_id,
        }
    }
}

/// Why a token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Expired,
    Invalid,
}

impl From<JwtError> for TokenRejection {
    fn from(err: JwtError) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid,
        }
    }
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret.
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// Read `JWT_SECRET` (required, non-empty) and `JWT_ACCESS_EXPIRY_MINS`
    /// (default 15).
    ///
    /// # Panics
    ///
    /// On a missing secret or an unparseable expiry.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set and non-empty");

        let access_token_expiry_mins = match std::env::var("JWT_ACCESS_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .expect("JWT_ACCESS_EXPIRY_MINS must be a whole number of minutes"),
            Err(_) => DEFAULT_ACCESS_EXPIRY_MINS,
        };

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }

    /// Sign a token for `identity` valid for the configured lifetime.
    pub fn issue(&self, identity: Identity, role: &str) -> Result<String, JwtError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: identity.user_id,
            company_id: identity.company_id,
            role: role.to_owned(),
            exp: iat + self.access_token_expiry_mins * 60,
            iat,
            jti: new_id().to_string(),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Check signature and expiry and return the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenRejection> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Self::validation(),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(expiry: i64) -> JwtConfig {
        JwtConfig {
            secret: "unit-test-secret-with-enough-entropy".to_string(),
            access_token_expiry_mins: expiry,
        }
    }

    fn someone() -> Identity {
        Identity {
            user_id: new_id(),
            company_id: new_id(),
        }
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let cfg = config(15);
        let who = someone();
        let claims = cfg.verify(&cfg.issue(who, "inspector").unwrap()).unwrap();

        assert_eq!(claims.identity(), who);
        assert_eq!(claims.role, "inspector");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token = config(15).issue(someone(), "admin").unwrap();
        let other = JwtConfig {
            secret: "some-other-secret".to_string(),
            ..config(15)
        };
        assert_eq!(other.verify(&token).unwrap_err(), TokenRejection::Invalid);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let cfg = config(-10);
        let token = cfg.issue(someone(), "admin").unwrap();
        assert_eq!(cfg.verify(&token).unwrap_err(), TokenRejection::Expired);
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(
            config(15).verify("not-a-jwt").unwrap_err(),
            TokenRejection::Invalid
        );
    }
}
