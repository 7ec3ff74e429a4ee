//! Bearer-token extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use hsseq_core::error::CoreError;
use hsseq_core::types::{Id, Identity};

use crate::auth::jwt::TokenRejection;
use crate::error::AppError;
use crate::state::AppState;

/// The caller of a `/forms` route, taken from a verified access token.
///
/// The token's `role` claim is not consulted: every member of a company
/// may edit its forms.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Id,
    pub company_id: Id,
}

impl AuthUser {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            company_id: self.company_id,
        }
    }
}

fn unauthorized(message: &str) -> AppError {
    CoreError::Unauthorized(message.to_string()).into()
}

/// Extract the token from `Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| unauthorized("Authorization header is not valid ASCII"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(token.trim())
        }
        _ => Err(unauthorized("Expected an Authorization header of the form 'Bearer <token>'")),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.config.jwt.verify(token).map_err(|rejection| {
            tracing::debug!(?rejection, "Access token refused");
            match rejection {
                TokenRejection::Expired => unauthorized("Access token has expired"),
                TokenRejection::Invalid => unauthorized("Invalid access token"),
            }
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            company_id: claims.company_id,
        })
    }
}
