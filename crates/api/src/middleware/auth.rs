//! Bearer-token extractors.
//!
//! Every protected handler takes one of [`AuthUser`], [`RequireCustomer`] or
//! [`RequireAdmin`]. Role checks go through [`Role::is_admin`] and
//! [`Role::is_customer`]; handlers never compare role strings.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn dashboard(RequireAdmin(session): RequireAdmin) -> impl IntoResponse {
//!     format!("admin {}", session.user_id)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use selempangku_core::Role;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{Session, TokenError};
use crate::state::AppState;

/// Any authenticated user.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Session);

/// An authenticated customer.
#[derive(Debug, Clone, Copy)]
pub struct RequireCustomer(pub Session);

/// An authenticated admin.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Session);

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Session, AppError> {
    let token = bearer_token(parts)
        .ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;

    let session = state.tokens().verify(token).map_err(|err| match err {
        TokenError::Expired => AppError::Unauthorized("Token expired".to_string()),
        TokenError::Invalid(_) | TokenError::Signing(_) => {
            AppError::Unauthorized("Invalid token".to_string())
        }
    })?;

    set_sentry_user(&session.user_id);
    Ok(session)
}

fn require_role(
    parts: &Parts,
    state: &AppState,
    allowed: fn(Role) -> bool,
    denied: &str,
) -> Result<Session, AppError> {
    let session = authenticate(parts, state)?;
    if allowed(session.role) {
        Ok(session)
    } else {
        tracing::warn!(user_id = %session.user_id, role = %session.role, "Role check failed");
        Err(AppError::Forbidden(denied.to_string()))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::is_customer, "Customer access required").map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::is_admin, "Admin access required").map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/orders");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))), Some("abc"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&parts_with(None)), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer"))), None);
    }
}
