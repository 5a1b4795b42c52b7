use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rt_protocol::{HttpErrorEnvelope, UserRole};

use crate::state::AppState;

/// The claims an already-verified bearer token carries.
///
/// Token issuance and verification live outside this crate; this is the
/// seam imposed on that external collaborator. Production deployments
/// plug in a [`TokenVerifier`] backed by whatever session/JWT scheme the
/// HTTP layer issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: i64,
    pub role: UserRole,
}

pub trait TokenVerifier: Send + Sync + 'static {
    fn verify(&self, raw_token: &str) -> Option<TokenClaims>;
}

/// A verifier suitable for local development and integration tests: tokens
/// are of the form `user:<id>` or `user:<id>:<role>`. A real deployment
/// replaces this with one backed by the external auth collaborator.
pub struct StubTokenVerifier;

impl TokenVerifier for StubTokenVerifier {
    fn verify(&self, raw_token: &str) -> Option<TokenClaims> {
        let mut parts = raw_token.split(':');
        if parts.next()? != "user" {
            return None;
        }
        let user_id: i64 = parts.next()?.parse().ok()?;
        let role = match parts.next() {
            Some("moderator") => UserRole::Moderator,
            Some("admin") => UserRole::Admin,
            _ => UserRole::User,
        };
        Some(TokenClaims { user_id, role })
    }
}

pub fn extract_bearer(authorization: &str) -> Option<&str> {
    authorization.strip_prefix("Bearer ")
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(HttpErrorEnvelope {
            error: "missing or invalid bearer token".to_owned(),
            details: None,
        }),
    )
        .into_response()
}

/// Extractor pulling the caller's identity out of `Authorization: Bearer`.
pub struct CurrentUser(pub TokenClaims);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(unauthorized)?;
        let token = extract_bearer(header).ok_or_else(unauthorized)?;
        let claims = state.token_verifier.verify(token).ok_or_else(unauthorized)?;
        Ok(CurrentUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_strips_prefix() {
        assert_eq!(extract_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer("abc123"), None);
    }

    #[test]
    fn stub_verifier_parses_user_and_role() {
        let v = StubTokenVerifier;
        assert_eq!(
            v.verify("user:42"),
            Some(TokenClaims {
                user_id: 42,
                role: UserRole::User
            })
        );
        assert_eq!(
            v.verify("user:7:admin"),
            Some(TokenClaims {
                user_id: 7,
                role: UserRole::Admin
            })
        );
        assert_eq!(v.verify("garbage"), None);
    }
}
