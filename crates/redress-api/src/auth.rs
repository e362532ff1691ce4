//! # Authentication Middleware
//!
//! Bearer-token authentication producing a [`Principal`] for every request.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{principal_id}:{display_name}:{secret}
//! ```
//!
//! `role` is `admin` or `user`. `secret` is compared in constant time
//! against the configured shared secret. The token is an adapter behind
//! [`IdentityProvider`]; handlers only ever see the resulting principal via
//! the [`Caller`] extractor.
//!
//! When no secret is configured (development mode) every request is served
//! as a built-in development administrator.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use redress_core::{IdentityProvider, Principal, PrincipalId, Role, StaticIdentity};
use subtle::ConstantTimeEq;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// Principal id used for every request in development mode.
pub const DEV_PRINCIPAL_ID: &str = "dev-admin";

// ── Caller ──────────────────────────────────────────────────────────────────

/// The authenticated principal of the current request.
///
/// Injected into request extensions by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer secrets.
///
/// When lengths differ, performs a dummy comparison so the rejection path
/// takes comparable time.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{role}:{principal_id}:{display_name}:{secret}`.
///
/// The secret is checked before anything else, so a caller without the
/// secret learns nothing about which other fields were well formed.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<Principal, String> {
    let parts: Vec<&str> = provided.splitn(4, ':').collect();
    let [role, id, name, secret] = parts.as_slice() else {
        return Err(
            "invalid token format, expected {role}:{principal_id}:{display_name}:{secret}".into(),
        );
    };

    if !constant_time_token_eq(secret, expected_secret) {
        return Err("invalid bearer token".into());
    }

    let role: Role = role.parse().map_err(|e| format!("{e}"))?;
    let id = PrincipalId::new(id).map_err(|e| format!("{e}"))?;
    if name.trim().is_empty() {
        return Err("display name must not be empty".into());
    }
    Ok(Principal::new(id, *name, role))
}

/// [`IdentityProvider`] backed by a bearer token from the `Authorization`
/// header.
#[derive(Debug)]
pub struct BearerTokenIdentity<'a> {
    token: &'a str,
    secret: &'a str,
}

impl<'a> BearerTokenIdentity<'a> {
    /// Wrap the token (without the `Bearer ` prefix) and the shared secret.
    pub fn new(token: &'a str, secret: &'a str) -> Self {
        Self { token, secret }
    }
}

impl IdentityProvider for BearerTokenIdentity<'_> {
    fn current_principal(&self) -> Option<Principal> {
        match parse_bearer_token(self.token, self.secret) {
            Ok(principal) => Some(principal),
            Err(reason) => {
                tracing::warn!(reason = %reason, "authentication failed: invalid bearer token");
                None
            }
        }
    }
}

/// The principal every request acts as in development mode.
pub fn dev_identity() -> StaticIdentity {
    match PrincipalId::new(DEV_PRINCIPAL_ID) {
        Ok(id) => StaticIdentity::new(Principal::new(id, "Development Admin", Role::Admin)),
        Err(_) => StaticIdentity::anonymous(),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Authenticate the request and inject a [`Caller`] into its extensions.
///
/// When `AuthConfig.token` is `None`, every request runs as the development
/// administrator.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    let principal = match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header {
                Some(header_value) => match header_value.strip_prefix("Bearer ") {
                    Some(token) => BearerTokenIdentity::new(token, expected).current_principal(),
                    None => {
                        tracing::warn!("authentication failed: non-Bearer authorization scheme");
                        return unauthorized_response(
                            "authorization header must use Bearer scheme",
                        );
                    }
                },
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    return unauthorized_response("missing authorization header");
                }
            }
        }
        _ => dev_identity().current_principal(),
    };

    match principal {
        Some(principal) => {
            request.extensions_mut().insert(Caller(principal));
            next.run(request).await
        }
        None => unauthorized_response("invalid bearer token"),
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
