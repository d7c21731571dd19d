use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::{AppConfig, Env};

/// AuthError
///
/// The typed authorization failure taxonomy. Each token-validation failure is
/// a distinct kind so the boundary can render a precise message: everything
/// up to and including audience verification is an authentication problem
/// (401), while a missing permission on an otherwise valid token is an
/// authorization problem (403).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("authorization header is expected")]
    MissingToken,
    #[error("unable to parse authentication token")]
    MalformedToken,
    #[error("token signature could not be verified")]
    InvalidSignature,
    #[error("token is expired")]
    TokenExpired,
    #[error("incorrect audience")]
    WrongAudience,
    #[error("permission not found")]
    PermissionNotFound,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::PermissionNotFound => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Renders the fixed error envelope shared with the rest of the API:
/// `{"success": false, "error": <status>, "message": <description>}`.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "success": false,
            "error": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Claims
///
/// The validated claim set extracted from a bearer token. Tokens are issued
/// externally; this service only verifies them and reads the `permissions`
/// list that drives the Permission Gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): opaque identifier of the token holder.
    pub sub: String,
    /// Expiration Time (exp): timestamp after which the token is rejected.
    pub exp: usize,
    /// Permission strings granted to the holder (e.g. "post:drinks").
    /// Absent on tokens for unprivileged users, hence the default.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Claims {
    /// require
    ///
    /// The Permission Gate: succeeds only if `permission` is present in the
    /// claim set's permission list. Gated handlers call this before touching
    /// the store.
    pub fn require(&self, permission: &str) -> Result<(), AuthError> {
        if self.permissions.iter().any(|p| p == permission) {
            Ok(())
        } else {
            Err(AuthError::PermissionNotFound)
        }
    }
}

/// verify_token
///
/// Decodes and verifies a bearer token string against the configured key
/// material. Pure function of its inputs: no clock access beyond what the
/// decoder performs for expiry, no side effects.
///
/// Checks, in order: structurally decodable, signature valid against the
/// configured secret, not expired, audience matches the configured value.
pub fn verify_token(token: &str, config: &AppConfig) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.set_audience(&[&config.jwt_audience]);

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => Err(match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAudience => AuthError::WrongAudience,
            // A structurally valid token that simply omits the aud claim
            // failed the audience check, not parsing.
            ErrorKind::MissingRequiredClaim(claim) if claim.as_str() == "aud" => {
                AuthError::WrongAudience
            }
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                AuthError::InvalidSignature
            }
            // Base64/JSON/UTF-8 failures all mean the token was not a
            // structurally valid JWT in the first place.
            _ => AuthError::MalformedToken,
        }),
    }
}

/// BearerClaims Extractor
///
/// Implements Axum's FromRequestParts trait, making the validated claim set
/// usable as a function argument in any gated handler. A request that fails
/// token validation is rejected here with the precise AuthError before the
/// handler body runs; the handler then applies its own permission
/// requirement via `Claims::require`.
///
/// In `Env::Local` only, an `x-permissions` header (comma-separated
/// permission strings) bypasses token validation. This accelerates local
/// development and is guarded by the Env check; production ignores the
/// header entirely.
#[derive(Debug, Clone)]
pub struct BearerClaims(pub Claims);

impl<S> FromRequestParts<S> for BearerClaims
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        // Local Development Bypass Check
        if config.env == Env::Local {
            if let Some(value) = parts.headers.get("x-permissions") {
                if let Ok(list) = value.to_str() {
                    let permissions = list
                        .split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect();
                    return Ok(BearerClaims(Claims {
                        sub: "local-dev".to_string(),
                        exp: 0,
                        permissions,
                    }));
                }
            }
        }
        // If Env is Production, or the bypass header is absent, execution
        // falls through to the standard token validation flow.

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        // A present but non-Bearer Authorization header is a malformed
        // credential, not a missing one.
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedToken)?;

        let claims = verify_token(token, &config)?;
        Ok(BearerClaims(claims))
    }
}
