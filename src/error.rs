use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{auth::AuthError, repository::StoreError};

/// ApiError
///
/// The handler-boundary error union, mapped onto distinct status codes
/// instead of a single opaque catch-all. Authorization errors propagate
/// untouched from the Token Validator and Permission Gate; store failures are
/// classified here before the original cause is flattened into the client
/// message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The referenced drink id does not exist.
    #[error("resource not found")]
    NotFound,
    /// The requested title collides with an existing drink.
    #[error("a drink with this title already exists")]
    Conflict,
    /// The request body was structurally valid JSON but failed validation.
    #[error("unprocessable")]
    Unprocessable,
    /// Any other failure. The cause is logged; the client sees only a
    /// generic message.
    #[error("an unknown error happened")]
    Internal(#[source] StoreError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateTitle => ApiError::Conflict,
            other => ApiError::Internal(other),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => e.status(),
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The Error Mapper. Every failure leaving a handler is rendered as the fixed
/// envelope `{"success": false, "error": <status>, "message": <text>}` with
/// the status code from the taxonomy above.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Preserve the underlying cause in the logs even though the client
        // message stays generic.
        if let ApiError::Internal(ref cause) = self {
            tracing::error!(error = ?cause, "request failed with internal error");
        }

        let status = self.status();
        let body = json!({
            "success": false,
            "error": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// ApiJson Extractor
///
/// A thin wrapper over `axum::Json` whose rejection is an `ApiError` instead
/// of axum's plain-text response. A body that is not valid JSON, does not
/// deserialize into the payload type, or arrives without the JSON
/// content type is rejected as 422 in the same fixed envelope every other
/// failure uses, keeping all responses `application/json`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                // Keep the parser's diagnosis in the logs; the client only
                // sees the generic validation message.
                tracing::debug!(error = %rejection, "rejected unparseable request body");
                Err(ApiError::Unprocessable)
            }
        }
    }
}
