use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// `Json<T>` whose rejections (bad syntax, wrong shape, missing content
/// type) all surface as a 400 `{ "error": ... }` body.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(rejection_to_error(rejection))
            }
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("Expected a JSON request body")
        }
        other => ApiError::bad_request(format!("Invalid JSON in request body: {}", other.body_text())),
    }
}
