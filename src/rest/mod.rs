// Customers Service
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! REST interface for the customers service.
//!
//! Every API is put in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This may
//! seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! More specifically, the `tests` module within an API defines a `route` method that returns
//! the HTTP method and the API path under test.  All integration tests within the module then
//! rely on `route` to obtain this information, ensuring that they all test the desired API.

use crate::driver::{Driver, DriverError};
use crate::model::ModelError;
use async_trait::async_trait;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

mod address_delete;
mod address_get;
mod address_put;
mod addresses_get;
mod addresses_post;
mod customer_delete;
mod customer_get;
mod customer_lock_put;
mod customer_put;
mod customer_unlock_put;
mod customers_get;
mod customers_post;
mod index_get;
#[cfg(test)]
pub(crate) mod testutils;

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum RestError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    Conflict(String),

    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// Indicates a query string with a key outside of the allow-list.
    #[error("{0}")]
    UnsupportedKey(String),

    /// Indicates a request body with a content type other than JSON.
    #[error("{0}")]
    UnsupportedMediaType(String),
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::Conflict(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl RestError {
    /// Returns the HTTP status code and the human-readable label of this error.
    fn status_and_label(&self) -> (http::StatusCode, &'static str) {
        match self {
            RestError::Conflict(_) => (http::StatusCode::CONFLICT, "Conflict"),
            RestError::InternalError(_) => {
                (http::StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            RestError::InvalidRequest(_) => (http::StatusCode::BAD_REQUEST, "Bad Request"),
            RestError::NotFound(_) => (http::StatusCode::NOT_FOUND, "Not Found"),
            RestError::PayloadNotEmpty => {
                (http::StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
            }
            RestError::UnsupportedKey(_) => (http::StatusCode::BAD_REQUEST, "Unsupported Key"),
            RestError::UnsupportedMediaType(_) => {
                (http::StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type")
            }
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        let (status, label) = self.status_and_label();

        let response = ErrorResponse {
            status_code: status.as_u16(),
            error: label.to_owned(),
            message: self.to_string(),
        };

        (status, Json(response)).into_response()
    }
}

/// Result type for this module.
pub(crate) type RestResult<T> = Result<T, RestError>;

/// Representation of the details of an error response.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ErrorResponse {
    /// Numeric HTTP status code of the response, duplicated in the body.
    pub(crate) status_code: u16,

    /// Human-readable label of the status code.
    pub(crate) error: String,

    /// Textual representation of the error message.
    pub(crate) message: String,
}

/// A request body extractor that forbids any content.
///
/// Any API that doesn't expect a body should use this to ensure we don't get garbage data that we
/// don't care about.  This future-proofs the service.
pub(crate) struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// A request body extractor for untyped JSON payloads.
///
/// The shape of the payload is checked by the model-level validators, not here, because those
/// produce the entity-specific messages the API contract requires.  For the same reason, a body
/// that fails to parse is handed over as `Null`: it must surface the same error as a body of a
/// wrong shape.
pub(crate) struct JsonPayload(pub(crate) serde_json::Value);

#[async_trait]
impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = match req.headers().get(http::header::CONTENT_TYPE) {
            Some(value) => match value.to_str() {
                Ok(value) => match value.parse::<mime::Mime>() {
                    Ok(mime) => {
                        mime.type_() == mime::APPLICATION && mime.subtype() == mime::JSON
                    }
                    Err(_) => false,
                },
                Err(_) => false,
            },
            None => false,
        };
        if !is_json {
            return Err(RestError::UnsupportedMediaType(
                "Content-Type must be application/json".to_owned(),
            ));
        }

        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|e| RestError::InvalidRequest(e.to_string()))?;
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        Ok(JsonPayload(value))
    }
}

/// Creates the router for the customers endpoints.
///
/// The `driver` is a configured instance of the `Driver` to handle the records.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, put};

    Router::new()
        .route("/", get(index_get::handler))
        .route("/customers", get(customers_get::handler).post(customers_post::handler))
        .route(
            "/customers/:customer_id",
            get(customer_get::handler)
                .put(customer_put::handler)
                .delete(customer_delete::handler),
        )
        .route("/customers/:customer_id/lock", put(customer_lock_put::handler))
        .route("/customers/:customer_id/unlock", put(customer_unlock_put::handler))
        .route(
            "/customers/:customer_id/addresses",
            get(addresses_get::handler).post(addresses_post::handler),
        )
        .route(
            "/customers/:customer_id/addresses/:address_id",
            get(address_get::handler).put(address_put::handler).delete(address_delete::handler),
        )
        .with_state(driver)
}
