use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::ErrorBody;

/// Failures on the chat path. All of them surface to the client the same way.
#[derive(Debug, Error)]
pub enum RelayError {
  #[error("{0}")]
  Generation(String),

  #[error("text generation timed out after {0:?}")]
  Timeout(Duration),

  #[error("{0}")]
  Store(#[from] rusqlite::Error),

  #[error("malformed {kind} record: missing {column}")]
  MalformedRecord { kind: &'static str, column: &'static str },
}

impl From<reqwest::Error> for RelayError {
  fn from(err: reqwest::Error) -> Self {
    RelayError::Generation(err.to_string())
  }
}

impl IntoResponse for RelayError {
  fn into_response(self) -> Response {
    tracing::error!(error = %self, "chat request failed");
    let body = Json(ErrorBody::new(&self.to_string()));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
  }
}
