// SPDX-License-Identifier: GPL-3.0

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Represents the various errors that can occur while relaying a request.
#[derive(Error, Debug)]
pub enum RelayError {
	/// The upstream connection could not be established.
	#[error("Failed to connect to the endpoint: {0}")]
	Connect(String),
	/// Establishing the upstream connection took too long.
	#[error("Connection timeout")]
	ConnectTimeout,
	/// The request body is not a valid relay request.
	#[error("Invalid request: {0}")]
	InvalidRequest(String),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	/// The request does not name an endpoint.
	#[error("Missing endpoint parameter")]
	MissingEndpoint,
	/// The endpoint is not on the allow-list.
	#[error("Endpoint not allowed")]
	NotAllowed,
	/// No response arrived in time.
	#[error("Response timeout")]
	ResponseTimeout,
	/// The upstream connection failed after it was established.
	#[error("Upstream error: {0}")]
	Upstream(String),
}

impl RelayError {
	/// The HTTP status reported for the error.
	pub fn status(&self) -> StatusCode {
		match self {
			RelayError::InvalidRequest(_) | RelayError::MissingEndpoint => StatusCode::BAD_REQUEST,
			RelayError::NotAllowed => StatusCode::FORBIDDEN,
			RelayError::Connect(_) | RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
			RelayError::ConnectTimeout | RelayError::ResponseTimeout => StatusCode::GATEWAY_TIMEOUT,
			RelayError::IO(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for RelayError {
	fn into_response(self) -> Response {
		(self.status(), Json(json!({ "error": self.to_string() }))).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_codes_work() {
		assert_eq!(RelayError::MissingEndpoint.status(), StatusCode::BAD_REQUEST);
		assert_eq!(RelayError::InvalidRequest("x".into()).status(), StatusCode::BAD_REQUEST);
		assert_eq!(RelayError::NotAllowed.status(), StatusCode::FORBIDDEN);
		assert_eq!(RelayError::Connect("refused".into()).status(), StatusCode::BAD_GATEWAY);
		assert_eq!(RelayError::ConnectTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
		assert_eq!(RelayError::ResponseTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
	}

	#[test]
	fn messages_match_the_wire_format() {
		assert_eq!(RelayError::NotAllowed.to_string(), "Endpoint not allowed");
		assert_eq!(RelayError::MissingEndpoint.to_string(), "Missing endpoint parameter");
	}
}
