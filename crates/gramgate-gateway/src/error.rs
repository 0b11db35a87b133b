// SPDX-FileCopyrightText: 2026 Gramgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP rendering of the error taxonomy.
//!
//! Every error body has the shape `{"error": CODE, "message": ...}`;
//! flood waits additionally carry `"seconds"`. Internal details never
//! reach the wire.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gramgate_core::GramgateError;
use serde_json::json;
use tracing::error;

pub struct ApiError(pub GramgateError);

impl From<GramgateError> for ApiError {
    fn from(err: GramgateError) -> Self {
        Self(err)
    }
}

fn status_for(err: &GramgateError) -> StatusCode {
    match err {
        GramgateError::InvalidApiCredentials
        | GramgateError::PhoneNumberInvalid
        | GramgateError::InvalidCode
        | GramgateError::ExpiredCode
        | GramgateError::InvalidPassword
        | GramgateError::AccountExists { .. }
        | GramgateError::Validation(_) => StatusCode::BAD_REQUEST,
        GramgateError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        GramgateError::NotConnected => StatusCode::FORBIDDEN,
        GramgateError::AccountNotFound => StatusCode::NOT_FOUND,
        GramgateError::AlreadyConnected => StatusCode::CONFLICT,
        GramgateError::FloodWait { .. } => StatusCode::TOO_MANY_REQUESTS,
        GramgateError::Config(_)
        | GramgateError::Storage { .. }
        | GramgateError::Timeout { .. }
        | GramgateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let code = self.0.code();

        // Server-side faults log the cause; clients get the code only.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
            "internal error".to_owned()
        } else {
            self.0.to_string()
        };

        let mut body = json!({ "error": code, "message": message });
        if let Some(seconds) = self.0.retry_after() {
            body["seconds"] = json!(seconds);
        }
        (status, Json(body)).into_response()
    }
}
