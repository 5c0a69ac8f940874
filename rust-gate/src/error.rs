//! Error taxonomy for the webhook gate and its HTTP mapping.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::settings::SettingsError;
use crate::web::signature::SignatureError;

/// Body used in place of the error message when details are not exposed.
pub const REDACTED_ERROR: &str = "Internal server error";

/// Every way a webhook request can fail.
///
/// The first three are request problems answered with a 4xx. Everything else
/// is an uncaught error: logged, and answered with a 500.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Only POST requests are supported.")]
    MethodNotAllowed,

    #[error("Error: {0} is not a valid content type")]
    InvalidContentType(String),

    #[error("Error: Signature verification failed")]
    SignatureVerificationFailed,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Downstream run failed: {0:#}")]
    Run(anyhow::Error),
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GateError::InvalidContentType(_) | GateError::SignatureVerificationFailed => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error escaped the request pipeline rather than being
    /// answered as a bad request.
    pub fn is_uncaught(&self) -> bool {
        self.status() == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Render the error, optionally hiding the message of uncaught errors.
    pub fn into_response_with(self, expose_details: bool) -> Response {
        let status = self.status();
        let message = if self.is_uncaught() && !expose_details {
            REDACTED_ERROR.to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if matches!(self, GateError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        self.into_response_with(true)
    }
}
