//! Webhook endpoint handlers.
//!
//! The plugin webhook is a single linear pipeline:
//! 1. Check method and content type
//! 2. Strip and verify the payload signature
//! 3. Decode settings with defaults
//! 4. Hand the verified input to the runner
//!
//! Every failure short-circuits into a [`GateError`].

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::dispatch::{PluginInput, Runner};
use crate::error::GateError;
use crate::settings::decode_settings;
use crate::web::signature::verify_signature;
use crate::Config;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runner: Arc<dyn Runner>,
}

impl AppState {
    pub fn new(config: Config, runner: Arc<dyn Runner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Plugin Webhook
// =============================================================================

/// Plugin webhook endpoint.
///
/// Accepts any method so that non-POST requests get the gate's own 405 body.
pub async fn plugin_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match handle(&state, &method, &headers, &body).await {
        Ok(()) => (StatusCode::OK, Json("OK")).into_response(),
        Err(e) => {
            if e.is_uncaught() {
                error!(error = %e, "plugin_webhook_uncaught_error");
            }
            e.into_response_with(state.config.expose_error_details)
        }
    }
}

/// Run one webhook request through the gate.
pub async fn handle(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), GateError> {
    if *method != Method::POST {
        debug!(method = %method, "plugin_webhook_method_rejected");
        return Err(GateError::MethodNotAllowed);
    }

    // Absent header renders as "null" in the error message
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
    if content_type.as_deref() != Some(JSON_CONTENT_TYPE) {
        let content_type = content_type.unwrap_or_else(|| "null".to_string());
        debug!(content_type = %content_type, "plugin_webhook_content_type_rejected");
        return Err(GateError::InvalidContentType(content_type));
    }

    let mut payload = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(GateError::InvalidPayload(
                "expected a JSON object".to_string(),
            ))
        }
        Err(e) => return Err(GateError::InvalidPayload(e.to_string())),
    };

    let signature = match payload.shift_remove("signature") {
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(GateError::InvalidPayload(
                "signature must be a string".to_string(),
            ))
        }
        None => return Err(GateError::InvalidPayload("signature is missing".to_string())),
    };

    if !verify_signature(&state.config.public_key_pem, &payload, &signature)? {
        let state_id = payload.get("stateId").and_then(Value::as_str);
        warn!(state_id = ?state_id, "plugin_signature_invalid");
        return Err(GateError::SignatureVerificationFailed);
    }

    let settings = decode_settings(payload.get("settings").cloned())?;
    let input = PluginInput::new(payload, settings);

    info!(
        state_id = ?input.state_id(),
        event_name = ?input.event_name(),
        allow_public_query = input.settings().allow_public_query,
        "plugin_webhook_verified"
    );

    state
        .runner
        .run(input, &state.config)
        .await
        .map_err(GateError::Run)?;

    info!("plugin_webhook_dispatched");

    Ok(())
}
