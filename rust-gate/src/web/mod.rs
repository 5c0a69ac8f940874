//! Web server module for the plugin webhook gate.
//!
//! This module provides the HTTP surface that:
//! - Accepts signed plugin webhooks on `/`
//! - Verifies the payload signature against the configured public key
//! - Normalizes the embedded settings
//! - Hands the verified input to the downstream runner

pub mod handlers;
pub mod signature;

use axum::{
    routing::{any, get},
    Router,
};

pub use handlers::{handle, health, plugin_webhook, AppState, HealthResponse};
pub use signature::{import_public_key, verify_signature, SignatureError};

/// Build the gate router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", any(plugin_webhook))
        .with_state(state)
}
