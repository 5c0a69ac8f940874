//! Plugin webhook gate.
//!
//! Accepts signed plugin inputs over HTTP, verifies their RSA signature,
//! decodes their settings with schema defaults, and dispatches them to a
//! downstream runner.
//!
//! ## Architecture
//!
//! ```text
//! Kernel → POST / → signature check → settings decode → Runner → plugin_inputs queue
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod settings;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{PluginInput, Publisher, Runner};
pub use error::GateError;
pub use settings::{decode_settings, DecodedSettings, PluginSettings};
pub use web::{router, AppState};
