//! Downstream dispatch of verified plugin inputs.
//!
//! ## Flow
//!
//! ```text
//! Webhook Gate → PluginInput → Runner (RabbitMQ publisher) → plugin_inputs queue
//! ```

pub mod publisher;
pub mod types;

use futures::future::BoxFuture;

use crate::Config;

pub use publisher::Publisher;
pub use types::PluginInput;

/// The processing routine a verified plugin input is handed to.
///
/// Resolves once the input has been handled, or fails with the error that
/// the gate reports as a 500.
pub trait Runner: Send + Sync {
    fn run<'a>(&'a self, input: PluginInput, config: &'a Config) -> BoxFuture<'a, anyhow::Result<()>>;
}
