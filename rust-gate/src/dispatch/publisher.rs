//! Async RabbitMQ publisher used as the downstream runner.
//!
//! Verified plugin inputs are published to a durable queue where the plugin
//! workers pick them up. The channel runs in confirm mode, so a publish only
//! succeeds once the broker has acked it. The gate publishes once and never
//! retries.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    publisher_confirm::Confirmation,
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{PluginInput, Runner};
use crate::Config;

/// Async RabbitMQ publisher with lazy connection management.
///
/// The publisher keeps a single connection and channel, reconnecting on the
/// next publish if the channel dropped.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    queue: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl Publisher {
    /// Create a new publisher for the given RabbitMQ URL and queue.
    pub fn new(url: String, queue: String) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                queue,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cloudamqp_url.clone(), config.plugin_queue.clone())
    }

    pub fn queue(&self) -> &str {
        &self.inner.queue
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Double-check after acquiring write lock
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_publisher_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        info!("rabbitmq_publisher_connected");

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        ch.confirm_select(ConfirmSelectOptions::default())
            .await
            .context("Failed to enable publisher confirms")?;

        ch.queue_declare(
            &self.inner.queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare plugin queue")?;

        info!(queue = %self.inner.queue, "rabbitmq_queue_declared");

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Publish a verified plugin input.
    pub async fn publish(&self, input: &PluginInput) -> Result<()> {
        let channel = self.ensure_connected().await?;

        let body = serde_json::to_vec(input).context("Failed to serialize plugin input")?;
        let message_id = message_id(input);

        let mut properties = BasicProperties::default()
            .with_delivery_mode(2) // Persistent
            .with_content_type("application/json".into());
        if let Some(id) = &message_id {
            properties = properties.with_message_id(id.clone().into());
        }

        let confirmation = channel
            .basic_publish(
                "",
                &self.inner.queue,
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await
            .context("Failed to publish plugin input")?
            .await
            .context("Failed to confirm publish")?;
        check_confirmation(confirmation)?;

        info!(
            queue = %self.inner.queue,
            message_id = ?message_id,
            body_length = body.len(),
            "rabbitmq_plugin_input_published"
        );

        Ok(())
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_publisher_closed");
    }
}

impl Runner for Publisher {
    fn run<'a>(&'a self, input: PluginInput, _config: &'a Config) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.publish(&input).await })
    }
}

/// Only a plain broker ack counts as a successful publish.
fn check_confirmation(confirmation: Confirmation) -> Result<()> {
    match confirmation {
        Confirmation::Ack(None) => Ok(()),
        Confirmation::Ack(Some(_)) => bail!("Broker returned the plugin input as unroutable"),
        Confirmation::Nack(_) => bail!("Broker nacked the plugin input"),
        Confirmation::NotRequested => bail!("Channel is not in confirm mode"),
    }
}

/// Message id for tracing a plugin input through the queue.
fn message_id(input: &PluginInput) -> Option<String> {
    input
        .state_id()
        .or_else(|| input.event_name())
        .map(str::to_string)
}
