//! Command dispatch to the actuator endpoint.
//!
//! Delivery is best-effort and at-most-once: one GET per non-`none`
//! command, a bounded client timeout, no retries. The coordinator absorbs
//! every transport failure; a dead actuator must never stall ingestion.

use crate::command::Command;
use crate::config::ActuatorConfig;
use crate::error::{AppResult, BlinkError};
use async_trait::async_trait;
use tracing::{debug, info};

/// Destination for mapped commands.
///
/// The pipeline only needs a single "send" call; tests substitute mock
/// sinks to observe or fail dispatches.
#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn send(&self, command: Command) -> AppResult<()>;
}

/// HTTP sink: issues `GET {base_url}{path}` per command.
pub struct HttpDispatcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDispatcher {
    pub fn new(config: &ActuatorConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CommandSink for HttpDispatcher {
    async fn send(&self, command: Command) -> AppResult<()> {
        let Some(path) = command.path() else {
            debug!(%command, "no dispatch for empty command");
            return Ok(());
        };

        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BlinkError::DispatchStatus(status.as_u16()));
        }
        info!(%command, %url, status = status.as_u16(), "command dispatched");
        Ok(())
    }
}
