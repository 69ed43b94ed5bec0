//! Application wiring: construct the pipeline from configuration, spawn
//! the ingestion and coordinator tasks, and run until shutdown.

use crate::buffer::WindowBuffer;
use crate::config::Config;
use crate::detect::BlinkDetector;
use crate::dispatch::{CommandSink, HttpDispatcher};
use crate::dsp::BandpassFilter;
use crate::error::AppResult;
use crate::ingest::OscGateway;
use crate::pipeline::PipelineCoordinator;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

pub struct App {
    ingest: tokio::task::JoinHandle<()>,
    coordinator: tokio::task::JoinHandle<()>,
    shutdown: watch::Sender<bool>,
    buffer: Arc<WindowBuffer>,
    osc_addr: std::net::SocketAddr,
}

impl App {
    /// Build every component and spawn the two long-lived tasks.
    ///
    /// Fails fast on configuration problems: filter design and socket
    /// binding both happen here, before any sample is accepted.
    pub async fn start(config: &Config) -> AppResult<Self> {
        Self::start_with_sink(config, Arc::new(HttpDispatcher::new(&config.actuator)?)).await
    }

    /// Same as [`App::start`] but with a caller-supplied command sink,
    /// which integration tests use to observe dispatches.
    pub async fn start_with_sink(config: &Config, sink: Arc<dyn CommandSink>) -> AppResult<Self> {
        let window_len = config.acquisition.window_len();
        let filter = BandpassFilter::new(config.acquisition.sampling_rate_hz, &config.filter)?;
        let detector = BlinkDetector::new(&config.detector);

        let (buffer, windows) = WindowBuffer::new(window_len);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let coordinator = PipelineCoordinator::new(
            Arc::clone(&buffer),
            windows,
            filter,
            detector,
            sink,
            config.pipeline.cooldown,
            shutdown_rx.clone(),
        );
        let gateway = OscGateway::bind(&config.osc, Arc::clone(&buffer), shutdown_rx).await?;
        let osc_addr = gateway.local_addr()?;

        info!(
            window_len,
            sampling_rate_hz = config.acquisition.sampling_rate_hz,
            actuator = %config.actuator.base_url,
            "pipeline started"
        );

        Ok(Self {
            ingest: tokio::spawn(gateway.run()),
            coordinator: tokio::spawn(coordinator.run()),
            shutdown,
            buffer,
            osc_addr,
        })
    }

    /// Address the OSC gateway is bound to (resolves port 0 bindings).
    pub fn osc_addr(&self) -> std::net::SocketAddr {
        self.osc_addr
    }

    /// Samples currently buffered and not part of any in-flight window.
    pub fn buffered_len(&self) -> usize {
        self.buffer.buffered_len()
    }

    /// Signal shutdown and wait for both tasks to finish.
    ///
    /// An in-flight pass is interrupted at its next await point (cooling,
    /// or the dispatch timeout at the latest); buffered samples are
    /// discarded by design.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.ingest.await {
            warn!(%err, "ingestion task ended abnormally");
        }
        if let Err(err) = self.coordinator.await {
            warn!(%err, "coordinator task ended abnormally");
        }
        info!("pipeline stopped");
    }

    /// Run until Ctrl-C, then shut down.
    pub async fn run_until_signal(self) -> AppResult<()> {
        tokio::signal::ctrl_c().await?;
        info!("shutdown signal received");
        self.shutdown().await;
        Ok(())
    }
}
