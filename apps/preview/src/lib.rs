//! # Enhancer Preview
//!
//! A small `Axum` site for trying the page enhancers against a real server. Every route
//! answers browsers with a full HTML page and enhanced requests (`x-requested-with` plus
//! `Accept: application/json`) with a navigation response.
//!
//! ## Example
//! ```no_run
//! use ln_preview::Preview;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Preview::builder().port(4590).build().run().await
//! }
//! ```

mod config;
mod pages;

pub use config::PreviewConfig;

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// A fluent builder for the [`Preview`] server.
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct PreviewBuilder {
    cfg: PreviewConfig,
}

impl PreviewBuilder {
    pub fn config(mut self, cfg: PreviewConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.port = port;
        self
    }

    pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
        self.cfg.csrf_token = token.into();
        self
    }

    pub fn build(self) -> Preview {
        Preview { cfg: Arc::new(self.cfg) }
    }
}

/// A configured preview server.
#[must_use = "call .run().await to start the server"]
#[derive(Debug, Clone)]
pub struct Preview {
    cfg: Arc<PreviewConfig>,
}

impl Preview {
    pub fn builder() -> PreviewBuilder {
        PreviewBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &PreviewConfig {
        &self.cfg
    }

    /// The routes with request tracing, ready to serve or to drive in tests.
    pub fn router(&self) -> Router {
        pages::router(self.cfg.clone()).layer(TraceLayer::new_for_http())
    }

    /// Serves until Ctrl+C or SIGTERM, then drains connections.
    ///
    /// # Errors
    /// Returns an error when the address cannot be bound.
    pub async fn run(self) -> Result<()> {
        let address = SocketAddr::new(self.cfg.address, self.cfg.port);
        let app = self.router();

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(5)));
        });

        info!("Preview listening on http://{address}");
        axum_server::bind(address)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context("Preview server failed")?;

        info!("Preview shutdown complete");
        Ok(())
    }
}

/// Waits for SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res.context("Ctrl+C signal received")?;
        },
        res = terminate => {
            res.context("SIGTERM signal received")?;
        },
    }

    Ok(())
}
