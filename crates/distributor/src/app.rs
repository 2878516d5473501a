//! Main application structure and lifecycle management

use crate::api::ApiServer;
use anyhow::{Context, Result};
use config::Configuration;
use resolver::Resolver;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Shared state handed to every request handler
#[derive(Debug)]
pub struct AppState {
    pub resolver: Resolver,
}

impl AppState {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self {
            resolver: Resolver::new(configuration),
        }
    }
}

/// Main application that coordinates all components
pub struct Application {
    api_server: ApiServer,
}

impl Application {
    /// Create a new application instance
    pub fn new(configuration: Configuration) -> Result<Self> {
        info!("Initializing application components...");

        let state = Arc::new(AppState::new(Arc::new(configuration)));

        let api_server = ApiServer::new(state).context("Failed to create API server")?;

        Ok(Self { api_server })
    }

    /// Serve requests until `shutdown` resolves
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.api_server.run(shutdown).await.context("API server error")?;

        info!("Application shutdown complete");
        Ok(())
    }
}
