use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::DriveError;
use crate::navigate::PathResolver;
use crate::server::routes::{AppState, build_router};
use crate::storage::StorageOperations;

pub struct Server {
    listener: TcpListener,
    state: AppState,
    config: ServerConfig,
}

impl Server {
    /// Prepares the storage root and binds the listener.
    pub async fn new(config: ServerConfig) -> Result<Self, DriveError> {
        let resolver = PathResolver::new(config.storage_root_path())
            .inspect_err(|e| {
                error!(
                    "Failed to prepare storage root {}: {}",
                    config.storage_root, e
                )
            })?
            .with_strict_traversal(config.strict_traversal);
        info!("Storage root directory: {}", resolver.root().display());

        let socket = config.socket_address();
        let listener = TcpListener::bind(&socket)
            .await
            .inspect_err(|e| error!("Failed to bind to {}: {}", socket, e))?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            listener,
            state: AppState::new(Arc::new(StorageOperations::new(resolver))),
            config,
        })
    }

    /// Serves requests until Ctrl+C.
    pub async fn start(self) -> Result<(), DriveError> {
        info!(
            "Starting RAX Drive on {} (uploads up to {} MB, strict traversal: {})",
            self.config.socket_address(),
            self.config.max_upload_size_mb,
            self.config.strict_traversal
        );

        let router = build_router(self.state, self.config.max_upload_size_bytes());
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
