//! RAX Drive - Entry Point
//!
//! A browser-accessible file drive serving a single sandboxed storage root.

use log::{error, info};
use std::process;

use rax_drive::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Launching RAX Drive...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}
