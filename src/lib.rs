pub mod config;
pub mod error;
pub mod middleware;
pub mod navigate;
pub mod server;
pub mod storage;

pub use config::ServerConfig;
pub use server::Server;
