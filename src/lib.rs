pub mod config;
pub mod error;
pub mod provider;
pub mod relay;
pub mod response;
pub mod retry;
pub mod server;
