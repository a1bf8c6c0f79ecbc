//! Core module: server configuration, shared state and the HTTP server
//!
//! - [`Config`] — env-var configuration
//! - [`ServerState`] — shared handles to every component
//! - [`Server`] — axum HTTP server

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
