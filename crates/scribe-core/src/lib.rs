//! Configuration, the notes-search tool, the agent loop, and the shared
//! application context used by the CLI and the HTTP gateway.

pub mod agent;
pub mod app;
pub mod bootstrap;
pub mod config;
pub mod tools;

pub use app::{AppContext, ChatOverrides};
pub use config::Config;
