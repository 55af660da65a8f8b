//! HTTP gateway over the notes index and agent: `/query`, `/chat`, `/reindex`, `/health`.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use server::GatewayServer;
