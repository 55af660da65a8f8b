use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;

use scribe_core::AppContext;

use crate::error::GatewayError;
use crate::router::build_router;

#[derive(Clone)]
pub(crate) struct AppState {
    pub ctx: Arc<AppContext>,
}

pub struct GatewayServer {
    addr: SocketAddr,
    max_body_size: usize,
    ctx: Arc<AppContext>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        ctx: Arc<AppContext>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0, /reindex is reachable from the network");
        }

        Self {
            addr,
            max_body_size: 1_048_576,
            ctx,
            shutdown_rx,
        }
    }

    /// Gateway configured from `ctx.config.gateway`.
    #[must_use]
    pub fn from_context(ctx: Arc<AppContext>, shutdown_rx: watch::Receiver<bool>) -> Self {
        let gateway = ctx.config.gateway.clone();
        Self::new(&gateway.bind, gateway.port, ctx, shutdown_rx)
            .with_max_body_size(gateway.max_body_size)
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the HTTP gateway server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState { ctx: self.ctx };
        let router = build_router(state, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}
