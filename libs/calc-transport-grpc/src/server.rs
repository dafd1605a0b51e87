//! TCP listener binding and graceful tonic serving.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;
use tonic::transport::Server;

/// A bound listener that has not started serving yet.
///
/// Binding is split from serving so callers learn the real port (for
/// `127.0.0.1:0`) before the first call can arrive.
pub struct BoundListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

/// Bind a TCP listener for a gRPC server.
///
/// # Errors
/// Returns an error if the address cannot be bound.
pub async fn bind_tcp(addr: SocketAddr) -> anyhow::Result<BoundListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind gRPC listener at {addr}"))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, transport = "tcp", "gRPC server listening");

    Ok(BoundListener {
        listener,
        local_addr,
    })
}

impl BoundListener {
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// URI clients can connect to, e.g. `http://127.0.0.1:50051`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Serve `routes` until `cancel` fires, then drain in-flight calls.
    ///
    /// # Errors
    /// Returns an error if the server fails while accepting or serving.
    pub async fn serve(self, routes: Routes, cancel: CancellationToken) -> anyhow::Result<()> {
        let local_addr = self.local_addr;
        let incoming = TcpListenerStream::new(self.listener);

        Server::builder()
            .add_routes(routes)
            .serve_with_incoming_shutdown(incoming, async move {
                cancel.cancelled().await;
            })
            .await?;

        tracing::info!(%local_addr, "gRPC server stopped");
        Ok(())
    }
}
