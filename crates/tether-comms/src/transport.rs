//! gRPC transport.
//!
//! A dedicated tokio runtime serves [`GymServiceServer`] on a listener
//! bound up front, so the bound address is known even for port `0`.
//! Shutdown signals the server and waits for in-flight calls, which the
//! backends settle while draining.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{debug, info, warn};

use crate::error::CommsError;
use crate::proto::gym_service_server::GymServiceServer;
use crate::service::{GymHandlers, Routes};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A running gRPC server and the runtime it lives on.
pub(crate) struct GrpcServer {
    local_addr: SocketAddr,
    runtime: Option<Runtime>,
    stop: Option<oneshot::Sender<()>>,
    serve: Option<JoinHandle<Result<(), tonic::transport::Error>>>,
}

impl GrpcServer {
    /// Bind `address` and start serving `routes`.
    pub(crate) fn bind(address: &str, routes: Routes) -> Result<Self, CommsError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tether-grpc")
            .enable_all()
            .build()?;
        let listener = runtime
            .block_on(TcpListener::bind(address))
            .map_err(|e| CommsError::Bind {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr()?;

        let (stop, stopped) = oneshot::channel::<()>();
        let service = GymServiceServer::new(GymHandlers::new(routes));
        let serve = runtime.spawn(
            Server::builder()
                .add_service(service)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    let _ = stopped.await;
                }),
        );
        info!(address = %local_addr, "listening");
        Ok(Self {
            local_addr,
            runtime: Some(runtime),
            stop: Some(stop),
            serve: Some(serve),
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, let in-flight calls finish, and tear down the
    /// runtime.
    pub(crate) fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        if let Some(serve) = self.serve.take() {
            match runtime.block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, serve).await }) {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => warn!(error = %e, "server exited with error"),
                Ok(Err(e)) => warn!(error = %e, "server task failed"),
                Err(_) => warn!("server did not stop within the grace period"),
            }
        }
        runtime.shutdown_timeout(SHUTDOWN_GRACE);
        debug!(address = %self.local_addr, "listener closed");
    }
}

impl Drop for GrpcServer {
    fn drop(&mut self) {
        if self.runtime.is_some() {
            self.shutdown();
        }
    }
}
