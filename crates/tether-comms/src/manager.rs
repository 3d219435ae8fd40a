//! Server lifecycle and backend factory.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use crossbeam_channel::Sender;
use indexmap::{IndexMap, IndexSet};
use tracing::{info, warn};

use tether_wire::WireMessage;

use crate::backend::{ExchangeBackend, PollingBackend, ProducerBackend};
use crate::config::CommunicatorConfig;
use crate::error::CommsError;
use crate::method::Method;
use crate::queue::{CompletionQueue, Lifecycle, QueueEvent};
use crate::transport::GrpcServer;

/// Server-level state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ComSystemState {
    /// Not serving.
    #[default]
    NotStarted,
    /// Listening and serving calls.
    Started,
    /// The listener could not be started.
    Failure,
}

/// Owns the gRPC server, the completion queues, and every backend's
/// lifecycle.
///
/// Backends are created before [`start_backends`](Self::start_backends).
/// Start broadcasts, in order: worker start, ready, connection
/// established. Shutdown drains every backend, then closes the listener.
pub struct CommunicationManager {
    config: CommunicatorConfig,
    services: IndexSet<String>,
    backends: Vec<Box<dyn Lifecycle>>,
    routes: IndexMap<Method, Sender<QueueEvent>>,
    server: Option<GrpcServer>,
    state: ComSystemState,
}

impl CommunicationManager {
    /// A manager for `config`. Nothing is bound until `start_backends`.
    pub fn new(config: CommunicatorConfig) -> Result<Self, CommsError> {
        config.validate()?;
        Ok(Self {
            config,
            services: IndexSet::new(),
            backends: Vec::new(),
            routes: IndexMap::new(),
            server: None,
            state: ComSystemState::NotStarted,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &CommunicatorConfig {
        &self.config
    }

    /// Record a named service. Returns `false` if it was already registered.
    pub fn register_service(&mut self, name: &str) -> bool {
        if self.services.insert(name.to_string()) {
            info!(service = name, "service registered");
            true
        } else {
            warn!(service = name, "service exists, skipping registration");
            false
        }
    }

    /// A fresh completion queue for one backend.
    pub fn completion_queue(&self) -> CompletionQueue {
        CompletionQueue::new()
    }

    fn prepare(&mut self, service: &str, method: Method) -> Result<CompletionQueue, CommsError> {
        if self.state == ComSystemState::Started {
            return Err(CommsError::AlreadyStarted);
        }
        if self.routes.contains_key(&method) {
            return Err(CommsError::DuplicateMethod { method });
        }
        self.register_service(service);
        let queue = self.completion_queue();
        self.routes.insert(method, queue.sender());
        Ok(queue)
    }

    /// A non-blocking inbox for `method`.
    pub fn create_polling_backend<Req, Resp>(
        &mut self,
        service: &str,
        method: Method,
    ) -> Result<PollingBackend<Req>, CommsError>
    where
        Req: WireMessage,
        Resp: WireMessage + Default,
    {
        let queue = self.prepare(service, method)?;
        let (backend, driver) = PollingBackend::new::<Resp>(method, queue);
        self.backends.push(Box::new(driver));
        Ok(backend)
    }

    /// A FIFO outbox served to pulls on `method`.
    pub fn create_producer_backend<Resp: WireMessage>(
        &mut self,
        service: &str,
        method: Method,
    ) -> Result<ProducerBackend<Resp>, CommsError> {
        let queue = self.prepare(service, method)?;
        let (backend, driver) = ProducerBackend::new(method, queue);
        self.backends.push(Box::new(driver));
        Ok(backend)
    }

    /// A strict request/response channel on `method`.
    pub fn create_exchange_backend<Req, Resp>(
        &mut self,
        service: &str,
        method: Method,
    ) -> Result<ExchangeBackend<Req, Resp>, CommsError>
    where
        Req: WireMessage + Default,
        Resp: WireMessage + Default,
    {
        let queue = self.prepare(service, method)?;
        let (backend, driver) = ExchangeBackend::new(method, queue);
        self.backends.push(Box::new(driver));
        Ok(backend)
    }

    /// Bind the listener and bring every backend up.
    ///
    /// On a bind failure the state becomes [`ComSystemState::Failure`]
    /// and no backend is started.
    pub fn start_backends(&mut self) -> Result<(), CommsError> {
        if self.state == ComSystemState::Started {
            return Ok(());
        }
        let url = self.config.url();
        let server = match GrpcServer::bind(&url, Arc::new(self.routes.clone())) {
            Ok(s) => s,
            Err(e) => {
                warn!(address = %url, error = %e, "server not started, address unavailable");
                self.state = ComSystemState::Failure;
                return Err(e);
            }
        };
        self.server = Some(server);

        for i in 0..self.backends.len() {
            if let Err(e) = self.backends[i].start() {
                warn!(method = %self.backends[i].method(), error = %e, "backend failed to start");
                self.stop_all();
                self.state = ComSystemState::Failure;
                return Err(e);
            }
        }
        self.state = ComSystemState::Started;
        for b in &mut self.backends {
            b.ready();
        }
        for b in &mut self.backends {
            b.established();
        }
        if let Some(addr) = self.local_addr() {
            info!(address = %addr, backends = self.backends.len(), "running server");
        }
        Ok(())
    }

    fn stop_all(&mut self) {
        for b in &mut self.backends {
            b.shutdown();
        }
        if let Some(mut server) = self.server.take() {
            server.shutdown();
        }
    }

    /// Drain every backend and close the listener.
    pub fn shutdown_server(&mut self) {
        if self.server.is_none() {
            warn!("server was not running");
        }
        self.state = ComSystemState::NotStarted;
        self.stop_all();
        info!("server shut down, all queues closed");
    }

    /// Current state.
    pub fn state(&self) -> ComSystemState {
        self.state
    }

    /// The bound address once started. Useful when the port is `0`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(GrpcServer::local_addr)
    }

    /// Number of backends created.
    pub fn num_backends(&self) -> usize {
        self.backends.len()
    }
}

impl fmt::Debug for CommunicationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommunicationManager")
            .field("url", &self.config.url())
            .field("services", &self.services)
            .field("backends", &self.backends.len())
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for CommunicationManager {
    fn drop(&mut self) {
        if self.state == ComSystemState::Started {
            self.shutdown_server();
        }
    }
}
