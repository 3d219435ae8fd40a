//! gRPC handlers for the gym service.
//!
//! Each handler wraps its request in an [`IncomingCall`], pushes it onto
//! the owning backend's completion queue, and awaits the backend's
//! answer. The backends never see tonic types beyond [`Status`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use indexmap::IndexMap;
use tonic::{Request, Response, Status};
use tracing::{debug, trace};

use crate::call::{IncomingCall, Responder};
use crate::method::Method;
use crate::proto::gym_service_server::GymService;
use crate::proto::WireFrame;
use crate::queue::QueueEvent;

/// Method to completion queue.
pub(crate) type Routes = Arc<IndexMap<Method, Sender<QueueEvent>>>;

/// Routes gym calls into backend completion queues.
#[derive(Debug)]
pub(crate) struct GymHandlers {
    routes: Routes,
    next_call: AtomicU64,
}

impl GymHandlers {
    pub(crate) fn new(routes: Routes) -> Self {
        Self {
            routes,
            next_call: AtomicU64::new(0),
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        request: Request<WireFrame>,
    ) -> Result<Response<WireFrame>, Status> {
        let Some(queue) = self.routes.get(&method) else {
            debug!(%method, "no backend for method");
            return Err(Status::unimplemented(format!("{method} is not served")));
        };
        let call_id = self.next_call.fetch_add(1, Ordering::Relaxed);
        trace!(path = method.grpc_path(), call_id, "call received");

        let (responder, reply) = Responder::new(call_id);
        let call = IncomingCall {
            method,
            payload: request.into_inner().payload,
            responder,
        };
        if queue.send(QueueEvent::Call(call)).is_err() {
            return Err(Status::cancelled("backend shut down"));
        }
        match reply.await {
            Ok(Ok(payload)) => Ok(Response::new(WireFrame { payload })),
            Ok(Err(status)) => Err(status),
            // The worker exited without settling the call.
            Err(_) => Err(Status::cancelled("backend shut down")),
        }
    }
}

#[tonic::async_trait]
impl GymService for GymHandlers {
    async fn start_gym_connector(
        &self,
        request: Request<WireFrame>,
    ) -> Result<Response<WireFrame>, Status> {
        self.dispatch(Method::StartGymConnector, request).await
    }

    async fn request_training_definition(
        &self,
        request: Request<WireFrame>,
    ) -> Result<Response<WireFrame>, Status> {
        self.dispatch(Method::RequestTrainingDefinition, request)
            .await
    }

    async fn request_initial_training_state(
        &self,
        request: Request<WireFrame>,
    ) -> Result<Response<WireFrame>, Status> {
        self.dispatch(Method::RequestInitialTrainingState, request)
            .await
    }

    async fn update_state(
        &self,
        request: Request<WireFrame>,
    ) -> Result<Response<WireFrame>, Status> {
        self.dispatch(Method::UpdateState, request).await
    }
}
