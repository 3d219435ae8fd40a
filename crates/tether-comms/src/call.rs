//! In-flight calls and their lifecycle.
//!
//! Every request a gRPC handler accepts becomes an [`IncomingCall`]
//! holding a [`Responder`] back to that handler. Backends park calls in
//! a [`CallSlot`] while they wait for the simulation to supply an
//! answer.

use std::fmt;

use tokio::sync::oneshot;
use tonic::Status;
use tracing::debug;

use crate::method::Method;

/// What a handler eventually returns: an encoded response or a status.
pub type CallResult = Result<Vec<u8>, Status>;

/// Delivers exactly one result to the handler awaiting it.
pub struct Responder {
    call_id: u64,
    tx: oneshot::Sender<CallResult>,
}

impl Responder {
    /// A responder for `call_id` and the receiver its handler awaits.
    pub fn new(call_id: u64) -> (Self, oneshot::Receiver<CallResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { call_id, tx }, rx)
    }

    /// Id of the call this responder answers.
    pub fn call_id(&self) -> u64 {
        self.call_id
    }

    /// Send the result, consuming the responder. A caller that has gone
    /// away is logged and otherwise ignored.
    pub fn send(self, result: CallResult) {
        if self.tx.send(result).is_err() {
            debug!(call_id = self.call_id, "response dropped, caller went away");
        }
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("call_id", &self.call_id)
            .finish_non_exhaustive()
    }
}

/// A request routed to a backend, awaiting its response.
#[derive(Debug)]
pub struct IncomingCall {
    /// The method called.
    pub method: Method,
    /// Encoded request message.
    pub payload: Vec<u8>,
    /// Where the response goes.
    pub responder: Responder,
}

impl IncomingCall {
    /// Answer with an encoded response.
    pub fn reply(self, payload: &[u8]) {
        self.responder.send(Ok(payload.to_vec()));
    }

    /// Fail the call with `status`.
    pub fn reject(self, status: Status) {
        self.responder.send(Err(status));
    }
}

// ── CallSlot ────────────────────────────────────────────────────

/// Stage of a [`CallSlot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CallStage {
    /// Armed and waiting for a request.
    #[default]
    Create,
    /// Holding a request that has not been answered.
    Process,
    /// Answered; must be reset before reuse.
    Finish,
}

/// A reusable holder that walks one call through `Create -> Process -> Finish`.
#[derive(Debug, Default)]
pub struct CallSlot {
    stage: CallStage,
    call: Option<IncomingCall>,
}

impl CallSlot {
    /// An armed, empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage.
    pub fn stage(&self) -> CallStage {
        self.stage
    }

    /// `true` while a request is held.
    pub fn is_ready(&self) -> bool {
        self.stage == CallStage::Process
    }

    /// The held request's payload, if any.
    pub fn request(&self) -> Option<&[u8]> {
        self.call.as_ref().map(|c| c.payload.as_slice())
    }

    /// Take ownership of `call`. A slot that is not armed hands the call
    /// back unchanged.
    pub fn process(&mut self, call: IncomingCall) -> Result<(), IncomingCall> {
        if self.stage != CallStage::Create {
            return Err(call);
        }
        self.call = Some(call);
        self.stage = CallStage::Process;
        Ok(())
    }

    /// Answer the held request. Returns `false` if nothing was held.
    pub fn finish(&mut self, payload: &[u8]) -> bool {
        match self.call.take() {
            Some(call) if self.stage == CallStage::Process => {
                call.reply(payload);
                self.stage = CallStage::Finish;
                true
            }
            other => {
                self.call = other;
                false
            }
        }
    }

    /// Re-arm the slot for another call.
    pub fn reset(&mut self) {
        self.call = None;
        self.stage = CallStage::Create;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A call on `method` and the receiver its handler would await.
    pub(crate) fn call_on(
        method: Method,
        id: u64,
        payload: Vec<u8>,
    ) -> (IncomingCall, oneshot::Receiver<CallResult>) {
        let (responder, rx) = Responder::new(id);
        let call = IncomingCall {
            method,
            payload,
            responder,
        };
        (call, rx)
    }

    fn call(id: u64) -> (IncomingCall, oneshot::Receiver<CallResult>) {
        call_on(Method::UpdateState, id, vec![id as u8])
    }

    #[test]
    fn slot_walks_create_process_finish() {
        let mut slot = CallSlot::new();
        assert_eq!(slot.stage(), CallStage::Create);

        let (c, mut rx) = call(7);
        slot.process(c).unwrap();
        assert!(slot.is_ready());
        assert_eq!(slot.request(), Some(&[7u8][..]));

        assert!(slot.finish(b"done"));
        assert_eq!(slot.stage(), CallStage::Finish);
        assert_eq!(rx.try_recv().unwrap().unwrap(), b"done".to_vec());
    }

    #[test]
    fn unarmed_slot_hands_call_back() {
        let mut slot = CallSlot::new();
        slot.process(call(1).0).unwrap();
        let back = slot.process(call(2).0).unwrap_err();
        assert_eq!(back.responder.call_id(), 2);
    }

    #[test]
    fn finish_without_call_is_noop() {
        let mut slot = CallSlot::new();
        assert!(!slot.finish(&[]));
        assert_eq!(slot.stage(), CallStage::Create);
    }

    #[test]
    fn reset_rearms() {
        let mut slot = CallSlot::new();
        slot.process(call(1).0).unwrap();
        slot.finish(&[]);
        slot.reset();
        assert!(slot.process(call(2).0).is_ok());
    }

    #[test]
    fn rejected_call_carries_status() {
        let (c, mut rx) = call(3);
        c.reject(Status::invalid_argument("bad frame"));
        let status = rx.try_recv().unwrap().unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn reply_to_departed_caller_is_dropped_quietly() {
        let (c, rx) = call(4);
        drop(rx);
        c.reply(b"late");
    }
}
