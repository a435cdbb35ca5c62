//! State shared between a client, its receive loop, and handler tasks.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use jobwire_frame::kind_name;
use jobwire_transport::{FrameSink, TransportError, NORMAL_CLOSURE};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ClientPhase, SessionEnd};
use crate::error::{Result, WorkerError};
use crate::message::{InboundMessage, Job, OutboundMessage, RegisterAck};
use crate::state::WorkerState;

pub(crate) struct Session {
    sink: Mutex<FrameSink>,
    state: WorkerState,
    phase: AtomicU8,
    end: OnceLock<SessionEnd>,
    ended: CancellationToken,
}

impl Session {
    pub(crate) fn new(sink: FrameSink) -> Self {
        Self {
            sink: Mutex::new(sink),
            state: WorkerState::new(),
            phase: AtomicU8::new(ClientPhase::Connected as u8),
            end: OnceLock::new(),
            ended: CancellationToken::new(),
        }
    }

    pub(crate) fn state(&self) -> &WorkerState {
        &self.state
    }

    pub(crate) fn phase(&self) -> ClientPhase {
        ClientPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Move from `from` to `to`; on failure returns the phase actually observed.
    pub(crate) fn transition(
        &self,
        from: ClientPhase,
        to: ClientPhase,
    ) -> std::result::Result<(), ClientPhase> {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(ClientPhase::from_u8)
    }

    /// Mark the session closed. Returns `false` if it already was.
    pub(crate) fn mark_closed(&self) -> bool {
        self.phase.swap(ClientPhase::Closed as u8, Ordering::SeqCst) != ClientPhase::Closed as u8
    }

    /// Encode `message` and write it as one frame.
    ///
    /// This is the only path to the transport's write half.
    pub(crate) async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let payload = message.encode()?;

        if self.phase() == ClientPhase::Closed {
            return Err(WorkerError::Send(TransportError::Closed));
        }

        let mut sink = self.sink.lock().await;
        sink.send_frame(payload).await.map_err(WorkerError::Send)?;
        debug!(kind = kind_name(message.kind()), "sent message");
        Ok(())
    }

    /// Best-effort close handshake. Errors are logged and dropped.
    pub(crate) async fn shutdown_transport(&self) {
        let mut sink = self.sink.lock().await;
        if let Err(err) = sink.send_close(NORMAL_CLOSURE, "").await {
            debug!(error = %err, "close frame not sent");
        }
        if let Err(err) = sink.close().await {
            debug!(error = %err, "transport close failed");
        }
    }

    /// Record why the receive loop stopped. Only the first reason is kept.
    pub(crate) fn finish(&self, end: SessionEnd) {
        if self.end.set(end).is_ok() {
            info!(reason = ?end, "receive loop stopped");
        }
        self.ended.cancel();
    }

    pub(crate) fn end(&self) -> Option<SessionEnd> {
        self.end.get().copied()
    }

    pub(crate) async fn wait_ended(&self) -> SessionEnd {
        self.ended.cancelled().await;
        self.end().unwrap_or(SessionEnd::Shutdown)
    }

    /// Run the handler for one inbound message. Failures are logged here.
    pub(crate) async fn dispatch(self: Arc<Self>, message: InboundMessage) {
        let kind = kind_name(message.kind());
        if let Err(err) = self.handle(message).await {
            warn!(kind, error = %err, "handler failed");
        }
    }

    pub(crate) async fn handle(&self, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::RegisterAck(ack) => {
                self.on_register_ack(ack);
                Ok(())
            }
            InboundMessage::AvailabilityRequest(job) => self.on_availability_request(job).await,
            InboundMessage::JobAssignment(job) => {
                self.on_job_assignment(job);
                Ok(())
            }
        }
    }

    fn on_register_ack(&self, ack: RegisterAck) {
        let count = self.state.record_register_ack();
        if self
            .transition(ClientPhase::Registering, ClientPhase::Active)
            .is_ok()
        {
            info!(worker_id = ?ack.worker_id, "worker registered");
        } else {
            debug!(count, "additional registration acknowledgement");
        }
    }

    /// Count the request and answer it. The answer is always attempted once.
    async fn on_availability_request(&self, job: Job) -> Result<()> {
        self.state.record_availability(job.job_type);
        debug!(job_id = %job.id, job_type = %job.job_type, "availability requested");

        self.send(&OutboundMessage::availability(job.id, true)).await
    }

    fn on_job_assignment(&self, job: Job) {
        self.state.record_assignment(job.job_type);
        info!(job_id = %job.id, job_type = %job.job_type, "job assigned");
    }
}
