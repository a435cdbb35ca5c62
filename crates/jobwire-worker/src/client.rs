use std::fmt;
use std::sync::Arc;

use jobwire_transport::{FrameSink, FrameSource, Target, TransportError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, WorkerError};
use crate::identity::WorkerIdentity;
use crate::message::{InboundMessage, OutboundMessage};
use crate::session::Session;
use crate::state::WorkerState;

/// Lifecycle phase of a [`WorkerClient`].
///
/// `Connected → Registering → Active → Closed`. A client only exists once its
/// transport is open, so there is no disconnected phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientPhase {
    Connected = 1,
    Registering = 2,
    Active = 3,
    Closed = 4,
}

impl ClientPhase {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => ClientPhase::Connected,
            2 => ClientPhase::Registering,
            3 => ClientPhase::Active,
            _ => ClientPhase::Closed,
        }
    }
}

impl fmt::Display for ClientPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientPhase::Connected => "connected",
            ClientPhase::Registering => "registering",
            ClientPhase::Active => "active",
            ClientPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Why the receive loop stopped.
///
/// None of these are reported as errors; they are only observable here and in
/// logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// [`WorkerClient::close`] was called or the client was dropped.
    Shutdown,
    /// The dispatcher closed the session or the stream ended.
    ClosedByPeer,
    /// Reading from the transport failed.
    ReadFailed,
    /// The dispatcher sent a frame that could not be decoded.
    DecodeFailed,
}

/// Worker side of one dispatcher session.
///
/// A background task reads frames for the whole life of the session and
/// hands every decoded message to its own task, so handler side effects are
/// not ordered with respect to frame arrival. All writes share one exclusive
/// path, which makes the client safe to use from many tasks at once.
pub struct WorkerClient {
    identity: WorkerIdentity,
    target: Target,
    session: Arc<Session>,
    shutdown: CancellationToken,
    receiver: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl WorkerClient {
    /// Take ownership of an open transport and start the receive loop.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        identity: WorkerIdentity,
        target: Target,
        sink: FrameSink,
        source: FrameSource,
    ) -> Self {
        let session = Arc::new(Session::new(sink));
        let shutdown = CancellationToken::new();
        let receiver = tokio::spawn(receive_loop(
            source,
            Arc::clone(&session),
            shutdown.clone(),
        ));
        debug!(worker_id = identity.worker_id(), %target, "receive loop started");

        Self {
            identity,
            target,
            session,
            shutdown,
            receiver: std::sync::Mutex::new(Some(receiver)),
        }
    }

    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Live counters for this session.
    pub fn state(&self) -> &WorkerState {
        self.session.state()
    }

    pub fn phase(&self) -> ClientPhase {
        self.session.phase()
    }

    /// Why the receive loop stopped, if it has.
    pub fn session_end(&self) -> Option<SessionEnd> {
        self.session.end()
    }

    /// Wait until the receive loop stops and report why.
    pub async fn session_ended(&self) -> SessionEnd {
        self.session.wait_ended().await
    }

    /// Announce this worker to the dispatcher.
    ///
    /// Valid once per session, from [`ClientPhase::Connected`]. A failed send
    /// leaves the client `Connected` so the caller may decide to try again;
    /// no retry happens here. Once closed, this fails with
    /// [`WorkerError::Send`].
    pub async fn register(&self) -> Result<()> {
        match self
            .session
            .transition(ClientPhase::Connected, ClientPhase::Registering)
        {
            Ok(()) => {}
            Err(ClientPhase::Closed) => return Err(WorkerError::Send(TransportError::Closed)),
            Err(actual) => {
                return Err(WorkerError::InvalidState {
                    expected: ClientPhase::Connected,
                    actual,
                })
            }
        }

        info!(
            worker_id = self.identity.worker_id(),
            job_type = %self.identity.job_type(),
            "registering worker"
        );
        let message = OutboundMessage::Register(self.identity.clone());
        if let Err(err) = self.session.send(&message).await {
            if let Err(actual) = self
                .session
                .transition(ClientPhase::Registering, ClientPhase::Connected)
            {
                warn!(
                    phase = %actual,
                    error = %err,
                    "register send failed after the phase moved on"
                );
            }
            return Err(err);
        }
        Ok(())
    }

    /// Send any worker message through the shared write path.
    pub async fn send(&self, message: &OutboundMessage) -> Result<()> {
        self.session.send(message).await
    }

    /// Stop the receive loop and close the transport.
    ///
    /// Best effort: transport errors are logged, never returned. Calling this
    /// more than once is a no-op. Handler tasks already running are not
    /// cancelled; their sends fail with [`WorkerError::Send`].
    pub async fn close(&self) {
        if !self.session.mark_closed() {
            debug!("close called on closed client");
            return;
        }

        self.shutdown.cancel();
        self.session.shutdown_transport().await;

        let receiver = match self.receiver.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = receiver {
            if let Err(err) = handle.await {
                warn!(error = %err, "receive loop task failed");
            }
        }
        info!(worker_id = self.identity.worker_id(), "worker session closed");
    }
}

impl Drop for WorkerClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl fmt::Debug for WorkerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerClient")
            .field("identity", &self.identity)
            .field("target", &self.target.to_string())
            .field("phase", &self.phase())
            .field("session_end", &self.session_end())
            .finish()
    }
}

async fn receive_loop(mut source: FrameSource, session: Arc<Session>, shutdown: CancellationToken) {
    let end = loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break SessionEnd::Shutdown,
            next = source.recv_frame() => next,
        };

        let payload = match next {
            Ok(Some(payload)) => payload,
            Ok(None) => break SessionEnd::ClosedByPeer,
            Err(err) => {
                debug!(error = %err, "read failed");
                break SessionEnd::ReadFailed;
            }
        };

        match InboundMessage::decode(payload) {
            Ok(Some(message)) => {
                tokio::spawn(Arc::clone(&session).dispatch(message));
            }
            Ok(None) => continue,
            Err(err) => {
                warn!(error = %err, "undecodable frame from dispatcher");
                break SessionEnd::DecodeFailed;
            }
        }
    };

    session.finish(end);
}
