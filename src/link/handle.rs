//! Handle and channels for driving a running link layer.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::{LinkError, pending::Completion};
use crate::message::Message;

/// Work submitted to the link actor.
pub(super) enum Command {
    /// Serialize, frame, and transmit a message.
    Write {
        message: Message,
        completion: Completion,
    },
    /// Engage the sequencing protocol.
    Activate,
    /// Return to inactive mode; both sequence counters reset to zero.
    Deactivate,
}

/// Cloneable handle for submitting work to a [`LinkActor`](super::LinkActor).
#[derive(Clone, Debug)]
pub struct LinkHandle {
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
}

impl LinkHandle {
    pub(super) fn new(commands: mpsc::Sender<Command>, cancel: CancellationToken) -> Self {
        Self { commands, cancel }
    }

    /// Write a message, resolving once the link layer has disposed of it:
    /// acknowledged by the peer in active mode, written to the transport
    /// otherwise. Acks resolve as soon as they are written.
    ///
    /// # Errors
    ///
    /// Resolves to the precise failure: a [`LinkError::Frame`] or
    /// [`LinkError::Mid`] serialization error, [`LinkError::Timeout`] after
    /// the retry budget, [`LinkError::AckMismatch`] on a negative or
    /// mismatched acknowledgement, or [`LinkError::Closed`] when the link
    /// layer is destroyed before the write resolves.
    pub async fn write(&self, message: Message) -> Result<(), LinkError> {
        let (completion, resolved) = oneshot::channel();
        self.commands
            .send(Command::Write {
                message,
                completion,
            })
            .await
            .map_err(|_| LinkError::Closed)?;
        resolved.await.map_err(|_| LinkError::Closed)?
    }

    /// Engage sequencing, acknowledgement, and retransmission.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Closed`] when the link layer has stopped.
    pub async fn activate(&self) -> Result<(), LinkError> { self.send(Command::Activate).await }

    /// Return to inactive mode.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Closed`] when the link layer has stopped.
    pub async fn deactivate(&self) -> Result<(), LinkError> { self.send(Command::Deactivate).await }

    async fn send(&self, command: Command) -> Result<(), LinkError> {
        self.commands.send(command).await.map_err(|_| LinkError::Closed)
    }

    /// Tear the link layer down. Timers are cancelled and a pending write
    /// resolves to [`LinkError::Closed`].
    pub fn destroy(&self) { self.cancel.cancel(); }

    /// Token cancelled when the link layer shuts down.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken { self.cancel.clone() }
}

/// Receiving side of the link layer.
///
/// Serializer failures travel on their own channel so callers can route
/// outbound encoding problems differently from protocol violations.
#[derive(Debug)]
pub struct LinkChannels {
    /// Messages delivered in arrival order, after reassembly and duplicate
    /// suppression.
    pub messages: mpsc::Receiver<Message>,
    /// Inbound parse and protocol failures.
    pub errors: mpsc::Receiver<LinkError>,
    /// Outbound encoding failures.
    pub serializer_errors: mpsc::Receiver<LinkError>,
}
