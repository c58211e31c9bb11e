//! Single-shot slot for the in-flight write.
//!
//! The completion sender is consumed on first use, so the caller's write
//! resolves exactly once no matter which path (ack, retry exhaustion,
//! serializer failure) terminates it.

use bytes::Bytes;
use tokio::{sync::oneshot, time::Instant};

use super::LinkError;

/// Resolves the caller's [`write`](super::LinkHandle::write) future.
pub(super) type Completion = oneshot::Sender<Result<(), LinkError>>;

/// The one outbound write awaiting its acknowledgement.
#[derive(Debug)]
pub(super) struct PendingWrite {
    /// MID as it went on the wire (after any registry rewrite).
    pub(super) mid: u16,
    /// Sequence number stamped on every frame of the write.
    pub(super) sequence_number: u8,
    /// Serialized frames, kept for retransmission.
    pub(super) frames: Vec<Bytes>,
    /// Retransmissions performed so far.
    pub(super) resends: u32,
    /// Next retransmit instant.
    pub(super) deadline: Instant,
    completion: Option<Completion>,
}

impl PendingWrite {
    pub(super) fn new(
        mid: u16,
        sequence_number: u8,
        frames: Vec<Bytes>,
        deadline: Instant,
        completion: Completion,
    ) -> Self {
        Self {
            mid,
            sequence_number,
            frames,
            resends: 0,
            deadline,
            completion: Some(completion),
        }
    }

    /// Fire the completion. Later calls are no-ops.
    pub(super) fn complete(&mut self, result: Result<(), LinkError>) {
        if let Some(completion) = self.completion.take() {
            let _ = completion.send(result);
        }
    }
}
