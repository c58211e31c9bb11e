//! Link layer: reliability and sequencing over a framed transport.
//!
//! [`LinkActor`] owns the transport and every piece of mutable protocol
//! state; a single `run` task drives a biased `tokio::select!` over
//! cancellation, caller commands, the retransmit timer, and inbound
//! frames. Delivering a message upward awaits the bounded channel, so
//! upstream backpressure pauses the whole pipeline, transport included.
//!
//! In inactive mode (the default) sequence numbers stay zero and writes
//! resolve once written. After protocol negotiation the caller activates
//! the layer: outbound messages are stamped with sequence numbers cycling
//! 1..=99, retained until acknowledged, and retransmitted on a timer;
//! inbound messages are deduplicated, reassembled, validated, and
//! acknowledged.

mod error;
mod handle;
mod options;
mod partition;
mod pending;
mod reassembly;
mod sequence;

pub use error::{AckProblem, LinkError};
pub use handle::{LinkChannels, LinkHandle};
pub use options::LinkOptions;

use std::collections::VecDeque;

use bytes::Bytes;
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf, split},
    sync::mpsc,
    time::{Instant, sleep_until},
};
use tokio_util::{codec::FramedRead, sync::CancellationToken};

use self::{
    handle::Command,
    partition::partition,
    pending::{Completion, PendingWrite},
    reassembly::PartAssembly,
    sequence::{PeerSequence, SequenceCounter},
};
use crate::{
    header::{CodecError, FrameError, HeaderCodec, encode_frame},
    message::{MID_NEGATIVE_ACK, MID_POSITIVE_ACK, Message, Payload, is_link_ack_mid},
    mid::registry,
};

const CHANNEL_CAPACITY: usize = 32;

/// Error codes carried in negative acknowledge payloads.
///
/// The Open Protocol specification leaves the code table to the
/// deployment; these values are fixed for this client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NackCode {
    /// The peer's sequence number broke the expected progression.
    InvalidSequenceNumber,
    /// A multi-part frame arrived out of order.
    InconsistentMessageNumber,
}

impl NackCode {
    const fn wire_code(self) -> u8 {
        match self {
            Self::InvalidSequenceNumber => 4,
            Self::InconsistentMessageNumber => 5,
        }
    }
}

impl std::fmt::Display for NackCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSequenceNumber => write!(f, "invalid sequence number"),
            Self::InconsistentMessageNumber => write!(f, "inconsistent message number"),
        }
    }
}

/// Actor owning the transport and all link-layer state.
///
/// Construction hands back the actor alongside its [`LinkHandle`] and
/// [`LinkChannels`]; spawn [`run`](Self::run) to start the pipeline.
///
/// # Examples
///
/// ```no_run
/// use tokio::net::TcpStream;
/// use torqlink::{LinkActor, LinkOptions, Message};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = TcpStream::connect("10.0.0.5:4545").await?;
/// let (actor, handle, mut channels) = LinkActor::new(transport, LinkOptions::default());
/// tokio::spawn(actor.run());
///
/// handle.write(Message::new(1)).await?;
/// let reply = channels.messages.recv().await;
/// # drop(reply);
/// # Ok(())
/// # }
/// ```
pub struct LinkActor<T> {
    reader: FramedRead<ReadHalf<T>, HeaderCodec>,
    writer: WriteHalf<T>,
    options: LinkOptions,
    commands: mpsc::Receiver<Command>,
    messages: mpsc::Sender<Message>,
    errors: mpsc::Sender<LinkError>,
    serializer_errors: mpsc::Sender<LinkError>,
    cancel: CancellationToken,
    active: bool,
    sequence: SequenceCounter,
    peer: PeerSequence,
    pending: Option<PendingWrite>,
    deferred: VecDeque<(Message, Completion)>,
    assembly: PartAssembly,
    last_delivered: Option<(u16, u8)>,
}

impl<T> LinkActor<T>
where
    T: AsyncRead + AsyncWrite + Send,
{
    /// Wrap `transport` in a link layer configured by `options`.
    #[must_use]
    pub fn new(transport: T, options: LinkOptions) -> (Self, LinkHandle, LinkChannels) {
        let (read_half, write_half) = split(transport);
        let reader = FramedRead::new(read_half, HeaderCodec::with_raw_data(options.raw_data));
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (message_tx, message_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (serializer_tx, serializer_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let actor = Self {
            reader,
            writer: write_half,
            options,
            commands: command_rx,
            messages: message_tx,
            errors: error_tx,
            serializer_errors: serializer_tx,
            cancel: cancel.clone(),
            active: false,
            sequence: SequenceCounter::new(),
            peer: PeerSequence::new(),
            pending: None,
            deferred: VecDeque::new(),
            assembly: PartAssembly::new(),
            last_delivered: None,
        };
        let handle = LinkHandle::new(command_tx, cancel);
        let channels = LinkChannels {
            messages: message_rx,
            errors: error_rx,
            serializer_errors: serializer_rx,
        };
        (actor, handle, channels)
    }

    /// Drive the pipeline until destroyed, the transport closes, or an I/O
    /// failure surfaces.
    ///
    /// Dropping the actor drops a pending write's completion sender, so a
    /// caller still awaiting that write observes [`LinkError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Io`] when the transport fails. Framing and
    /// protocol violations are reported on the error channel instead and
    /// do not stop the pipeline.
    pub async fn run(mut self) -> Result<(), LinkError> {
        info!("link layer started");
        let result = self.drive().await;
        match &result {
            Ok(()) => info!("link layer stopped"),
            Err(err) => warn!("link layer stopped on error: {err}"),
        }
        result
    }

    async fn drive(&mut self) -> Result<(), LinkError> {
        loop {
            let deadline = self.pending.as_ref().map(|pending| pending.deadline);
            match self.next_event(deadline).await {
                Event::Shutdown => {
                    debug!("link layer destroyed");
                    return Ok(());
                }
                Event::Command(Some(command)) => self.handle_command(command).await?,
                // Every handle has been dropped.
                Event::Command(None) => return Ok(()),
                Event::RetransmitDue => self.handle_retransmit().await?,
                Event::Frame(Some(Ok(message))) => self.handle_frame(message).await?,
                Event::Frame(Some(Err(CodecError::Frame(err)))) => {
                    self.report_error(LinkError::Frame(err));
                }
                Event::Frame(Some(Err(CodecError::Io(err)))) => return Err(LinkError::Io(err)),
                Event::Frame(None) => {
                    debug!("transport closed by peer");
                    return Ok(());
                }
            }
        }
    }

    /// Await the next ready event using biased priority ordering: shutdown
    /// first, then caller commands, the retransmit timer, and finally
    /// inbound frames.
    async fn next_event(&mut self, deadline: Option<Instant>) -> Event {
        tokio::select! {
            biased;

            () = self.cancel.cancelled() => Event::Shutdown,
            command = self.commands.recv() => Event::Command(command),
            () = wait_until(deadline), if deadline.is_some() => Event::RetransmitDue,
            frame = self.reader.next() => Event::Frame(frame),
        }
    }

    async fn handle_command(&mut self, command: Command) -> Result<(), LinkError> {
        match command {
            Command::Write {
                message,
                completion,
            } => {
                if message.is_acknowledge() {
                    // Acks bypass the pending slot and go out immediately.
                    self.start_write(message, completion).await?;
                } else {
                    self.deferred.push_back((message, completion));
                    self.pump_writes().await?;
                }
            }
            Command::Activate => {
                debug!("link layer activated");
                self.active = true;
                self.sequence.reset();
                self.peer.reset();
            }
            Command::Deactivate => {
                debug!("link layer deactivated");
                self.active = false;
                self.sequence.reset();
                self.peer.reset();
            }
        }
        Ok(())
    }

    /// Release deferred writes while the pending slot is free.
    async fn pump_writes(&mut self) -> Result<(), LinkError> {
        while self.pending.is_none() {
            let Some((message, completion)) = self.deferred.pop_front() else {
                break;
            };
            self.start_write(message, completion).await?;
        }
        Ok(())
    }

    async fn start_write(
        &mut self,
        mut message: Message,
        completion: Completion,
    ) -> Result<(), LinkError> {
        if let Err(err) = registry().serialize(&mut message) {
            self.report_serializer_error(LinkError::Mid(err.clone()));
            let _ = completion.send(Err(LinkError::Mid(err)));
            return Ok(());
        }
        let is_ack = message.is_acknowledge();

        // The assigned sequence number is rolled back on failure so the
        // next write reuses it.
        let restore = self.sequence.value();
        if self.active && !is_ack {
            message.sequence_number = self.sequence.advance();
        } else if !self.active {
            message.sequence_number = 0;
        }

        let Some(payload) = message.payload.to_bytes() else {
            self.sequence.restore(restore);
            let err = FrameError::InvalidPayload { mid: message.mid };
            self.report_serializer_error(LinkError::Frame(err.clone()));
            let _ = completion.send(Err(LinkError::Frame(err)));
            return Ok(());
        };

        let frames = match partition(&message, payload) {
            Ok(frames) => frames,
            Err(err) => {
                // Oversize writes surface on the error channel and fail the
                // caller; nothing reaches the transport.
                self.sequence.restore(restore);
                self.report_error(LinkError::Frame(err.clone()));
                let _ = completion.send(Err(LinkError::Frame(err)));
                return Ok(());
            }
        };

        let mut encoded = Vec::with_capacity(frames.len());
        for frame in &frames {
            match encode_frame(frame) {
                Ok(bytes) => encoded.push(bytes),
                Err(err) => {
                    self.sequence.restore(restore);
                    self.report_serializer_error(LinkError::Frame(err.clone()));
                    let _ = completion.send(Err(LinkError::Frame(err)));
                    return Ok(());
                }
            }
        }

        self.write_frames(&encoded).await?;

        if is_ack || !self.active {
            let _ = completion.send(Ok(()));
            return Ok(());
        }

        debug!(
            "MID {:04} pending with sequence {}",
            message.mid, message.sequence_number
        );
        self.pending = Some(PendingWrite::new(
            message.mid,
            message.sequence_number,
            encoded,
            Instant::now() + self.options.timeout,
            completion,
        ));
        Ok(())
    }

    async fn handle_retransmit(&mut self) -> Result<(), LinkError> {
        let Some(pending) = &mut self.pending else {
            return Ok(());
        };

        if pending.resends < self.options.retry_limit {
            pending.resends += 1;
            pending.deadline = Instant::now() + self.options.timeout;
            let frames = pending.frames.clone();
            warn!(
                "retransmitting MID {:04}, attempt {}",
                pending.mid, pending.resends
            );
            return self.write_frames(&frames).await;
        }

        let mut pending = self.pending.take().expect("pending write checked above");
        let (mid, retries) = (pending.mid, pending.resends);
        warn!("MID {mid:04} unacknowledged after {retries} retries");
        pending.complete(Err(LinkError::Timeout { mid, retries }));
        self.pump_writes().await
    }

    async fn handle_frame(&mut self, frame: Message) -> Result<(), LinkError> {
        // A retransmission of the last delivered message means our ack was
        // lost; drop it without delivering twice.
        if self.active
            && frame.sequence_number != 0
            && self.last_delivered == Some((frame.mid, frame.sequence_number))
        {
            debug!(
                "suppressing duplicate MID {:04} sequence {}",
                frame.mid, frame.sequence_number
            );
            return Ok(());
        }

        let (frame_mid, frame_sequence) = (frame.mid, frame.sequence_number);
        let message = if frame.message_parts > 0 {
            match self.assembly.accept(frame) {
                Ok(Some(message)) => message,
                Ok(None) => return Ok(()),
                Err(mismatch) => {
                    if self.active {
                        self.send_nack(frame_mid, frame_sequence, NackCode::InconsistentMessageNumber)
                            .await?;
                    }
                    self.report_error(LinkError::InconsistencyMessageNumber {
                        expected: mismatch.expected,
                        actual: mismatch.actual,
                    });
                    return Ok(());
                }
            }
        } else {
            frame
        };

        if self.active && message.sequence_number != 0 && !is_link_ack_mid(message.mid) {
            let expected = self.peer.next_expected();
            if message.sequence_number != expected {
                self.send_nack(
                    message.mid,
                    message.sequence_number,
                    NackCode::InvalidSequenceNumber,
                )
                .await?;
                self.report_error(LinkError::InvalidSequenceNumber {
                    expected,
                    actual: message.sequence_number,
                });
                return Ok(());
            }
            self.peer.accept(expected);
            if !message.no_ack {
                self.send_positive_ack(message.mid, expected).await?;
            }
        }

        if is_link_ack_mid(message.mid) {
            return self.handle_ack(message).await;
        }
        self.deliver(message).await
    }

    async fn handle_ack(&mut self, message: Message) -> Result<(), LinkError> {
        let Some(mut pending) = self.pending.take() else {
            warn!("unsolicited acknowledgement MID {:04}", message.mid);
            return Ok(());
        };

        let expected_ack = (pending.sequence_number + 1) % 100;
        let verdict = match acked_mid(&message) {
            None => Err(AckProblem::Unreadable),
            Some(acked) if message.mid == MID_NEGATIVE_ACK => {
                Err(AckProblem::Negative { mid: acked })
            }
            Some(acked) if acked != pending.mid => Err(AckProblem::MidMismatch {
                expected: pending.mid,
                actual: acked,
            }),
            Some(_) if message.sequence_number != expected_ack => {
                Err(AckProblem::SequenceMismatch {
                    expected: expected_ack,
                    actual: message.sequence_number,
                })
            }
            Some(_) => Ok(()),
        };

        match verdict {
            Ok(()) => {
                debug!("MID {:04} acknowledged", pending.mid);
                pending.complete(Ok(()));
            }
            Err(problem) => {
                warn!("acknowledgement failed pending MID {:04}: {problem}", pending.mid);
                pending.complete(Err(LinkError::AckMismatch(problem)));
            }
        }
        self.pump_writes().await
    }

    async fn deliver(&mut self, mut message: Message) -> Result<(), LinkError> {
        if !self.options.disable_mid_parsing.contains(&message.mid) {
            if let Err(err) = registry().parse(&mut message) {
                self.report_error(LinkError::Mid(err));
                return Ok(());
            }
        }

        self.last_delivered = Some((message.mid, message.sequence_number));
        if self.messages.send(message).await.is_err() {
            // Upstream consumer is gone; nothing left to deliver to.
            debug!("message receiver dropped, stopping link layer");
            self.cancel.cancel();
        }
        Ok(())
    }

    async fn send_positive_ack(&mut self, mid: u16, sequence: u8) -> Result<(), LinkError> {
        let mut ack =
            Message::with_payload(MID_POSITIVE_ACK, Payload::Raw(Bytes::from(format!("{mid:04}"))));
        ack.sequence_number = (sequence + 1) % 100;
        let frame = encode_frame(&ack).map_err(LinkError::Frame)?;
        self.write_frames(&[frame]).await
    }

    async fn send_nack(&mut self, mid: u16, sequence: u8, code: NackCode) -> Result<(), LinkError> {
        warn!("rejecting MID {mid:04}: {code}");
        let mut nack = Message::with_payload(
            MID_NEGATIVE_ACK,
            Payload::Raw(Bytes::from(format!("{mid:04}{:02}", code.wire_code()))),
        );
        nack.sequence_number = (sequence + 1) % 100;
        let frame = encode_frame(&nack).map_err(LinkError::Frame)?;
        self.write_frames(&[frame]).await
    }

    async fn write_frames(&mut self, frames: &[Bytes]) -> Result<(), LinkError> {
        for frame in frames {
            self.writer.write_all(frame).await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    fn report_error(&self, error: LinkError) {
        debug!("protocol error: {error}");
        if let Err(err) = self.errors.try_send(error) {
            warn!("error channel unavailable: {err}");
        }
    }

    fn report_serializer_error(&self, error: LinkError) {
        debug!("serializer error: {error}");
        if let Err(err) = self.serializer_errors.try_send(error) {
            warn!("serializer error channel unavailable: {err}");
        }
    }
}

/// Event selected by the actor loop.
enum Event {
    Shutdown,
    Command(Option<Command>),
    RetransmitDue,
    Frame(Option<Result<Message, CodecError>>),
}

/// Sleep until `deadline`, or forever when no write is pending.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Read the acknowledged MID out of an ack payload's leading four digits.
fn acked_mid(message: &Message) -> Option<u16> {
    let bytes = message.payload.as_bytes()?;
    let digits = bytes.get(..4)?;
    digits.iter().try_fold(0_u16, |value, &byte| {
        byte.is_ascii_digit()
            .then(|| value * 10 + u16::from(byte - b'0'))
    })
}
