//! Sequence counters for the active link layer.
//!
//! Outbound messages cycle through 1..=99, wrapping back to 1; a peer
//! acknowledges sequence `n` with `(n + 1) mod 100`, so the ack counter
//! alone can reach 0.

/// Counter stamping fresh sequence numbers onto outbound messages.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct SequenceCounter {
    current: u8,
}

impl SequenceCounter {
    pub(super) fn new() -> Self { Self::default() }

    /// Last assigned sequence number; 0 before the first assignment.
    pub(super) fn value(&self) -> u8 { self.current }

    /// Assign the next sequence number, wrapping 99 back to 1.
    pub(super) fn advance(&mut self) -> u8 {
        self.current = if self.current >= 99 { 1 } else { self.current + 1 };
        self.current
    }

    /// Sequence number a well-behaved peer acknowledges the current
    /// assignment with.
    pub(super) fn expected_ack(&self) -> u8 { (self.current + 1) % 100 }

    /// Restore the counter after a failed write so the sequence number is
    /// reused by the next one.
    pub(super) fn restore(&mut self, value: u8) { self.current = value; }

    pub(super) fn reset(&mut self) { self.current = 0; }
}

/// Tracker for the peer's outbound sequence progression.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct PeerSequence {
    last: u8,
}

impl PeerSequence {
    pub(super) fn new() -> Self { Self::default() }

    /// Sequence number the peer's next fresh message must carry.
    pub(super) fn next_expected(&self) -> u8 { (self.last + 1) % 100 }

    /// Record an accepted peer sequence number.
    pub(super) fn accept(&mut self, sequence: u8) { self.last = sequence; }

    pub(super) fn reset(&mut self) { self.last = 0; }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_sequence_wraps_ninety_nine_to_one() {
        let mut counter = SequenceCounter::new();
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.advance(), 2);

        counter.restore(99);
        assert_eq!(counter.advance(), 1, "99 wraps to 1, never 0");
    }

    #[test]
    fn expected_ack_wraps_ninety_nine_to_zero() {
        let mut counter = SequenceCounter::new();
        counter.restore(99);
        assert_eq!(counter.expected_ack(), 0);

        counter.restore(1);
        assert_eq!(counter.expected_ack(), 2);
    }

    #[test]
    fn restore_reuses_the_sequence_of_a_failed_write() {
        let mut counter = SequenceCounter::new();
        let before = counter.value();
        let assigned = counter.advance();
        counter.restore(before);
        assert_eq!(counter.advance(), assigned);
    }

    #[test]
    fn peer_expectation_wraps_ninety_nine_to_zero() {
        let mut peer = PeerSequence::new();
        assert_eq!(peer.next_expected(), 1);

        peer.accept(99);
        assert_eq!(peer.next_expected(), 0);
    }
}
