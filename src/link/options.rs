//! Link layer configuration.

use std::{collections::HashSet, time::Duration};

/// Options controlling retransmission, raw-data capture, and MID parsing.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use torqlink::link::LinkOptions;
///
/// let options = LinkOptions::default()
///     .with_timeout(Duration::from_millis(200))
///     .with_retry_limit(3)
///     .without_mid_parsing(2);
/// assert_eq!(options.timeout, Duration::from_millis(200));
/// assert!(options.disable_mid_parsing.contains(&2));
/// ```
#[derive(Clone, Debug)]
pub struct LinkOptions {
    /// Retransmit interval for unacknowledged writes.
    pub timeout: Duration,
    /// Retransmissions attempted before the write fails with `Timeout`.
    pub retry_limit: u32,
    /// Attach the original framed bytes to every delivered message.
    pub raw_data: bool,
    /// MIDs delivered with raw payloads, bypassing the MID parser.
    pub disable_mid_parsing: HashSet<u16>,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3000),
            retry_limit: 3,
            raw_data: false,
            disable_mid_parsing: HashSet::new(),
        }
    }
}

impl LinkOptions {
    /// Replace the retransmit interval.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the retry budget.
    #[must_use]
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Attach original framed bytes to delivered messages.
    #[must_use]
    pub fn with_raw_data(mut self, raw_data: bool) -> Self {
        self.raw_data = raw_data;
        self
    }

    /// Deliver `mid` with a raw payload, bypassing the MID parser.
    #[must_use]
    pub fn without_mid_parsing(mut self, mid: u16) -> Self {
        self.disable_mid_parsing.insert(mid);
        self
    }
}
