// SPDX-License-Identifier: BSD-3-Clause

//! Error type for the FMTP receiver.
//!
//! Mirrors the error categories of spec §7: configuration failures are
//! distinct from transport failures, which are distinct from protocol-level
//! violations. Most per-packet problems (malformed header, stale segment)
//! are handled by counting and dropping rather than by `Result` — this enum
//! is for failures that abort a product or the whole receiver.

use std::fmt;
use std::net::AddrParseError;

use parking_lot::Mutex;

/// Errors returned by FMTP receiver operations.
#[derive(Debug)]
pub enum Error {
    /// A configuration field was missing or out of range.
    InvalidConfig(String),
    /// A socket address failed to parse.
    AddrParse(AddrParseError),
    /// Binding or joining the multicast socket failed.
    MulticastJoinFailed(std::io::Error),
    /// Connecting to the retransmission endpoint failed.
    RetxConnectFailed(std::io::Error),
    /// The retransmission TCP channel failed on read or write.
    ///
    /// Per spec §7 this is always fatal: the receiver shuts down.
    RetxChannelError(std::io::Error),
    /// The multicast socket failed outside the configured retry budget.
    MulticastChannelError(std::io::Error),
    /// A worker thread panicked; its name is carried for diagnostics.
    WorkerPanicked(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid receiver configuration: {msg}"),
            Error::AddrParse(e) => write!(f, "invalid socket address: {e}"),
            Error::MulticastJoinFailed(e) => write!(f, "failed to join multicast group: {e}"),
            Error::RetxConnectFailed(e) => write!(f, "failed to connect retx channel: {e}"),
            Error::RetxChannelError(e) => write!(f, "retx TCP channel failed: {e}"),
            Error::MulticastChannelError(e) => write!(f, "multicast UDP channel failed: {e}"),
            Error::WorkerPanicked(name) => write!(f, "receiver thread '{name}' panicked"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::AddrParse(e) => Some(e),
            Error::MulticastJoinFailed(e)
            | Error::RetxConnectFailed(e)
            | Error::RetxChannelError(e)
            | Error::MulticastChannelError(e) => Some(e),
            Error::InvalidConfig(_) | Error::WorkerPanicked(_) => None,
        }
    }
}

impl From<AddrParseError> for Error {
    fn from(e: AddrParseError) -> Self {
        Error::AddrParse(e)
    }
}

/// Result alias for fallible FMTP receiver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Join a worker thread, latching a [`Error::WorkerPanicked`] fault if it
/// exited via panic rather than returning normally (spec §7: a fatal worker
/// condition must surface through `stop()`/the fault latch, panics
/// included). A no-op beyond the join itself if `fault` already latched
/// something else — `FaultLatch::report` is first-writer-wins.
pub fn join_worker(handle: std::thread::JoinHandle<()>, name: &'static str, fault: &FaultLatch) {
    if handle.join().is_err() {
        fault.report(Error::WorkerPanicked(name));
    }
}

/// First-writer-wins slot for the fatal error that caused a worker thread to
/// exit (spec §9 design note: replaces the original implementation's
/// exception-pointer cancellation with a plain shared slot the `Receiver`
/// consults on `stop`/`join`).
#[derive(Default)]
pub struct FaultLatch {
    slot: Mutex<Option<Error>>,
}

impl FaultLatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `err` unless a fault was already latched.
    pub fn report(&self, err: Error) {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Take the latched error, if any, leaving the slot empty.
    pub fn take(&self) -> Option<Error> {
        self.slot.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_report_wins() {
        let latch = FaultLatch::new();
        latch.report(Error::WorkerPanicked("mcast"));
        latch.report(Error::WorkerPanicked("retx"));
        match latch.take() {
            Some(Error::WorkerPanicked(name)) => assert_eq!(name, "mcast"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(latch.take().is_none());
    }
}
