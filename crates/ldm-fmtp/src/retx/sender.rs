// SPDX-License-Identifier: BSD-3-Clause

//! Retx Sender thread (spec §5): drains the [`RetxQueue`] and writes each
//! request as a 16-byte frame to the sender's retransmission TCP
//! connection. Grounded on the teacher's `Router` thread-lifecycle pattern
//! (`engine/router.rs`): an `Arc<AtomicBool>` stop flag, an `Option<JoinHandle<()>>`,
//! and a `Drop` impl that joins rather than leaking the thread.

use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{join_worker, Error, FaultLatch};

use super::request::RetxQueue;

/// Owns the Retx Sender's worker thread.
pub struct RetxSender {
    stop_flag: Arc<AtomicBool>,
    fault: Arc<FaultLatch>,
    handle: Option<JoinHandle<()>>,
}

impl RetxSender {
    /// Spawn the sender thread against an already-connected socket. `stream`
    /// should be a clone of the same TCP connection the [`super::RetxReceiver`]
    /// reads from (spec §4.B: one bidirectional sidechannel).
    pub fn spawn(
        mut stream: TcpStream,
        queue: Arc<RetxQueue>,
        fault: Arc<FaultLatch>,
        poll_timeout: Duration,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_worker = Arc::clone(&stop_flag);
        let fault_worker = Arc::clone(&fault);

        let handle = thread::Builder::new()
            .name("fmtp-retx-sender".into())
            .spawn(move || {
                while !stop_flag_worker.load(Ordering::Relaxed) {
                    let Some(req) = queue.pop_timeout(poll_timeout) else {
                        continue;
                    };
                    let frame = req.to_header().encode();
                    if let Err(e) = stream.write_all(&frame) {
                        log::warn!("retx sender write failed: {e}");
                        fault_worker.report(Error::RetxChannelError(e));
                        stop_flag_worker.store(true, Ordering::Relaxed);
                        break;
                    }
                }
                log::debug!("retx sender thread exiting");
            })
            .expect("failed to spawn fmtp-retx-sender thread");

        Self {
            stop_flag,
            fault,
            handle: Some(handle),
        }
    }

    /// Signal shutdown and join the worker thread.
    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            join_worker(handle, "fmtp-retx-sender", &self.fault);
        }
    }
}

impl Drop for RetxSender {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            join_worker(handle, "fmtp-retx-sender", &self.fault);
        }
    }
}
