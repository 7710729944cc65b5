// SPDX-License-Identifier: BSD-3-Clause

//! Retx Receiver thread (spec §4.B–C, §5): reads retransmitted BOP/DATA/EOP
//! frames and `RETX_END` notices off the TCP sidechannel and feeds them into
//! the [`ProductTracker`] via its retx-path entry points.

use std::io::{self, Read};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{join_worker, Error, FaultLatch};
use crate::product::ProductTracker;
use crate::wire::{FmtpHeader, FLAG_RETX_END, HEADER_LEN, MAX_PAYLOAD};

/// Owns the Retx Receiver's worker thread.
pub struct RetxReceiver {
    stop_flag: Arc<AtomicBool>,
    fault: Arc<FaultLatch>,
    /// A clone of the worker's stream, kept only to `shutdown(Read)` it from
    /// the control thread (spec §5): the worker blocks in `read_exact` with
    /// no read timeout, so flipping `stop_flag` alone never unblocks it.
    shutdown_stream: TcpStream,
    handle: Option<JoinHandle<()>>,
}

impl RetxReceiver {
    pub fn spawn(mut stream: TcpStream, tracker: Arc<ProductTracker>, fault: Arc<FaultLatch>) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_worker = Arc::clone(&stop_flag);
        let fault_worker = Arc::clone(&fault);
        let shutdown_stream = stream.try_clone().expect("clone retx stream for shutdown handle");

        let handle = thread::Builder::new()
            .name("fmtp-retx-receiver".into())
            .spawn(move || {
                let mut header_buf = [0u8; HEADER_LEN];
                let mut payload_buf = vec![0u8; MAX_PAYLOAD];
                while !stop_flag_worker.load(Ordering::Relaxed) {
                    match read_frame(&mut stream, &mut header_buf, &mut payload_buf) {
                        Ok(Some((header, len))) => {
                            if header.flags == FLAG_RETX_END {
                                tracker.on_retx_end(header.prodindex);
                            } else {
                                tracker.on_retx_packet(header, &payload_buf[..len]);
                            }
                        }
                        Ok(None) => {
                            log::info!("retx connection closed by peer");
                            break;
                        }
                        Err(e) => {
                            if stop_flag_worker.load(Ordering::Relaxed) {
                                // Shutdown-induced read error on the way out; not a fault.
                                break;
                            }
                            log::warn!("retx receiver read failed: {e}");
                            fault_worker.report(Error::RetxChannelError(e));
                            break;
                        }
                    }
                }
                stop_flag_worker.store(true, Ordering::Relaxed);
                log::debug!("retx receiver thread exiting");
            })
            .expect("failed to spawn fmtp-retx-receiver thread");

        Self {
            stop_flag,
            fault,
            shutdown_stream,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        let _ = self.shutdown_stream.shutdown(Shutdown::Both);
        if let Some(handle) = self.handle.take() {
            join_worker(handle, "fmtp-retx-receiver", &self.fault);
        }
    }
}

impl Drop for RetxReceiver {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        let _ = self.shutdown_stream.shutdown(Shutdown::Both);
        if let Some(handle) = self.handle.take() {
            join_worker(handle, "fmtp-retx-receiver", &self.fault);
        }
    }
}

/// Read one frame: a 16-byte header followed by `header.payload_len` bytes
/// of payload (spec §3: the header's `payload_len` field doubles as the
/// sidechannel's own framing length for every flag, including `RETX_END`
/// which carries zero). Returns `Ok(None)` on a clean EOF between frames.
fn read_frame<'a>(
    stream: &mut TcpStream,
    header_buf: &mut [u8; HEADER_LEN],
    payload_buf: &'a mut [u8],
) -> io::Result<Option<(FmtpHeader, usize)>> {
    if let Err(e) = stream.read_exact(header_buf) {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            return Ok(None);
        }
        return Err(e);
    }
    let header = FmtpHeader::decode(header_buf).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "malformed retx frame header")
    })?;
    let len = header.payload_len as usize;
    if len > payload_buf.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "retx frame payload exceeds MTU",
        ));
    }
    if len > 0 {
        stream.read_exact(&mut payload_buf[..len])?;
    }
    Ok(Some((header, len)))
}
