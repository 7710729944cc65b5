// SPDX-License-Identifier: BSD-3-Clause

//! Multicast Reader thread (spec §4.A, §5): joins the product-stream
//! multicast group, polls with a bounded receive timeout so it can observe
//! shutdown promptly, and feeds decoded packets into the [`ProductTracker`].
//!
//! Socket setup is grounded on the teacher's `transport/udp.rs` (SO_REUSEADDR
//! via `socket2` before bind) and `transport/multicast.rs` (`join_multicast_v4`
//! on the configured interface).

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use socket2::{Domain, Socket, Type};

use crate::config::ReceiverConfig;
use crate::error::{join_worker, Error, FaultLatch, Result};
use crate::product::ProductTracker;
use crate::wire::{FmtpHeader, HEADER_LEN, MTU};

fn bind_multicast_socket(config: &ReceiverConfig) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, None).map_err(Error::MulticastJoinFailed)?;
    socket.set_reuse_address(true).map_err(Error::MulticastJoinFailed)?;
    let bind_addr = std::net::SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, config.mcast_addr.port());
    socket.bind(&bind_addr.into()).map_err(Error::MulticastJoinFailed)?;

    let socket: UdpSocket = socket.into();
    socket
        .join_multicast_v4(config.mcast_addr.ip(), &config.iface)
        .map_err(Error::MulticastJoinFailed)?;
    socket
        .set_read_timeout(Some(config.mcast_poll_interval))
        .map_err(Error::MulticastJoinFailed)?;
    Ok(socket)
}

/// Owns the Multicast Reader's worker thread.
pub struct MulticastReader {
    stop_flag: Arc<AtomicBool>,
    fault: Arc<FaultLatch>,
    handle: Option<JoinHandle<()>>,
}

impl MulticastReader {
    pub fn spawn(config: ReceiverConfig, tracker: Arc<ProductTracker>, fault: Arc<FaultLatch>) -> Result<Self> {
        let socket = bind_multicast_socket(&config)?;
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_worker = Arc::clone(&stop_flag);
        let error_budget = config.udp_error_budget;
        let fault_worker = Arc::clone(&fault);

        let handle = thread::Builder::new()
            .name("fmtp-mcast-reader".into())
            .spawn(move || {
                let mut buf = vec![0u8; MTU];
                let mut consecutive_errors = 0u32;
                while !stop_flag_worker.load(Ordering::Relaxed) {
                    match socket.recv_from(&mut buf) {
                        Ok((len, _src)) => {
                            consecutive_errors = 0;
                            dispatch_packet(&tracker, &buf[..len]);
                        }
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                            continue;
                        }
                        Err(e) => {
                            consecutive_errors += 1;
                            log::warn!("multicast recv error ({consecutive_errors}/{error_budget}): {e}");
                            if consecutive_errors >= error_budget {
                                fault_worker.report(Error::MulticastChannelError(e));
                                break;
                            }
                        }
                    }
                }
                stop_flag_worker.store(true, Ordering::Relaxed);
                log::debug!("multicast reader thread exiting");
            })
            .expect("failed to spawn fmtp-mcast-reader thread");

        Ok(Self {
            stop_flag,
            fault,
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            join_worker(handle, "fmtp-mcast-reader", &self.fault);
        }
    }
}

impl Drop for MulticastReader {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            join_worker(handle, "fmtp-mcast-reader", &self.fault);
        }
    }
}

fn dispatch_packet(tracker: &ProductTracker, packet: &[u8]) {
    if packet.len() < HEADER_LEN {
        log::debug!("dropping undersized multicast packet ({} bytes)", packet.len());
        tracker.record_malformed_dropped();
        return;
    }
    let Some(header) = FmtpHeader::decode(packet) else {
        tracker.record_malformed_dropped();
        return;
    };
    let payload = &packet[HEADER_LEN..];
    if payload.len() != header.payload_len as usize {
        log::debug!(
            "dropping multicast packet with payload_len mismatch: header says {}, got {}",
            header.payload_len,
            payload.len()
        );
        tracker.record_malformed_dropped();
        return;
    }
    tracker.on_mcast_packet(header, payload);
}
