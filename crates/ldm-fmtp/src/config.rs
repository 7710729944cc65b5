// SPDX-License-Identifier: BSD-3-Clause

//! Receiver configuration (spec §6).

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default UDP receive timeout: bounds how long the multicast reader can
/// block before re-checking the shutdown flag (spec §5).
pub const DEFAULT_MCAST_POLL: Duration = Duration::from_millis(200);

/// Default capacity of the retransmission request queue (spec §5).
pub const DEFAULT_RETX_QUEUE_CAPACITY: usize = 4096;

/// Default fixed component of the per-product timeout (spec §4.E).
pub const DEFAULT_BASE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default slack added to the link-speed-scaled timeout (spec §4.E).
pub const DEFAULT_RETX_SLACK: Duration = Duration::from_millis(50);

/// Default transient-UDP-error retry budget before treating the channel as
/// fatal (spec §7).
pub const DEFAULT_UDP_ERROR_BUDGET: u32 = 3;

/// Runtime-settable link speed, shared between the configuration and the
/// Product Timer (spec §4.E, §6: "runtime-settable").
///
/// Stored as bits/sec; `0` means "infinite" (spec §8 boundary behaviour:
/// `link_speed = 0` reduces the timeout formula to `base_timeout_ns` alone).
#[derive(Debug)]
pub struct LinkSpeed(AtomicU64);

impl LinkSpeed {
    #[must_use]
    pub fn new(bits_per_sec: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(bits_per_sec)))
    }

    pub fn set(&self, bits_per_sec: u64) {
        self.0.store(bits_per_sec, Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configuration required to construct an FMTP receiver (spec §6).
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Sender's TCP retransmission endpoint.
    pub retx_addr: SocketAddrV4,
    /// Multicast group address and port carrying the product stream.
    pub mcast_addr: SocketAddrV4,
    /// Local interface used for the IGMP join and the retx socket bind.
    pub iface: Ipv4Addr,
    /// Initial link speed in bits/sec (runtime-settable afterwards).
    pub link_speed_bps: u64,
    /// Base (fixed) component of the per-product timeout.
    pub base_timeout: Duration,
    /// Slack added on top of the link-speed-scaled timeout.
    pub retx_slack: Duration,
    /// Capacity of the bounded retransmission-request queue.
    pub retx_queue_capacity: usize,
    /// Poll interval for the multicast socket's receive timeout.
    pub mcast_poll_interval: Duration,
    /// Consecutive transient UDP errors tolerated before the channel is
    /// declared fatal.
    pub udp_error_budget: u32,
}

impl ReceiverConfig {
    /// Start building a configuration with the given required endpoints.
    #[must_use]
    pub fn builder(retx_addr: SocketAddrV4, mcast_addr: SocketAddrV4, iface: Ipv4Addr) -> ReceiverConfigBuilder {
        ReceiverConfigBuilder {
            retx_addr,
            mcast_addr,
            iface,
            link_speed_bps: 0,
            base_timeout: DEFAULT_BASE_TIMEOUT,
            retx_slack: DEFAULT_RETX_SLACK,
            retx_queue_capacity: DEFAULT_RETX_QUEUE_CAPACITY,
            mcast_poll_interval: DEFAULT_MCAST_POLL,
            udp_error_budget: DEFAULT_UDP_ERROR_BUDGET,
        }
    }
}

/// Builder for [`ReceiverConfig`].
pub struct ReceiverConfigBuilder {
    retx_addr: SocketAddrV4,
    mcast_addr: SocketAddrV4,
    iface: Ipv4Addr,
    link_speed_bps: u64,
    base_timeout: Duration,
    retx_slack: Duration,
    retx_queue_capacity: usize,
    mcast_poll_interval: Duration,
    udp_error_budget: u32,
}

impl ReceiverConfigBuilder {
    #[must_use]
    pub fn link_speed_bps(mut self, bps: u64) -> Self {
        self.link_speed_bps = bps;
        self
    }

    #[must_use]
    pub fn base_timeout(mut self, d: Duration) -> Self {
        self.base_timeout = d;
        self
    }

    #[must_use]
    pub fn retx_slack(mut self, d: Duration) -> Self {
        self.retx_slack = d;
        self
    }

    #[must_use]
    pub fn retx_queue_capacity(mut self, cap: usize) -> Self {
        self.retx_queue_capacity = cap;
        self
    }

    #[must_use]
    pub fn mcast_poll_interval(mut self, d: Duration) -> Self {
        self.mcast_poll_interval = d;
        self
    }

    #[must_use]
    pub fn udp_error_budget(mut self, budget: u32) -> Self {
        self.udp_error_budget = budget;
        self
    }

    pub fn build(self) -> Result<ReceiverConfig> {
        if self.retx_queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "retx_queue_capacity must be non-zero".into(),
            ));
        }
        if !self.mcast_addr.ip().is_multicast() {
            return Err(Error::InvalidConfig(format!(
                "{} is not a multicast address",
                self.mcast_addr.ip()
            )));
        }
        Ok(ReceiverConfig {
            retx_addr: self.retx_addr,
            mcast_addr: self.mcast_addr,
            iface: self.iface,
            link_speed_bps: self.link_speed_bps,
            base_timeout: self.base_timeout,
            retx_slack: self.retx_slack,
            retx_queue_capacity: self.retx_queue_capacity,
            mcast_poll_interval: self.mcast_poll_interval,
            udp_error_budget: self.udp_error_budget,
        })
    }
}
