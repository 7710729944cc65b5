// SPDX-License-Identifier: BSD-3-Clause

//! Receiver metrics: lock-free atomic counters for observability.
//!
//! Spec §2 drops the original `Measure` member as a named module but keeps
//! an ambient counters surface, the way the teacher's `ReliableMetrics`
//! instruments its own reliability protocol.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of [`ReceiverMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_received: u64,
    pub malformed_dropped: u64,
    pub bop_req_sent: u64,
    pub data_req_sent: u64,
    pub eop_req_sent: u64,
    pub retx_end_sent: u64,
    pub retx_end_received: u64,
    pub retx_queue_overflow_drops: u64,
    pub products_delivered: u64,
    pub products_abandoned: u64,
    pub products_discarded: u64,
}

/// Thread-safe atomic counters for the FMTP receiver.
#[derive(Debug, Default)]
pub struct ReceiverMetrics {
    packets_received: AtomicU64,
    malformed_dropped: AtomicU64,
    bop_req_sent: AtomicU64,
    data_req_sent: AtomicU64,
    eop_req_sent: AtomicU64,
    retx_end_sent: AtomicU64,
    retx_end_received: AtomicU64,
    retx_queue_overflow_drops: AtomicU64,
    products_delivered: AtomicU64,
    products_abandoned: AtomicU64,
    products_discarded: AtomicU64,
}

macro_rules! counter_methods {
    ($($field:ident => $inc:ident),+ $(,)?) => {
        $(
            #[inline]
            pub fn $inc(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )+
    };
}

impl ReceiverMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    counter_methods!(
        packets_received => record_packet_received,
        malformed_dropped => record_malformed_dropped,
        bop_req_sent => record_bop_req_sent,
        data_req_sent => record_data_req_sent,
        eop_req_sent => record_eop_req_sent,
        retx_end_sent => record_retx_end_sent,
        retx_end_received => record_retx_end_received,
        retx_queue_overflow_drops => record_queue_overflow_drop,
        products_delivered => record_product_delivered,
        products_abandoned => record_product_abandoned,
        products_discarded => record_product_discarded,
    );

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            malformed_dropped: self.malformed_dropped.load(Ordering::Relaxed),
            bop_req_sent: self.bop_req_sent.load(Ordering::Relaxed),
            data_req_sent: self.data_req_sent.load(Ordering::Relaxed),
            eop_req_sent: self.eop_req_sent.load(Ordering::Relaxed),
            retx_end_sent: self.retx_end_sent.load(Ordering::Relaxed),
            retx_end_received: self.retx_end_received.load(Ordering::Relaxed),
            retx_queue_overflow_drops: self.retx_queue_overflow_drops.load(Ordering::Relaxed),
            products_delivered: self.products_delivered.load(Ordering::Relaxed),
            products_abandoned: self.products_abandoned.load(Ordering::Relaxed),
            products_discarded: self.products_discarded.load(Ordering::Relaxed),
        }
    }
}
