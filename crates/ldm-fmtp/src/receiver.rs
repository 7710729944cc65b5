// SPDX-License-Identifier: BSD-3-Clause

//! Top-level receiver (spec §5): wires the four worker threads to a single
//! [`ProductTracker`] and owns their lifetime.
//!
//! Grounded on the teacher's top-level `Router`, which the same way owns a
//! set of worker threads behind `start`/`stop` and a `Drop` that doesn't
//! leak; this just has four workers to the Router's one, plus the shared
//! [`FaultLatch`] each worker reports into.

use std::net::TcpStream;
use std::sync::Arc;

use crate::config::{LinkSpeed, ReceiverConfig};
use crate::error::{Error, FaultLatch, Result};
use crate::mcast::MulticastReader;
use crate::metrics::{MetricsSnapshot, ReceiverMetrics};
use crate::notifier::Notifier;
use crate::product::ProductTracker;
use crate::retx::{RetxQueue, RetxReceiver, RetxSender};
use crate::sink::DeliverySink;
use crate::timer::{ProductTimer, TimerHandle};

/// An FMTP v3 receiver: a running multicast/retransmission pipeline feeding
/// a [`ProductTracker`] (spec §1, §5).
///
/// Dropping a `Receiver` without calling [`Receiver::stop`] still shuts down
/// cleanly — every worker's own `Drop` joins its thread — but `stop` is the
/// only way to retrieve the first fatal error, if any, and to run the
/// Tracker's orderly-abandonment pass before the threads go away.
pub struct Receiver {
    tracker: Arc<ProductTracker>,
    metrics: Arc<ReceiverMetrics>,
    link_speed: Arc<LinkSpeed>,
    fault: Arc<FaultLatch>,
    mcast: MulticastReader,
    retx_sender: RetxSender,
    retx_receiver: RetxReceiver,
    timer: ProductTimer,
}

impl Receiver {
    /// Connect the retransmission sidechannel, join the multicast group, and
    /// start all four worker threads (spec §5).
    pub fn start(
        config: ReceiverConfig,
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn DeliverySink>,
    ) -> Result<Self> {
        let metrics = Arc::new(ReceiverMetrics::new());
        let link_speed = LinkSpeed::new(config.link_speed_bps);
        let fault = Arc::new(FaultLatch::new());
        let retx_queue = Arc::new(RetxQueue::new(config.retx_queue_capacity));

        let timer_handle = TimerHandle::new(Arc::clone(&link_speed), config.base_timeout, config.retx_slack);

        let tracker = Arc::new(ProductTracker::new(
            notifier,
            sink,
            Arc::clone(&metrics),
            Arc::clone(&retx_queue),
            timer_handle.clone(),
        ));

        let retx_stream = TcpStream::connect(config.retx_addr).map_err(Error::RetxConnectFailed)?;
        let retx_stream_rx = retx_stream.try_clone().map_err(Error::RetxConnectFailed)?;

        let mcast = MulticastReader::spawn(config.clone(), Arc::clone(&tracker), Arc::clone(&fault))?;
        let retx_receiver = RetxReceiver::spawn(retx_stream_rx, Arc::clone(&tracker), Arc::clone(&fault));
        let retx_sender = RetxSender::spawn(
            retx_stream,
            Arc::clone(&retx_queue),
            Arc::clone(&fault),
            config.mcast_poll_interval,
        );
        let timer = ProductTimer::spawn(&timer_handle, Arc::clone(&tracker), Arc::clone(&fault));

        Ok(Self {
            tracker,
            metrics,
            link_speed,
            fault,
            mcast,
            retx_sender,
            retx_receiver,
            timer,
        })
    }

    /// Update the runtime-settable link speed used to scale per-product
    /// timeouts (spec §4.E, §6).
    pub fn set_link_speed_bps(&self, bps: u64) {
        self.link_speed.set(bps);
    }

    #[must_use]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    #[must_use]
    pub fn live_product_count(&self) -> usize {
        self.tracker.live_product_count()
    }

    /// `true` once a worker has reported a fatal fault; [`Receiver::stop`]
    /// surfaces it.
    #[must_use]
    pub fn has_faulted(&self) -> bool {
        self.fault.is_set()
    }

    /// Orderly shutdown (spec §5): abandon every live product, then stop the
    /// workers in dependency order — Multicast Reader and Retx Receiver
    /// first since they are the only sources of new tracker work, then the
    /// Retx Sender which depends on the queue they may have just pushed
    /// into, then the Product Timer last since it can fire for entries the
    /// shutdown pass already abandoned (a no-op tracker call at that point).
    /// Returns the first fatal error any worker reported, if any.
    pub fn stop(self) -> Option<Error> {
        self.tracker.shutdown();
        self.mcast.stop();
        self.retx_receiver.stop();
        self.retx_sender.stop();
        self.timer.stop();
        self.fault.take()
    }
}
