// SPDX-License-Identifier: BSD-3-Clause

//! Product Tracker (spec §4, §5): the single piece of mutable state shared
//! by the Multicast Reader, Retx Receiver, and Product Timer threads.
//!
//! One `parking_lot::Mutex` serializes every mutation (spec §5: "single
//! mutex serializing tracker mutations"). Everything that is not state —
//! notifier callbacks, delivery-sink calls, retransmission-queue pushes — is
//! done with the lock released, grounded on the teacher's `Router` pattern
//! of keeping its `state` mutex narrowly scoped around the HashMap it
//! actually guards (`engine/router.rs`).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::metrics::ReceiverMetrics;
use crate::notifier::{BopDecision, Notifier};
use crate::retx::{PushOutcome, RetxQueue, RetxRequest};
use crate::sink::DeliverySink;
use crate::wire::{prodindex_after, BopPayload, FmtpHeader};

use super::entry::ProductEntry;

/// Seam between the Tracker and the Product Timer: arming and disarming
/// per-product deadlines without the Tracker depending on the Timer's
/// internal heap (spec §9 design note: a channel, not a back-pointer).
pub trait DeadlineSink: Send + Sync {
    /// Arm (or re-arm) a deadline for `prodindex`. `prodsize` is `0` for a
    /// Missing-BOP placeholder, where only the base timeout applies.
    fn arm(&self, prodindex: u32, prodsize: u32);
    /// Cancel a previously armed deadline. A no-op if none is armed.
    fn disarm(&self, prodindex: u32);
}

/// A [`DeadlineSink`] that does nothing — useful for tests that exercise
/// the Tracker without a running Product Timer.
#[derive(Debug, Default)]
pub struct NullDeadlineSink;

impl DeadlineSink for NullDeadlineSink {
    fn arm(&self, _prodindex: u32, _prodsize: u32) {}
    fn disarm(&self, _prodindex: u32) {}
}

struct TrackerState {
    entries: HashMap<u32, ProductEntry>,
    /// Product indexes known to exist (a gap was observed, or DATA arrived
    /// for them) whose BOP has not yet arrived (spec §4.D, §7 "BOP loss").
    missing_bop: HashSet<u32>,
    /// Highest `prodindex` observed so far, wraparound-compared via
    /// [`prodindex_after`]. `None` before the first packet.
    highest_seen: Option<u32>,
}

/// Central reassembly state machine (spec §4).
pub struct ProductTracker {
    state: Mutex<TrackerState>,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn DeliverySink>,
    metrics: Arc<ReceiverMetrics>,
    retx_queue: Arc<RetxQueue>,
    deadline_sink: Arc<dyn DeadlineSink>,
    /// Set once [`ProductTracker::shutdown`] has run, so late callers don't
    /// re-enter a torn-down tracker (spec §5).
    shut_down: AtomicU32,
}

/// Where a packet came from, which governs whether processing it may enqueue
/// new retransmission requests (spec §4.D: the retx path must never
/// re-trigger retransmission of what it is itself retransmitting).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketSource {
    Multicast,
    Retransmission,
}

impl ProductTracker {
    #[must_use]
    pub fn new(
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn DeliverySink>,
        metrics: Arc<ReceiverMetrics>,
        retx_queue: Arc<RetxQueue>,
        deadline_sink: Arc<dyn DeadlineSink>,
    ) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                entries: HashMap::new(),
                missing_bop: HashSet::new(),
                highest_seen: None,
            }),
            notifier,
            sink,
            metrics,
            retx_queue,
            deadline_sink,
            shut_down: AtomicU32::new(0),
        }
    }

    fn push_request(&self, req: RetxRequest) {
        match self.retx_queue.push(req) {
            PushOutcome::Enqueued => {}
            PushOutcome::EnqueuedAfterEviction(_) => {
                self.metrics.record_queue_overflow_drop();
            }
        }
        match req {
            RetxRequest::Bop { .. } => self.metrics.record_bop_req_sent(),
            RetxRequest::Data { .. } => self.metrics.record_data_req_sent(),
            RetxRequest::Eop { .. } => self.metrics.record_eop_req_sent(),
            RetxRequest::End { .. } => self.metrics.record_retx_end_sent(),
        }
    }

    /// `true` if `prodindex` is new (ahead of `highest_seen`, or the first
    /// packet ever seen) or already known-pending (its BOP is outstanding).
    /// `false` means it is behind the tracker's high-water mark and not
    /// pending — a stale duplicate from a product already resolved (spec §7:
    /// "stale/duplicate" packets are dropped, not reopened).
    fn is_new_or_pending(state: &TrackerState, prodindex: u32) -> bool {
        let ahead = match state.highest_seen {
            Some(highest) => prodindex_after(prodindex, highest),
            None => true,
        };
        ahead || state.missing_bop.contains(&prodindex)
    }

    /// Record that `prodindex` has been observed (by BOP or by DATA
    /// preceding its BOP), requesting a `BOP_REQ` for every prodindex
    /// skipped since `highest_seen` (spec §4.D: "ordered BOP_REQs" for an
    /// index gap).
    fn note_prodindex_seen(&self, state: &mut TrackerState, prodindex: u32, source: PacketSource) {
        let Some(highest) = state.highest_seen else {
            state.highest_seen = Some(prodindex);
            return;
        };
        if !prodindex_after(prodindex, highest) {
            return;
        }
        if source == PacketSource::Multicast {
            let mut gap = highest.wrapping_add(1);
            while gap != prodindex {
                if state.missing_bop.insert(gap) {
                    self.deadline_sink.arm(gap, 0);
                    self.push_request(RetxRequest::Bop { prodindex: gap });
                }
                gap = gap.wrapping_add(1);
            }
        }
        state.highest_seen = Some(prodindex);
    }

    /// Multicast Reader entry point (spec §4.A–C).
    pub fn on_mcast_packet(&self, header: FmtpHeader, payload: &[u8]) {
        self.metrics.record_packet_received();
        self.dispatch(header, payload, PacketSource::Multicast);
    }

    /// Retx Receiver entry point: frames arriving over the TCP sidechannel
    /// in response to a prior request (spec §4.B). Never enqueues further
    /// requests.
    pub fn on_retx_packet(&self, header: FmtpHeader, payload: &[u8]) {
        self.dispatch(header, payload, PacketSource::Retransmission);
    }

    fn dispatch(&self, header: FmtpHeader, payload: &[u8], source: PacketSource) {
        if !header.is_known_data_flag() {
            self.metrics.record_malformed_dropped();
            log::debug!("dropping packet with unknown flags {:#04x}", header.flags);
            return;
        }
        if header.is_bop() {
            self.handle_bop(header, payload, source);
        } else if header.is_data() {
            self.handle_data(header, payload, source);
        } else {
            self.handle_eop(header, source);
        }
    }

    fn handle_bop(&self, header: FmtpHeader, payload: &[u8], source: PacketSource) {
        let Some(bop) = BopPayload::decode(payload) else {
            self.metrics.record_malformed_dropped();
            log::debug!("malformed BOP payload for prodindex {}", header.prodindex);
            return;
        };

        let mut delivery = None;
        {
            let mut state = self.state.lock();
            if state.entries.contains_key(&header.prodindex) {
                log::debug!("duplicate BOP for prodindex {}", header.prodindex);
                return;
            }
            if !Self::is_new_or_pending(&state, header.prodindex) {
                log::debug!("stale BOP for prodindex {}, ignoring", header.prodindex);
                return;
            }
            self.note_prodindex_seen(&mut state, header.prodindex, source);
            state.missing_bop.remove(&header.prodindex);

            let decision = self.notifier.on_bop(header.prodindex, bop.prodsize, &bop.metadata);
            let buffer = match decision {
                BopDecision::Accept(mut buf) => {
                    buf.resize(bop.prodsize as usize, 0);
                    Some(buf)
                }
                BopDecision::Reject => {
                    self.metrics.record_product_discarded();
                    None
                }
            };

            let now = Instant::now();
            let mut entry = ProductEntry::new(header.prodindex, bop.prodsize, bop.segment_len, buffer, bop.metadata, now);
            if entry.is_complete() {
                // A zero-segment product whose BOP alone already satisfies
                // completeness cannot happen (EOP is always distinct), but
                // guard it anyway for the empty-product edge case (spec §8).
                delivery = self.take_delivery(&mut entry);
            }
            self.deadline_sink.arm(header.prodindex, bop.prodsize);
            if delivery.is_none() {
                state.entries.insert(header.prodindex, entry);
            }
        }
        self.finish_delivery(delivery);
    }

    fn handle_data(&self, header: FmtpHeader, payload: &[u8], source: PacketSource) {
        let mut delivery = None;
        let mut to_request: Vec<RetxRequest> = Vec::new();
        {
            let mut state = self.state.lock();
            let Some(entry) = state.entries.get_mut(&header.prodindex) else {
                self.handle_data_without_entry(&mut state, header, source);
                return;
            };

            let Some(idx) = entry.segment_index_for_seqnum(header.seqnum) else {
                self.metrics.record_malformed_dropped();
                log::debug!(
                    "malformed/out-of-range DATA seqnum {} for prodindex {}",
                    header.seqnum,
                    header.prodindex
                );
                return;
            };
            if header.payload_len as usize != payload.len() {
                self.metrics.record_malformed_dropped();
                return;
            }

            let first = entry.bitmap.claim(idx);
            if first {
                if let Some((start, end)) = entry.segment_range(idx) {
                    if let Some(buf) = entry.buffer.as_mut() {
                        buf[start..end].copy_from_slice(payload);
                    }
                }
            }

            if source == PacketSource::Multicast && !entry.is_discard() {
                let edge = entry.bitmap.contiguous_edge();
                for j in edge..idx {
                    if entry.should_request(j) {
                        if let Some((start, end)) = entry.segment_range(j) {
                            entry.mark_requested(j);
                            to_request.push(RetxRequest::Data {
                                prodindex: header.prodindex,
                                seqnum: start as u32,
                                payload_len: (end - start) as u16,
                            });
                        }
                    }
                }
            }

            if entry.is_complete() {
                delivery = self.take_delivery(entry);
                state.entries.remove(&header.prodindex);
            }
        }
        for req in to_request {
            self.push_request(req);
        }
        self.finish_delivery(delivery);
    }

    /// DATA arrived for a product with no open entry: either its BOP was
    /// lost, its BOP has not yet arrived (racing UDP reordering), or it has
    /// already been delivered/abandoned and this is a stale duplicate (spec
    /// §7 "BOP loss").
    fn handle_data_without_entry(&self, state: &mut TrackerState, header: FmtpHeader, source: PacketSource) {
        if source != PacketSource::Multicast {
            return;
        }
        if !Self::is_new_or_pending(state, header.prodindex) {
            log::debug!("stale DATA for prodindex {}, ignoring", header.prodindex);
            return;
        }
        self.note_prodindex_seen(state, header.prodindex, source);
        if state.missing_bop.insert(header.prodindex) {
            self.deadline_sink.arm(header.prodindex, 0);
            self.push_request(RetxRequest::Bop {
                prodindex: header.prodindex,
            });
        }
    }

    fn handle_eop(&self, header: FmtpHeader, source: PacketSource) {
        let mut delivery = None;
        let mut to_request: Vec<RetxRequest> = Vec::new();
        {
            let mut state = self.state.lock();
            let Some(entry) = state.entries.get_mut(&header.prodindex) else {
                log::debug!("EOP for unknown prodindex {}", header.prodindex);
                return;
            };
            entry.eop_seen = true;

            if source == PacketSource::Multicast && !entry.is_discard() {
                let missing: Vec<usize> = entry.bitmap.missing().collect();
                for j in missing {
                    if entry.should_request(j) {
                        if let Some((start, end)) = entry.segment_range(j) {
                            entry.mark_requested(j);
                            to_request.push(RetxRequest::Data {
                                prodindex: header.prodindex,
                                seqnum: start as u32,
                                payload_len: (end - start) as u16,
                            });
                        }
                    }
                }
            }

            if entry.is_complete() {
                delivery = self.take_delivery(entry);
                state.entries.remove(&header.prodindex);
            }
        }
        for req in to_request {
            self.push_request(req);
        }
        self.finish_delivery(delivery);
    }

    /// Sender has no retransmission available for this product (spec §4.C).
    /// Abandons it outright, on either the multicast or retx wire.
    pub fn on_retx_end(&self, prodindex: u32) {
        self.metrics.record_retx_end_received();
        let (abandoned, was_missing) = {
            let mut state = self.state.lock();
            let was_missing = state.missing_bop.remove(&prodindex);
            (state.entries.remove(&prodindex), was_missing)
        };
        self.deadline_sink.disarm(prodindex);
        if let Some(entry) = abandoned {
            self.metrics.record_product_abandoned();
            if !entry.is_discard() {
                self.notifier.on_missed(prodindex);
            }
        } else if was_missing {
            self.notifier.on_missed(prodindex);
        }
    }

    /// Product Timer callback: `prodindex`'s deadline has elapsed (spec
    /// §4.E). A no-op if the product completed or was abandoned in the
    /// race between the Timer firing and this call taking the lock.
    /// Abandoning a still-outstanding product enqueues a `RETX_END` to tell
    /// the sender its window state for `prodindex` can be released.
    pub fn on_timer_expired(&self, prodindex: u32) {
        let outcome = {
            let mut state = self.state.lock();
            if let Some(entry) = state.entries.remove(&prodindex) {
                Some(entry.is_discard())
            } else if state.missing_bop.remove(&prodindex) {
                Some(false)
            } else {
                None
            }
        };
        match outcome {
            Some(is_discard) => {
                self.metrics.record_product_abandoned();
                self.push_request(RetxRequest::End { prodindex });
                if !is_discard {
                    self.notifier.on_missed(prodindex);
                }
            }
            None => {
                log::debug!("timer fired for already-resolved prodindex {prodindex}");
            }
        }
    }

    /// Abandon every live product (spec §5: orderly shutdown). Called once,
    /// from the `Receiver`'s stop sequence.
    pub fn shutdown(&self) {
        if self.shut_down.swap(1, Ordering::AcqRel) != 0 {
            return;
        }
        let (entries, missing) = {
            let mut state = self.state.lock();
            (
                std::mem::take(&mut state.entries),
                std::mem::take(&mut state.missing_bop),
            )
        };
        for (prodindex, entry) in entries {
            self.deadline_sink.disarm(prodindex);
            if !entry.is_discard() {
                self.notifier.on_missed(prodindex);
            }
        }
        for prodindex in missing {
            self.deadline_sink.disarm(prodindex);
            self.notifier.on_missed(prodindex);
        }
        self.retx_queue.wake_all();
    }

    /// Extract the completed product's bytes and metadata for delivery
    /// outside the lock. Returns `None` for a discard entry (nothing to
    /// deliver, but still counted).
    fn take_delivery(&self, entry: &mut ProductEntry) -> Option<(u32, Vec<u8>, Vec<u8>)> {
        self.deadline_sink.disarm(entry.prodindex);
        self.metrics.record_product_delivered();
        entry
            .buffer
            .take()
            .map(|bytes| (entry.prodindex, std::mem::take(&mut entry.metadata), bytes))
    }

    fn finish_delivery(&self, delivery: Option<(u32, Vec<u8>, Vec<u8>)>) {
        if let Some((prodindex, metadata, bytes)) = delivery {
            self.sink.accept(prodindex, &metadata, &bytes);
            self.notifier.on_delivery(prodindex, bytes);
        }
    }

    #[must_use]
    pub fn live_product_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Count a packet dropped before header/flag dispatch (spec §7), e.g. by
    /// the Multicast Reader rejecting an undersized or length-mismatched
    /// datagram.
    pub fn record_malformed_dropped(&self) {
        self.metrics.record_malformed_dropped();
    }

    #[must_use]
    pub fn metrics_snapshot(&self) -> crate::metrics::MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::ClosureNotifier;
    use crate::sink::NullSink;
    use crate::wire::{FLAG_BOP, FLAG_DATA, FLAG_EOP};
    use parking_lot::Mutex as PLMutex;
    use std::sync::Arc as StdArc;

    fn tracker_with(
        delivered: StdArc<PLMutex<Vec<(u32, Vec<u8>)>>>,
        missed: StdArc<PLMutex<Vec<u32>>>,
    ) -> ProductTracker {
        let d = delivered.clone();
        let m = missed.clone();
        let notifier = StdArc::new(ClosureNotifier::new(
            |_prodindex, _prodsize, _meta: &[u8]| BopDecision::Accept(Vec::new()),
            move |prodindex, bytes| d.lock().push((prodindex, bytes)),
            move |prodindex| m.lock().push(prodindex),
        ));
        ProductTracker::new(
            notifier,
            StdArc::new(NullSink),
            StdArc::new(ReceiverMetrics::new()),
            StdArc::new(RetxQueue::new(64)),
            StdArc::new(NullDeadlineSink),
        )
    }

    fn bop(prodindex: u32, prodsize: u32, segment_len: u16) -> (FmtpHeader, Vec<u8>) {
        let payload = BopPayload::new(prodsize, segment_len, Vec::new()).encode();
        (FmtpHeader::new(prodindex, 0, payload.len() as u16, FLAG_BOP), payload)
    }

    #[test]
    fn clean_delivery_of_a_single_segment_product() {
        let delivered = StdArc::new(PLMutex::new(Vec::new()));
        let missed = StdArc::new(PLMutex::new(Vec::new()));
        let tracker = tracker_with(delivered.clone(), missed);

        let (hdr, payload) = bop(1, 4, 4);
        tracker.on_mcast_packet(hdr, &payload);
        tracker.on_mcast_packet(FmtpHeader::new(1, 0, 4, FLAG_DATA), b"abcd");
        tracker.on_mcast_packet(FmtpHeader::new(1, 0, 0, FLAG_EOP), &[]);

        let d = delivered.lock();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0], (1, b"abcd".to_vec()));
        assert_eq!(tracker.live_product_count(), 0);
    }

    #[test]
    fn missing_segment_is_requested_and_recovered_via_retx() {
        let delivered = StdArc::new(PLMutex::new(Vec::new()));
        let missed = StdArc::new(PLMutex::new(Vec::new()));
        let tracker = tracker_with(delivered.clone(), missed);

        let (hdr, payload) = bop(1, 8, 4);
        tracker.on_mcast_packet(hdr, &payload);
        // segment 1 arrives, segment 0 is skipped (lost).
        tracker.on_mcast_packet(FmtpHeader::new(1, 4, 4, FLAG_DATA), b"ijkl");
        tracker.on_mcast_packet(FmtpHeader::new(1, 0, 0, FLAG_EOP), &[]);
        assert!(delivered.lock().is_empty());

        let req = tracker.retx_queue.pop_timeout(std::time::Duration::from_millis(10));
        assert!(matches!(
            req,
            Some(RetxRequest::Data {
                prodindex: 1,
                seqnum: 0,
                payload_len: 4
            })
        ));

        // The retx path delivers the missing segment; this must not enqueue
        // any further requests.
        tracker.on_retx_packet(FmtpHeader::new(1, 0, 4, FLAG_DATA), b"abcd");
        assert_eq!(delivered.lock()[0], (1, b"abcdijkl".to_vec()));
    }

    #[test]
    fn bop_index_gap_requests_every_skipped_prodindex_in_order() {
        let delivered = StdArc::new(PLMutex::new(Vec::new()));
        let missed = StdArc::new(PLMutex::new(Vec::new()));
        let tracker = tracker_with(delivered, missed);

        let (hdr, payload) = bop(1, 4, 4);
        tracker.on_mcast_packet(hdr, &payload);
        let (hdr2, payload2) = bop(4, 4, 4);
        tracker.on_mcast_packet(hdr2, &payload2);

        let mut seen = Vec::new();
        while let Some(req) = tracker.retx_queue.pop_timeout(std::time::Duration::from_millis(5)) {
            seen.push(req);
        }
        assert_eq!(
            seen,
            vec![
                RetxRequest::Bop { prodindex: 2 },
                RetxRequest::Bop { prodindex: 3 },
            ]
        );
    }

    #[test]
    fn rejecting_bop_discards_without_storing_or_requesting() {
        let d = StdArc::new(PLMutex::new(Vec::new()));
        let m = StdArc::new(PLMutex::new(Vec::new()));
        let m2 = m.clone();
        let notifier = StdArc::new(ClosureNotifier::new(
            |_p, _s, _meta: &[u8]| BopDecision::Reject,
            move |p, b| d.lock().push((p, b)),
            move |p| m2.lock().push(p),
        ));
        let tracker = ProductTracker::new(
            notifier,
            StdArc::new(NullSink),
            StdArc::new(ReceiverMetrics::new()),
            StdArc::new(RetxQueue::new(64)),
            StdArc::new(NullDeadlineSink),
        );

        let (hdr, payload) = bop(1, 8, 4);
        tracker.on_mcast_packet(hdr, &payload);
        tracker.on_mcast_packet(FmtpHeader::new(1, 4, 4, FLAG_DATA), b"ijkl");
        tracker.on_mcast_packet(FmtpHeader::new(1, 0, 0, FLAG_EOP), &[]);

        assert!(tracker.retx_queue.is_empty());
        assert!(m.lock().is_empty()); // discard => no on_missed, already handled at accept time
        assert_eq!(tracker.metrics.snapshot().products_discarded, 1);
    }

    #[test]
    fn timer_expiry_abandons_an_incomplete_product() {
        let delivered = StdArc::new(PLMutex::new(Vec::new()));
        let missed = StdArc::new(PLMutex::new(Vec::new()));
        let tracker = tracker_with(delivered, missed.clone());

        let (hdr, payload) = bop(1, 8, 4);
        tracker.on_mcast_packet(hdr, &payload);
        tracker.on_timer_expired(1);

        assert_eq!(*missed.lock(), vec![1]);
        assert_eq!(tracker.live_product_count(), 0);
    }

    #[test]
    fn out_of_order_eop_then_final_segment_still_delivers() {
        let delivered = StdArc::new(PLMutex::new(Vec::new()));
        let missed = StdArc::new(PLMutex::new(Vec::new()));
        let tracker = tracker_with(delivered.clone(), missed);

        let (hdr, payload) = bop(1, 8, 4);
        tracker.on_mcast_packet(hdr, &payload);
        tracker.on_mcast_packet(FmtpHeader::new(1, 0, 4, FLAG_DATA), b"abcd");
        tracker.on_mcast_packet(FmtpHeader::new(1, 0, 0, FLAG_EOP), &[]); // arrives before final segment
        assert!(delivered.lock().is_empty());
        tracker.on_mcast_packet(FmtpHeader::new(1, 4, 4, FLAG_DATA), b"ijkl");
        assert_eq!(delivered.lock()[0], (1, b"abcdijkl".to_vec()));
    }

    #[test]
    fn stale_retransmitted_bop_does_not_reopen_a_delivered_product() {
        let delivered = StdArc::new(PLMutex::new(Vec::new()));
        let missed = StdArc::new(PLMutex::new(Vec::new()));
        let tracker = tracker_with(delivered.clone(), missed);

        let (hdr, payload) = bop(1, 4, 4);
        tracker.on_mcast_packet(hdr, &payload);
        tracker.on_mcast_packet(FmtpHeader::new(1, 0, 4, FLAG_DATA), b"abcd");
        tracker.on_mcast_packet(FmtpHeader::new(1, 0, 0, FLAG_EOP), &[]);
        assert_eq!(delivered.lock().len(), 1);

        // A retransmitted BOP for the same, already-delivered prodindex
        // arrives late; it must not resurrect the product.
        let (hdr2, payload2) = bop(1, 4, 4);
        tracker.on_retx_packet(hdr2, &payload2);
        assert_eq!(delivered.lock().len(), 1);
        assert_eq!(tracker.live_product_count(), 0);
    }

    #[test]
    fn retx_end_notifies_missed_at_most_once() {
        let delivered = StdArc::new(PLMutex::new(Vec::new()));
        let missed = StdArc::new(PLMutex::new(Vec::new()));
        let tracker = tracker_with(delivered, missed.clone());

        let (hdr, payload) = bop(1, 8, 4);
        tracker.on_mcast_packet(hdr, &payload);
        tracker.on_retx_end(1);
        assert_eq!(*missed.lock(), vec![1]);

        // A second RETX_END for the same, now-resolved prodindex must not
        // re-notify "missed".
        tracker.on_retx_end(1);
        assert_eq!(*missed.lock(), vec![1]);
    }
}
