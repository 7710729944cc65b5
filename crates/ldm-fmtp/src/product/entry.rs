// SPDX-License-Identifier: BSD-3-Clause

//! Product Tracker Entry (spec §3).
//!
//! One entry exists per live product, from BOP arrival until delivery,
//! timeout/abandonment, or shutdown (invariant 1). While alive it moves
//! through `AWAITING_DATA` (with an `eop_seen` sub-flag) to completeness,
//! at which point the Tracker delivers it and removes the entry in a single
//! critical section (invariant 3).

use std::time::Instant;

use super::bitmap::SegmentBitmap;

/// A live product's reassembly state.
pub struct ProductEntry {
    pub prodindex: u32,
    pub prodsize: u32,
    pub payload_len: u16,
    /// `None` when the notifier rejected the BOP (spec §7 DISCARD
    /// substate): segments are still accounted for via `bitmap`, but no
    /// bytes are stored and nothing will ever be delivered for this entry.
    pub buffer: Option<Vec<u8>>,
    pub bitmap: SegmentBitmap,
    /// Mirrors `bitmap` but marks segments a `DATA_REQ` has already been sent
    /// for, so a repeated gap observation does not re-request the same
    /// segment (spec §8: at most one `DATA_REQ` per segment).
    pub requested: SegmentBitmap,
    /// Set once an EOP has arrived (possibly before the bitmap is full).
    pub eop_seen: bool,
    pub bop_arrival: Instant,
    /// Opaque BOP metadata, retained for the eventual `DeliverySink::accept`
    /// call (spec §6).
    pub metadata: Vec<u8>,
    /// Number of retransmission requests sent for this product so far.
    /// Spec §8: bounded by `segments(P) + 2` (one BOP_REQ, one EOP_REQ, at
    /// most one DATA_REQ per segment).
    pub retx_count: u32,
}

impl ProductEntry {
    /// Number of data segments for a product of `prodsize` bytes split into
    /// `payload_len`-byte segments (spec §8: the final segment may be
    /// shorter and its bit still counts toward completeness).
    #[must_use]
    pub fn num_segments(prodsize: u32, payload_len: u16) -> usize {
        if payload_len == 0 || prodsize == 0 {
            return if prodsize == 0 { 0 } else { 1 };
        }
        prodsize.div_ceil(u32::from(payload_len)) as usize
    }

    #[must_use]
    pub fn new(
        prodindex: u32,
        prodsize: u32,
        payload_len: u16,
        buffer: Option<Vec<u8>>,
        metadata: Vec<u8>,
        now: Instant,
    ) -> Self {
        let num_segments = Self::num_segments(prodsize, payload_len);
        Self {
            prodindex,
            prodsize,
            payload_len,
            buffer,
            bitmap: SegmentBitmap::new(num_segments),
            requested: SegmentBitmap::new(num_segments),
            eop_seen: false,
            bop_arrival: now,
            metadata,
            retx_count: 0,
        }
    }

    /// `true` if segment `i` is neither received nor already requested.
    #[must_use]
    pub fn should_request(&self, i: usize) -> bool {
        !self.bitmap.is_set(i) && !self.requested.is_set(i)
    }

    /// Mark segment `i` as requested. Returns `true` the first time (mirrors
    /// [`SegmentBitmap::claim`]'s first-writer-wins semantics).
    pub fn mark_requested(&mut self, i: usize) -> bool {
        let first = self.requested.claim(i);
        if first {
            self.retx_count += 1;
        }
        first
    }

    #[must_use]
    pub fn is_discard(&self) -> bool {
        self.buffer.is_none()
    }

    /// Byte range `[start, end)` within the product buffer covered by
    /// segment `i` (spec §3 invariant 2).
    #[must_use]
    pub fn segment_range(&self, i: usize) -> Option<(usize, usize)> {
        if i >= self.bitmap.num_segments() {
            return None;
        }
        let payload_len = self.payload_len as usize;
        let start = i * payload_len;
        let end = ((i + 1) * payload_len).min(self.prodsize as usize);
        Some((start, end))
    }

    /// Segment index covering byte offset `seqnum`, validated against
    /// alignment and product bounds (spec §4.A: "seqnum % payload_len == 0"
    /// and the segment must not run past `prodsize`).
    #[must_use]
    pub fn segment_index_for_seqnum(&self, seqnum: u32) -> Option<usize> {
        if self.payload_len == 0 {
            return if seqnum == 0 && self.prodsize > 0 {
                Some(0)
            } else {
                None
            };
        }
        let payload_len = u32::from(self.payload_len);
        if seqnum % payload_len != 0 {
            return None;
        }
        let i = (seqnum / payload_len) as usize;
        if i >= self.bitmap.num_segments() {
            return None;
        }
        Some(i)
    }

    /// `true` once every data segment is received and an EOP has arrived
    /// (spec §3 invariant 3 / §4.D state machine: `AWAITING_DATA -> COMPLETE`).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.eop_seen && self.bitmap.is_full()
    }
}
