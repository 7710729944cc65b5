// SPDX-License-Identifier: BSD-3-Clause

//! Received-segment bitmap (spec §3 Product Tracker Entry, invariant 2).
//!
//! One bit per expected segment. Bit `i` set means bytes
//! `[i*payload_len, min((i+1)*payload_len, prodsize))` have been copied into
//! the product buffer.

/// Fixed-size bitmap over segment indexes `0..num_segments`.
#[derive(Debug, Clone)]
pub struct SegmentBitmap {
    bits: Vec<u64>,
    num_segments: usize,
    received: usize,
}

const WORD_BITS: usize = u64::BITS as usize;

impl SegmentBitmap {
    #[must_use]
    pub fn new(num_segments: usize) -> Self {
        let words = num_segments.div_ceil(WORD_BITS);
        Self {
            bits: vec![0u64; words],
            num_segments,
            received: 0,
        }
    }

    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    #[must_use]
    pub fn received_count(&self) -> usize {
        self.received
    }

    #[must_use]
    pub fn is_set(&self, i: usize) -> bool {
        if i >= self.num_segments {
            return false;
        }
        (self.bits[i / WORD_BITS] >> (i % WORD_BITS)) & 1 == 1
    }

    /// Claim bit `i`. Returns `true` if this call was the first to set it
    /// (the caller "wins the ticket" and may copy the payload, per spec §5's
    /// claim-the-bit-under-lock discipline); `false` if already set
    /// (duplicate arrival, spec §4.D tie-break: first writer wins).
    pub fn claim(&mut self, i: usize) -> bool {
        if i >= self.num_segments {
            return false;
        }
        let word = i / WORD_BITS;
        let mask = 1u64 << (i % WORD_BITS);
        if self.bits[word] & mask != 0 {
            return false;
        }
        self.bits[word] |= mask;
        self.received += 1;
        true
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.received == self.num_segments
    }

    /// Indexes of missing segments in `[0, self.num_segments)`, in order.
    pub fn missing(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_segments).filter(move |&i| !self.is_set(i))
    }

    /// Highest index `e` such that every segment in `[0, e)` is set (the
    /// contiguous edge used to scope gap-driven DATA_REQ ranges, spec §4.A).
    #[must_use]
    pub fn contiguous_edge(&self) -> usize {
        (0..self.num_segments)
            .take_while(|&i| self.is_set(i))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let bm = SegmentBitmap::new(3);
        assert!(!bm.is_full());
        assert_eq!(bm.received_count(), 0);
        assert_eq!(bm.missing().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn claim_is_idempotent() {
        let mut bm = SegmentBitmap::new(3);
        assert!(bm.claim(1));
        assert!(!bm.claim(1));
        assert_eq!(bm.received_count(), 1);
    }

    #[test]
    fn becomes_full_when_all_claimed() {
        let mut bm = SegmentBitmap::new(65); // exercise the two-word boundary
        for i in 0..65 {
            assert!(bm.claim(i));
        }
        assert!(bm.is_full());
        assert_eq!(bm.missing().count(), 0);
    }

    #[test]
    fn contiguous_edge_stops_at_first_gap() {
        let mut bm = SegmentBitmap::new(5);
        bm.claim(0);
        bm.claim(1);
        bm.claim(3);
        assert_eq!(bm.contiguous_edge(), 2);
    }

    #[test]
    fn out_of_range_claim_is_noop() {
        let mut bm = SegmentBitmap::new(2);
        assert!(!bm.claim(5));
        assert_eq!(bm.received_count(), 0);
    }

    #[test]
    fn becomes_full_regardless_of_claim_order() {
        let num_segments = 200;
        let mut order: Vec<usize> = (0..num_segments).collect();
        for i in (1..order.len()).rev() {
            let j = fastrand::usize(..=i);
            order.swap(i, j);
        }
        let mut bm = SegmentBitmap::new(num_segments);
        for i in order {
            assert!(bm.claim(i));
        }
        assert!(bm.is_full());
        assert_eq!(bm.missing().count(), 0);
    }
}
