// SPDX-License-Identifier: BSD-3-Clause

//! Application notifier callback set (spec §6, §9 "notifier").
//!
//! Grounded on the teacher's `DataReaderListener` / `CallbackSubscriber`
//! split: a trait for applications that want a full type, plus a
//! closure-based adapter for the common case. All three hooks are invoked
//! outside the Tracker's lock (spec §5).

/// What the application wants done with an accepted product's bytes.
pub enum BopDecision {
    /// Accept the product; deliver completed bytes into this caller-owned
    /// buffer of exactly `prodsize` bytes.
    Accept(Vec<u8>),
    /// Reject the product (spec §7: "notifier rejects a BOP"). The entry
    /// enters the DISCARD substate: segments are still accounted for but
    /// not stored, and no retransmission is requested for it.
    Reject,
}

/// Application-provided callback set for BOP acceptance, delivery, and
/// missed-product events (spec §6).
pub trait Notifier: Send + Sync {
    /// A BOP arrived for `prodindex`; `metadata` is the opaque BOP payload
    /// metadata. Return a destination buffer or reject the product.
    fn on_bop(&self, prodindex: u32, prodsize: u32, metadata: &[u8]) -> BopDecision;

    /// `prodindex` was fully reassembled and verified complete.
    fn on_delivery(&self, prodindex: u32, bytes: Vec<u8>);

    /// `prodindex` was abandoned (timeout or sender `RETX_END`) and will
    /// never be delivered.
    fn on_missed(&self, prodindex: u32);
}

/// Closure-based [`Notifier`] adapter for simple embedding applications.
pub struct ClosureNotifier<B, D, M>
where
    B: Fn(u32, u32, &[u8]) -> BopDecision + Send + Sync,
    D: Fn(u32, Vec<u8>) + Send + Sync,
    M: Fn(u32) + Send + Sync,
{
    on_bop: B,
    on_delivery: D,
    on_missed: M,
}

impl<B, D, M> ClosureNotifier<B, D, M>
where
    B: Fn(u32, u32, &[u8]) -> BopDecision + Send + Sync,
    D: Fn(u32, Vec<u8>) + Send + Sync,
    M: Fn(u32) + Send + Sync,
{
    pub fn new(on_bop: B, on_delivery: D, on_missed: M) -> Self {
        Self {
            on_bop,
            on_delivery,
            on_missed,
        }
    }
}

impl<B, D, M> Notifier for ClosureNotifier<B, D, M>
where
    B: Fn(u32, u32, &[u8]) -> BopDecision + Send + Sync,
    D: Fn(u32, Vec<u8>) + Send + Sync,
    M: Fn(u32) + Send + Sync,
{
    fn on_bop(&self, prodindex: u32, prodsize: u32, metadata: &[u8]) -> BopDecision {
        (self.on_bop)(prodindex, prodsize, metadata)
    }

    fn on_delivery(&self, prodindex: u32, bytes: Vec<u8>) {
        (self.on_delivery)(prodindex, bytes);
    }

    fn on_missed(&self, prodindex: u32) {
        (self.on_missed)(prodindex);
    }
}
