// SPDX-License-Identifier: BSD-3-Clause

//! Delivery sink: the opaque product-queue handle (spec §1, §6).
//!
//! The persistent product queue and its indexing are explicitly out of
//! scope for this crate (spec §1). `DeliverySink` is the seam the receiver
//! calls through once a product is fully reassembled — grounded on how the
//! teacher treats its own persistence layer as a pluggable trait rather
//! than baking storage into the reliability core.

/// Accepts completed products. Implementations typically insert into a
/// persistent product queue; the default `NullSink` just drops the bytes.
pub trait DeliverySink: Send + Sync {
    /// `prodindex` was fully reassembled. `metadata` is the BOP metadata;
    /// `bytes` is the complete `prodsize`-length product.
    fn accept(&self, prodindex: u32, metadata: &[u8], bytes: &[u8]);
}

/// A sink that discards everything. Useful for tests and for embedding
/// applications that only care about the notifier callbacks.
#[derive(Debug, Default)]
pub struct NullSink;

impl DeliverySink for NullSink {
    fn accept(&self, _prodindex: u32, _metadata: &[u8], _bytes: &[u8]) {}
}
