// SPDX-License-Identifier: BSD-3-Clause

//! Product reassembly state: the segment bitmap, per-product entry, and the
//! central tracker that owns them (spec §3, §4).

mod bitmap;
mod entry;
mod tracker;

pub use bitmap::SegmentBitmap;
pub use entry::ProductEntry;
pub use tracker::{DeadlineSink, NullDeadlineSink, PacketSource, ProductTracker};
