// SPDX-License-Identifier: BSD-3-Clause

//! FMTP v3 wire format: the 16-byte frame header and the BOP payload layout.

mod bop;
mod header;

pub use bop::BopPayload;
pub use header::{
    prodindex_after, prodindex_cmp, FmtpHeader, HEADER_LEN, FLAG_BOP, FLAG_BOP_REQ, FLAG_DATA,
    FLAG_DATA_REQ, FLAG_EOP, FLAG_EOP_REQ, FLAG_RETX_END,
};

/// Maximum multicast packet size (header + payload), per spec §6.
pub const MTU: usize = 1476;
/// Maximum data payload per packet (`MTU - HEADER_LEN`).
pub const MAX_PAYLOAD: usize = MTU - HEADER_LEN;
