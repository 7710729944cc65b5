// SPDX-License-Identifier: BSD-3-Clause

//! FMTP v3 wire header (spec §3, §6).
//!
//! ```text
//! 0         4         8        10        12        16
//! +---------+---------+----+----+---------+---------+
//! |prodindex| seqnum  |plen|flag| reserved            |
//! +---------+---------+----+----+---------+---------+
//! ```
//!
//! All multi-byte fields are network byte order (big-endian). The same
//! 16-byte layout is used for multicast data packets, retransmission
//! requests (receiver -> sender), and retransmitted data (sender -> receiver).

use std::fmt;

/// Size in bytes of the FMTP header on the wire.
pub const HEADER_LEN: usize = 16;

/// Begin-Of-Product (sender -> receiver).
pub const FLAG_BOP: u16 = 0x01;
/// Data segment (sender -> receiver).
pub const FLAG_DATA: u16 = 0x02;
/// End-Of-Product (sender -> receiver).
pub const FLAG_EOP: u16 = 0x04;
/// Request retransmission of a product's BOP (receiver -> sender).
pub const FLAG_BOP_REQ: u16 = 0x08;
/// Request retransmission of a data segment (receiver -> sender).
pub const FLAG_DATA_REQ: u16 = 0x10;
/// Request retransmission of a product's EOP (receiver -> sender).
pub const FLAG_EOP_REQ: u16 = 0x20;
/// "No retransmission possible for this product" (either direction).
pub const FLAG_RETX_END: u16 = 0x40;

/// Decoded FMTP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtpHeader {
    pub prodindex: u32,
    pub seqnum: u32,
    pub payload_len: u16,
    pub flags: u16,
}

impl FmtpHeader {
    #[must_use]
    pub fn new(prodindex: u32, seqnum: u32, payload_len: u16, flags: u16) -> Self {
        Self {
            prodindex,
            seqnum,
            payload_len,
            flags,
        }
    }

    /// Encode into a 16-byte on-wire frame header. `reserved` is always zero.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.prodindex.to_be_bytes());
        buf[4..8].copy_from_slice(&self.seqnum.to_be_bytes());
        buf[8..10].copy_from_slice(&self.payload_len.to_be_bytes());
        buf[10..12].copy_from_slice(&self.flags.to_be_bytes());
        // buf[12..16] reserved, left zeroed
        buf
    }

    /// Decode a 16-byte header. Returns `None` if `bytes` is too short.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let prodindex = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let seqnum = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
        let payload_len = u16::from_be_bytes(bytes[8..10].try_into().unwrap());
        let flags = u16::from_be_bytes(bytes[10..12].try_into().unwrap());
        Some(Self {
            prodindex,
            seqnum,
            payload_len,
            flags,
        })
    }

    #[must_use]
    pub fn is_bop(&self) -> bool {
        self.flags == FLAG_BOP
    }

    #[must_use]
    pub fn is_data(&self) -> bool {
        self.flags == FLAG_DATA
    }

    #[must_use]
    pub fn is_eop(&self) -> bool {
        self.flags == FLAG_EOP
    }

    /// One of the three multicast/retx data-path flags (BOP, DATA, EOP).
    ///
    /// Malformed packets with an unknown flag should be dropped and counted
    /// per spec §7.
    #[must_use]
    pub fn is_known_data_flag(&self) -> bool {
        matches!(self.flags, FLAG_BOP | FLAG_DATA | FLAG_EOP)
    }
}

impl fmt::Display for FmtpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FmtpHeader{{prodindex={}, seqnum={}, payload_len={}, flags={:#04x}}}",
            self.prodindex, self.seqnum, self.payload_len, self.flags
        )
    }
}

/// Signed comparison of two product indexes, treating `prodindex` as
/// monotonically increasing modulo 2^32 (spec §3).
///
/// Returns a negative value if `a` precedes `b`, zero if equal, positive if
/// `a` follows `b` — computed as the signed 32-bit difference `a - b`.
#[must_use]
pub fn prodindex_cmp(a: u32, b: u32) -> i32 {
    a.wrapping_sub(b) as i32
}

/// `true` if `a` is strictly after `b` in wraparound order.
#[must_use]
pub fn prodindex_after(a: u32, b: u32) -> bool {
    prodindex_cmp(a, b) > 0
}
