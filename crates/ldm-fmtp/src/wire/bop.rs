// SPDX-License-Identifier: BSD-3-Clause

//! BOP (Begin-Of-Product) payload codec (spec §3).
//!
//! `prodsize:u32 | segment_len:u16 | metadata_len:u16 | metadata[metadata_len]`,
//! network byte order for the fixed fields. `metadata` is opaque to the
//! receiver core and is handed to the application's notifier unchanged.
//!
//! `segment_len` carries the product's uniform per-segment size (spec §3:
//! "payload_len — segment size in bytes, from BOP"). It lives in the BOP
//! payload body rather than the frame header's own `payload_len` field,
//! because that header field is reused across every flag and channel as the
//! literal count of bytes following it on the wire (needed to frame
//! retransmitted BOPs over the TCP sidechannel, spec §4.C) — a BOP frame's
//! own encoded size is generally much smaller than the segment size it
//! configures for the rest of the product.

/// Fixed-size prefix of a BOP payload: `prodsize` + `segment_len` + `metadata_len`.
const BOP_PREFIX_LEN: usize = 4 + 2 + 2;

/// Decoded BOP payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BopPayload {
    pub prodsize: u32,
    pub segment_len: u16,
    pub metadata: Vec<u8>,
}

impl BopPayload {
    #[must_use]
    pub fn new(prodsize: u32, segment_len: u16, metadata: Vec<u8>) -> Self {
        Self {
            prodsize,
            segment_len,
            metadata,
        }
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BOP_PREFIX_LEN + self.metadata.len());
        buf.extend_from_slice(&self.prodsize.to_be_bytes());
        buf.extend_from_slice(&self.segment_len.to_be_bytes());
        buf.extend_from_slice(&(self.metadata.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.metadata);
        buf
    }

    /// Decode a BOP payload. Returns `None` if `bytes` is too short for the
    /// declared `metadata_len` (a malformed-packet condition per spec §7).
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < BOP_PREFIX_LEN {
            return None;
        }
        let prodsize = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let segment_len = u16::from_be_bytes(bytes[4..6].try_into().unwrap());
        let metadata_len = u16::from_be_bytes(bytes[6..8].try_into().unwrap()) as usize;
        let metadata_end = BOP_PREFIX_LEN.checked_add(metadata_len)?;
        let metadata = bytes.get(BOP_PREFIX_LEN..metadata_end)?.to_vec();
        Some(Self {
            prodsize,
            segment_len,
            metadata,
        })
    }
}
