// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The page/header checksum function `H`: a size-independent 64-bit digest,
//! XORing a mixing hash over each 8-byte little-endian word of the payload
//! with a DJB2-style string hash over the 0-7 residual tail bytes.

/// splitmix64 finalizer, used to mix each 8-byte word of the payload.
#[inline]
fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^= x >> 31;
    x
}

/// DJB2 hash over an arbitrary byte slice, used for the 0-7 residual tail bytes.
#[inline]
fn djb2(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 5381;
    for &b in bytes {
        hash = hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(b as u64);
    }
    hash
}

/// Computes the checksum of `payload`. Deterministic, endian-fixed, and sensitive
/// to any single-bit flip within the payload.
pub fn checksum(payload: &[u8]) -> u64 {
    let mut result: u64 = 5381;
    let chunks = payload.chunks_exact(8);
    let tail = chunks.remainder();
    for word in chunks {
        let v = u64::from_le_bytes(word.try_into().expect("chunk is exactly 8 bytes"));
        result ^= mix64(v);
    }
    if !tail.is_empty() {
        result ^= djb2(tail);
    }
    result
}
