//! Header checksum routines.
//!
//! The volume header uses a 16-bit checksum: the little-endian word sum over the header and block map,
//! including the stored checksum, must be zero. FFS file headers use the 8-bit equivalent.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

/// Wrapping sum of `data` read as little-endian 16-bit words.
///
/// A trailing odd byte is added as the low byte of a final word.
pub fn sum16(data: &[u8]) -> u16 {
    let words = data.chunks_exact(2);
    let tail = words.remainder().first().map_or(0, |&x| x as u16);
    words.fold(tail, |sum, word| sum.wrapping_add(u16::from_le_bytes([word[0], word[1]])))
}

/// The value that makes the 16-bit word sum of `data` plus the value equal zero.
///
/// `data` must contain the checksum field zeroed.
pub fn checksum16(data: &[u8]) -> u16 {
    0u16.wrapping_sub(sum16(data))
}

/// Wrapping byte sum of `data`.
pub fn sum8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, value| sum.wrapping_add(*value))
}

/// The value that makes the byte sum of `data` plus the value equal zero.
pub fn checksum8(data: &[u8]) -> u8 {
    0u8.wrapping_sub(sum8(data))
}
