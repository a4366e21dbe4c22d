//! Block map recovery and synthesis.
//!
//! The device family only ever ships volumes whose block map has exactly one real entry followed by the
//! `(0, 0)` terminator. Anything else is rejected rather than interpreted.
//!
//! The data region derived from the block map is 72 bytes (`0x28 + 0x20`) shorter than the extent the map
//! describes. This does not follow from the PI specification and looks like an off-by-header bug in the
//! vendor's image builder; it has only been verified against one device family, so it lives in
//! [`VendorQuirks`] together with the other empirically determined constants.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
use alloc::vec::Vec;
use nanofw_pi::fw_fs::fv::{self, BlockMapEntry};
use scroll::Pwrite;

use crate::{FirmwareVolumeError, cursor::Cursor};

/// The only supported number of block map entries, terminator included.
pub const BLOCK_MAP_ENTRIES: usize = 2;

/// Header length written on encode: the fixed header plus a two-entry block map (0x48).
pub const ENCODED_HEADER_LENGTH: u16 = (fv::HEADER_SIZE + BLOCK_MAP_ENTRIES * fv::BLOCK_MAP_ENTRY_SIZE) as u16;

/// Device-family specific constants of the volume layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorQuirks {
    /// Bytes subtracted from the block map extent to obtain the data region length.
    pub data_region_correction: u32,
    /// Block size used when synthesizing a block map on encode.
    pub block_size: u32,
    /// Expected size of the trailing signature/certificate blob, if known. A mismatch is only reported.
    pub trailer_size: Option<usize>,
}

impl VendorQuirks {
    /// Values observed on the supported device family.
    pub const DEFAULT: VendorQuirks =
        VendorQuirks { data_region_correction: 0x28 + 0x20, block_size: 256, trailer_size: Some(928) };
}

impl Default for VendorQuirks {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Decode the block map at the cursor's read position and advance past it.
///
/// The entry count is derived from `header_length`. The map must be exactly [`BLOCK_MAP_ENTRIES`] long and
/// end in the `(0, 0)` terminator.
pub fn decode(cursor: &mut Cursor<'_>, header_length: u16) -> Result<Vec<BlockMapEntry>, FirmwareVolumeError> {
    let block_map_size =
        (header_length as usize).checked_sub(fv::HEADER_SIZE).ok_or(FirmwareVolumeError::MalformedBlockMap)?;
    if block_map_size % fv::BLOCK_MAP_ENTRY_SIZE != 0 {
        log::error!("block map size {block_map_size:#x} not a multiple of {}", fv::BLOCK_MAP_ENTRY_SIZE);
        Err(FirmwareVolumeError::MalformedBlockMap)?;
    }

    let count = block_map_size / fv::BLOCK_MAP_ENTRY_SIZE;
    if count != BLOCK_MAP_ENTRIES {
        log::error!("unsupported count of block map entries ({count}, wanted {BLOCK_MAP_ENTRIES})");
        Err(FirmwareVolumeError::MalformedBlockMap)?;
    }

    let block_map = (0..count)
        .map(|_| cursor.read::<BlockMapEntry>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| FirmwareVolumeError::MalformedBlockMap)?;

    if !block_map.last().is_some_and(BlockMapEntry::is_terminator) {
        log::error!("block map does not end in (0, 0): {block_map:?}");
        Err(FirmwareVolumeError::MalformedBlockMap)?;
    }

    log::debug!("block map: {block_map:?}");
    Ok(block_map)
}

/// Length of the data region described by `block_map`, after the vendor correction.
pub fn data_region_length(block_map: &[BlockMapEntry], quirks: &VendorQuirks) -> Result<u32, FirmwareVolumeError> {
    let first = block_map.first().ok_or(FirmwareVolumeError::MalformedBlockMap)?;
    first
        .num_blocks
        .checked_mul(first.length)
        .and_then(|extent| extent.checked_sub(quirks.data_region_correction))
        .ok_or(FirmwareVolumeError::MalformedBlockMap)
}

/// Build the block map for an image whose header, block map and data region total `total_size` bytes.
///
/// The extent is always re-quantized to `quirks.block_size`, whatever the block size of the decoded image
/// was. The block count truncates.
pub fn synthesize(total_size: usize, quirks: &VendorQuirks) -> Result<[BlockMapEntry; 2], FirmwareVolumeError> {
    if quirks.block_size == 0 {
        Err(FirmwareVolumeError::MalformedBlockMap)?;
    }
    let num_blocks = total_size / quirks.block_size as usize;
    let num_blocks = u32::try_from(num_blocks).map_err(|_| FirmwareVolumeError::MalformedBlockMap)?;
    Ok([BlockMapEntry { num_blocks, length: quirks.block_size }, BlockMapEntry::TERMINATOR])
}

/// Encode `block_map` as consecutive little-endian entries.
pub fn encode(block_map: &[BlockMapEntry]) -> Result<Vec<u8>, FirmwareVolumeError> {
    let mut buffer = alloc::vec![0u8; block_map.len() * fv::BLOCK_MAP_ENTRY_SIZE];
    let mut offset = 0;
    for entry in block_map {
        buffer.gwrite_with(*entry, &mut offset, scroll::LE).map_err(|_| FirmwareVolumeError::MalformedBlockMap)?;
    }
    Ok(buffer)
}
