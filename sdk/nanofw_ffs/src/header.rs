//! Volume header decoding, validation, and encoding.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
use alloc::vec::Vec;
use nanofw_pi::fw_fs::{self, fv};
use scroll::Pwrite;

use crate::{FirmwareVolumeError, cursor::Cursor};

/// Smallest header length accepted: the fixed header plus one block map entry (0x40).
pub const MIN_HEADER_LENGTH: u16 = (fv::HEADER_SIZE + fv::BLOCK_MAP_ENTRY_SIZE) as u16;

/// Validate the identifying fields of a decoded header.
///
/// A foreign or corrupt header must be rejected here, before the block map is looked at.
pub fn check(header: &fv::Header) -> Result<(), FirmwareVolumeError> {
    if header.file_system_guid != fv::guid::EFI_FIRMWARE_FILE_SYSTEM_GUID {
        log::error!("unknown file system GUID ({})", fw_fs::guid_display(&header.file_system_guid));
        Err(FirmwareVolumeError::UnsupportedFormat)?;
    }
    if header.signature != fv::SIGNATURE {
        log::error!("invalid signature {:x?}", header.signature);
        Err(FirmwareVolumeError::UnsupportedFormat)?;
    }
    if header.header_length < MIN_HEADER_LENGTH {
        log::error!("header length too small ({:#x})", header.header_length);
        Err(FirmwareVolumeError::MalformedHeader)?;
    }
    Ok(())
}

/// Decode the fixed-size header at the cursor's read position and advance past it.
///
/// The header is validated with [`check`] before it is returned.
pub fn decode(cursor: &mut Cursor<'_>) -> Result<fv::Header, FirmwareVolumeError> {
    let header: fv::Header = cursor.read().map_err(|_| FirmwareVolumeError::MalformedHeader)?;
    check(&header)?;
    Ok(header)
}

/// Encode `header` as given. `fv_length`, `header_length` and `checksum` must already be final.
pub fn encode(header: &fv::Header) -> Result<Vec<u8>, FirmwareVolumeError> {
    let mut buffer = alloc::vec![0u8; fv::HEADER_SIZE];
    buffer.pwrite_with(*header, 0, scroll::LE).map_err(|_| FirmwareVolumeError::MalformedHeader)?;
    Ok(buffer)
}
