//! Firmware File System (FFS) File Definitions
//!
//! Based on EFI_FFS_FILE_HEADER and EFI_FFS_FILE_TAIL of the (v1) Firmware File System, as used by volumes
//! carrying the EFI_FIRMWARE_FILE_SYSTEM_GUID.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
use r_efi::efi;
use scroll::{ctx, Endian, Pread, Pwrite};

/// Size in bytes of [`Header`].
pub const HEADER_SIZE: usize = 0x18;

/// Size in bytes of the optional file tail.
pub const TAIL_SIZE: usize = 2;

/// Largest file size that fits the 24-bit size field of [`Header`].
pub const MAX_SIZE: usize = 0xff_ffff;

/// Value of `integrity_check_file` when the data checksum attribute is clear.
pub const FIXED_CHECKSUM: u8 = 0xaa;

/// Raw FFS file constant definitions
pub mod raw {
    /// File State Bits
    ///
    /// With an erase polarity of 1 these bits are stored inverted.
    pub mod state {
        /// File header is under construction
        pub const HEADER_CONSTRUCTION: u8 = 0x01;
        /// File header is valid
        pub const HEADER_VALID: u8 = 0x02;
        /// File data is valid
        pub const DATA_VALID: u8 = 0x04;
        /// File has been deleted
        pub const DELETED: u8 = 0x10;
    }

    /// File Type Definitions
    pub mod r#type {
        /// Raw data file
        pub const RAW: u8 = 0x01;
        /// DXE driver file
        pub const DRIVER: u8 = 0x07;
        /// FFS pad file
        pub const FFS_PAD: u8 = 0xf0;
    }
}

/// State byte of a freshly built file under erase polarity 1: only DATA_VALID and its predecessors are
/// programmed (cleared), giving `0xf8`.
pub const STATE_DATA_VALID_ERASE_POLARITY_1: u8 =
    !(raw::state::HEADER_CONSTRUCTION | raw::state::HEADER_VALID | raw::state::DATA_VALID);

/// EFI_FFS_FILE_HEADER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Unique file GUID identifier
    pub name: efi::Guid,
    /// Header checksum value
    pub integrity_check_header: u8,
    /// File data checksum value
    pub integrity_check_file: u8,
    /// Type of file (see [`raw::r#type`])
    pub file_type: u8,
    /// File attributes (see [`super::attributes::raw`])
    pub attributes: u8,
    /// 24-bit file size in bytes, header and tail included
    pub size: [u8; 3],
    /// File state (see [`raw::state`])
    pub state: u8,
}

impl Header {
    /// The 24-bit size field as a `usize`.
    pub fn size(&self) -> usize {
        u32::from_le_bytes([self.size[0], self.size[1], self.size[2], 0]) as usize
    }

    /// Store `size` into the 24-bit size field. Sizes above [`MAX_SIZE`] are truncated.
    pub fn set_size(&mut self, size: usize) {
        self.size.copy_from_slice(&(size as u32).to_le_bytes()[..3]);
    }

    /// The EFI_FFS_FILE_TAIL value for this header: the complement of the two integrity check bytes read as
    /// a little-endian `u16`.
    pub fn tail(&self) -> u16 {
        !u16::from_le_bytes([self.integrity_check_header, self.integrity_check_file])
    }
}

impl<'a> ctx::TryFromCtx<'a, Endian> for Header {
    type Error = scroll::Error;

    fn try_from_ctx(src: &'a [u8], endian: Endian) -> Result<(Self, usize), Self::Error> {
        let offset = &mut 0;
        let mut name = [0u8; 16];
        name.copy_from_slice(src.gread_with::<&[u8]>(offset, 16)?);
        let integrity_check_header = src.gread_with(offset, endian)?;
        let integrity_check_file = src.gread_with(offset, endian)?;
        let file_type = src.gread_with(offset, endian)?;
        let attributes = src.gread_with(offset, endian)?;
        let mut size = [0u8; 3];
        size.copy_from_slice(src.gread_with::<&[u8]>(offset, 3)?);
        let state = src.gread_with(offset, endian)?;
        Ok((
            Header {
                name: efi::Guid::from_bytes(&name),
                integrity_check_header,
                integrity_check_file,
                file_type,
                attributes,
                size,
                state,
            },
            *offset,
        ))
    }
}

impl ctx::TryIntoCtx<Endian> for Header {
    type Error = scroll::Error;

    fn try_into_ctx(self, dst: &mut [u8], endian: Endian) -> Result<usize, Self::Error> {
        let offset = &mut 0;
        dst.gwrite_with(&self.name.as_bytes()[..], offset, ())?;
        dst.gwrite_with(self.integrity_check_header, offset, endian)?;
        dst.gwrite_with(self.integrity_check_file, offset, endian)?;
        dst.gwrite_with(self.file_type, offset, endian)?;
        dst.gwrite_with(self.attributes, offset, endian)?;
        dst.gwrite_with(&self.size[..], offset, ())?;
        dst.gwrite_with(self.state, offset, endian)?;
        Ok(*offset)
    }
}
