//! Firmware Volume (FV) Definitions
//!
//! Layout of the volume header and block map as found in embedded-device boot images. The layout follows the
//! UEFI Platform Initialization (PI) Specification V1.8A 3.2.1 EFI_FIRMWARE_VOLUME_HEADER, but the device family
//! uses the first-generation FFS (v1) file system GUID and a two-entry block map.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
use r_efi::efi;
use scroll::{ctx, Endian, Pread, Pwrite, SizeWith};

/// Size in bytes of the fixed part of the header, up to (not including) the block map.
pub const HEADER_SIZE: usize = 0x38;

/// Size in bytes of a single block map entry.
pub const BLOCK_MAP_ENTRY_SIZE: usize = 8;

/// Firmware volume signature, ASCII `_FVH`.
pub const SIGNATURE: [u8; 4] = *b"_FVH";

/// Offset of the checksum field within the header.
pub const CHECKSUM_OFFSET: usize = 0x32;

/// Firmware volume GUIDs
pub mod guid {
    use r_efi::efi;

    /// EFI_FIRMWARE_FILE_SYSTEM_GUID (7a9354d9-0468-444a-81ce-0bf617d890df)
    pub const EFI_FIRMWARE_FILE_SYSTEM_GUID: efi::Guid =
        efi::Guid::from_fields(0x7a9354d9, 0x0468, 0x444a, 0x81, 0xce, &[0x0b, 0xf6, 0x17, 0xd8, 0x90, 0xdf]);
}

/// EFI_FIRMWARE_VOLUME_HEADER, without the trailing block map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Reserved vector, passed through untouched
    pub zero_vector: [u8; 16],
    /// File system type GUID
    pub file_system_guid: efi::Guid,
    /// Volume length in bytes
    pub fv_length: u64,
    /// Firmware volume signature
    pub signature: [u8; 4],
    /// Volume attributes
    pub attributes: u32,
    /// Length of the header including the block map
    pub header_length: u16,
    /// Header checksum
    pub checksum: u16,
    /// Offset to extended header (0 if none)
    pub ext_header_offset: u16,
    /// Reserved byte
    pub reserved: u8,
    /// Header revision number
    pub revision: u8,
}

impl<'a> ctx::TryFromCtx<'a, Endian> for Header {
    type Error = scroll::Error;

    fn try_from_ctx(src: &'a [u8], endian: Endian) -> Result<(Self, usize), Self::Error> {
        let offset = &mut 0;

        let mut zero_vector = [0u8; 16];
        zero_vector.copy_from_slice(src.gread_with::<&[u8]>(offset, 16)?);

        let mut guid = [0u8; 16];
        guid.copy_from_slice(src.gread_with::<&[u8]>(offset, 16)?);

        let fv_length = src.gread_with(offset, endian)?;

        let mut signature = [0u8; 4];
        signature.copy_from_slice(src.gread_with::<&[u8]>(offset, 4)?);

        let header = Header {
            zero_vector,
            file_system_guid: efi::Guid::from_bytes(&guid),
            fv_length,
            signature,
            attributes: src.gread_with(offset, endian)?,
            header_length: src.gread_with(offset, endian)?,
            checksum: src.gread_with(offset, endian)?,
            ext_header_offset: src.gread_with(offset, endian)?,
            reserved: src.gread_with(offset, endian)?,
            revision: src.gread_with(offset, endian)?,
        };
        Ok((header, *offset))
    }
}

impl ctx::TryIntoCtx<Endian> for Header {
    type Error = scroll::Error;

    fn try_into_ctx(self, dst: &mut [u8], endian: Endian) -> Result<usize, Self::Error> {
        let offset = &mut 0;
        dst.gwrite_with(&self.zero_vector[..], offset, ())?;
        dst.gwrite_with(&self.file_system_guid.as_bytes()[..], offset, ())?;
        dst.gwrite_with(self.fv_length, offset, endian)?;
        dst.gwrite_with(&self.signature[..], offset, ())?;
        dst.gwrite_with(self.attributes, offset, endian)?;
        dst.gwrite_with(self.header_length, offset, endian)?;
        dst.gwrite_with(self.checksum, offset, endian)?;
        dst.gwrite_with(self.ext_header_offset, offset, endian)?;
        dst.gwrite_with(self.reserved, offset, endian)?;
        dst.gwrite_with(self.revision, offset, endian)?;
        Ok(*offset)
    }
}

impl ctx::SizeWith<Endian> for Header {
    fn size_with(_: &Endian) -> usize {
        HEADER_SIZE
    }
}

/// Firmware volume block map entry describing physical layout
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Pread, Pwrite, SizeWith)]
pub struct BlockMapEntry {
    /// Number of blocks of this size
    pub num_blocks: u32,
    /// Length of each block
    pub length: u32,
}

impl BlockMapEntry {
    /// The `(0, 0)` entry that terminates a block map.
    pub const TERMINATOR: BlockMapEntry = BlockMapEntry { num_blocks: 0, length: 0 };

    /// Returns `true` for the `(0, 0)` terminator.
    pub fn is_terminator(&self) -> bool {
        *self == Self::TERMINATOR
    }
}
