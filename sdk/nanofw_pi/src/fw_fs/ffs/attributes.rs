//! Firmware File System (FFS) File Attribute Definitions
//!
//! Only the bits interpreted by the codec are defined. The remaining bits (alignment, fixed placement) are
//! carried through as part of the raw attribute byte.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

/// Raw FFS (v1) attribute bits (EFI_FFS_FILE_ATTRIBUTES)
pub mod raw {
    /// File is followed by a 16-bit tail holding the complement of the integrity check bytes
    pub const TAIL_PRESENT: u8 = 0x01;
    /// File data is covered by `integrity_check_file`
    pub const CHECKSUM: u8 = 0x40;
}
