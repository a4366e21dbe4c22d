//! Firmware File System (FFS) file records.
//!
//! The volume assembler only needs three things from a file record: its type (to find the padding file),
//! its serialized bytes, and a way to decode one from a bounded cursor. Those are the [`FileRecord`] and
//! [`FileRecordCodec`] traits. [`File`] and [`FfsFileCodec`] implement them for standard FFS (v1) files; the
//! section tree inside a file is kept as opaque content bytes.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

use alloc::vec::Vec;
use core::fmt;
use nanofw_pi::fw_fs::{
    self,
    ffs::{attributes, file},
};
use r_efi::efi;
use scroll::{Pread, Pwrite};

use crate::{
    FileRecordError,
    checksum::{checksum8, sum8},
    cursor::Cursor,
};

/// Files start at 8-byte aligned offsets within the data region.
pub const FILE_ALIGNMENT: usize = 8;

/// Value of the bytes between the end of a file and the next [`FILE_ALIGNMENT`] boundary.
pub const ALIGNMENT_FILL: u8 = 0xff;

/// A file record stored in the data region of a volume.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait FileRecord {
    /// The raw FFS file type.
    fn file_type(&self) -> u8;

    /// Whether this record is a pad file.
    fn is_padding(&self) -> bool {
        self.file_type() == file::raw::r#type::FFS_PAD
    }

    /// The complete on-disk encoding of the record, header included, without alignment fill.
    fn serialize(&self) -> Result<Vec<u8>, FileRecordError>;
}

/// Decodes file records from the data region.
pub trait FileRecordCodec {
    /// The record type produced.
    type Record: FileRecord;

    /// Decode one record at the cursor's read position.
    ///
    /// On success the cursor is advanced past the record and the alignment fill that follows it. The cursor
    /// is bounded by the data region, so a record can never claim bytes beyond it.
    fn decode(&self, cursor: &mut Cursor<'_>) -> Result<Self::Record, FileRecordError>;
}

/// Owned, editable FFS (v1) file.
///
/// Name, type, attributes and state are carried through unchanged; size, both checksums and the optional
/// tail are recomputed by [`FileRecord::serialize`]. The content never includes the tail.
#[derive(Clone, PartialEq, Eq)]
pub struct File {
    name: efi::Guid,
    file_type_raw: u8,
    attributes: u8,
    state: u8,
    fixed_checksum: u8,
    content: Vec<u8>,
}

impl File {
    /// Create an empty file in the DATA_VALID state (erase polarity 1).
    pub fn new(name: efi::Guid, file_type_raw: u8) -> Self {
        Self {
            name,
            file_type_raw,
            attributes: 0,
            state: file::STATE_DATA_VALID_ERASE_POLARITY_1,
            fixed_checksum: file::FIXED_CHECKSUM,
            content: Vec::new(),
        }
    }

    /// The file name GUID.
    pub fn name(&self) -> efi::Guid {
        self.name
    }

    /// The raw FFS file type byte.
    pub fn file_type_raw(&self) -> u8 {
        self.file_type_raw
    }

    /// The raw attributes byte.
    pub fn attributes_raw(&self) -> u8 {
        self.attributes
    }

    /// The raw state byte.
    pub fn state_raw(&self) -> u8 {
        self.state
    }

    /// `integrity_check_file` written when the data checksum attribute is clear.
    ///
    /// Decoded files keep the byte found on disk; new files use [`file::FIXED_CHECKSUM`].
    pub fn fixed_checksum(&self) -> u8 {
        self.fixed_checksum
    }

    /// The file content (the encoded section tree), excluding header and tail.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Mutable access to the file content.
    pub fn content_mut(&mut self) -> &mut Vec<u8> {
        &mut self.content
    }

    /// Replace the file content.
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
    }

    /// Enable or disable the data checksum attribute.
    pub fn set_data_checksum(&mut self, checksum: bool) {
        self.set_attribute(attributes::raw::CHECKSUM, checksum);
    }

    /// Returns `true` if the file content is covered by `integrity_check_file`.
    pub fn is_data_checksum(&self) -> bool {
        self.attributes & attributes::raw::CHECKSUM != 0
    }

    /// Enable or disable the file tail.
    pub fn set_tail(&mut self, tail: bool) {
        self.set_attribute(attributes::raw::TAIL_PRESENT, tail);
    }

    /// Returns `true` if the file is followed by a tail.
    pub fn has_tail(&self) -> bool {
        self.attributes & attributes::raw::TAIL_PRESENT != 0
    }

    /// Total encoded size in bytes (header, content and tail), without alignment fill.
    pub fn size(&self) -> usize {
        file::HEADER_SIZE + self.content.len() + self.tail_size()
    }

    fn tail_size(&self) -> usize {
        if self.has_tail() { file::TAIL_SIZE } else { 0 }
    }

    fn set_attribute(&mut self, attribute: u8, enable: bool) {
        if enable {
            self.attributes |= attribute;
        } else {
            self.attributes &= !attribute;
        }
    }
}

impl FileRecord for File {
    fn file_type(&self) -> u8 {
        self.file_type_raw
    }

    fn serialize(&self) -> Result<Vec<u8>, FileRecordError> {
        let size = self.size();
        if size > file::MAX_SIZE {
            Err(FileRecordError::TooLarge)?;
        }

        let mut header = file::Header {
            name: self.name,
            integrity_check_header: 0,
            integrity_check_file: 0,
            file_type: self.file_type_raw,
            attributes: self.attributes,
            size: [0u8; 3],
            state: 0,
        };
        header.set_size(size);

        let mut buffer = alloc::vec![0u8; size];

        // header checksum is taken with state and integrity_check_file zeroed.
        buffer.pwrite_with(header, 0, scroll::LE)?;
        header.integrity_check_header = checksum8(&buffer[..file::HEADER_SIZE]);
        header.integrity_check_file =
            if self.is_data_checksum() { checksum8(&self.content) } else { self.fixed_checksum };
        header.state = self.state;
        buffer.pwrite_with(header, 0, scroll::LE)?;

        let content_end = file::HEADER_SIZE + self.content.len();
        buffer[file::HEADER_SIZE..content_end].copy_from_slice(&self.content);
        if self.has_tail() {
            buffer.pwrite_with(header.tail(), content_end, scroll::LE)?;
        }
        Ok(buffer)
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("name", &fw_fs::guid_display(&self.name))
            .field("file_type", &format_args!("{:#04x}", self.file_type_raw))
            .field("attributes", &format_args!("{:#04x}", self.attributes))
            .field("state", &format_args!("{:#04x}", self.state))
            .field("content (bytes)", &self.content.len())
            .finish()
    }
}

/// Codec for standard FFS (v1) files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfsFileCodec;

impl FfsFileCodec {
    fn is_data_valid(state: u8) -> bool {
        // The reserved high bit follows the erase polarity; with polarity 1 all state bits are inverted.
        let state = if state & 0x80 == 0 { state } else { !state };
        state & !(file::raw::state::HEADER_CONSTRUCTION | file::raw::state::HEADER_VALID)
            == file::raw::state::DATA_VALID
    }
}

impl FileRecordCodec for FfsFileCodec {
    type Record = File;

    fn decode(&self, cursor: &mut Cursor<'_>) -> Result<File, FileRecordError> {
        let header: file::Header = cursor.peek()?;
        let size = header.size();
        let tail_size = if header.attributes & attributes::raw::TAIL_PRESENT == 0 { 0 } else { file::TAIL_SIZE };

        if size < file::HEADER_SIZE + tail_size {
            Err(FileRecordError::InvalidHeader)?;
        }
        let data = cursor.sub(0, size)?.as_slice();

        if !Self::is_data_valid(header.state) {
            Err(FileRecordError::InvalidState)?;
        }

        let sum = sum8(&data[..file::HEADER_SIZE])
            .wrapping_sub(header.state)
            .wrapping_sub(header.integrity_check_file);
        if sum != 0 {
            Err(FileRecordError::InvalidHeader)?;
        }

        let content = &data[file::HEADER_SIZE..size - tail_size];
        let data_checksum = header.attributes & attributes::raw::CHECKSUM != 0;
        if data_checksum && sum8(content).wrapping_add(header.integrity_check_file) != 0 {
            Err(FileRecordError::DataCorrupt)?;
        }

        if tail_size != 0 && data.pread_with::<u16>(size - tail_size, scroll::LE)? != header.tail() {
            Err(FileRecordError::DataCorrupt)?;
        }

        // the last file of a region may end without its alignment fill.
        let end = size.next_multiple_of(FILE_ALIGNMENT).min(cursor.remaining());
        if cursor.sub(size, end - size)?.as_slice().iter().any(|&byte| byte != ALIGNMENT_FILL) {
            Err(FileRecordError::InvalidHeader)?;
        }
        cursor.advance(end)?;

        Ok(File {
            name: header.name,
            file_type_raw: header.file_type,
            attributes: header.attributes,
            state: header.state,
            fixed_checksum: if data_checksum { file::FIXED_CHECKSUM } else { header.integrity_check_file },
            content: content.to_vec(),
        })
    }
}
