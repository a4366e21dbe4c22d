//! Error types for Firmware Volume parsing and serialization.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
use core::fmt;

/// Errors raised by a file record codec while decoding or encoding a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRecordError {
    /// The file header or the size it declares runs past the bytes available.
    Truncated,
    /// The file header is malformed (size smaller than the header, bad header checksum).
    InvalidHeader,
    /// The file state is not DATA_VALID.
    InvalidState,
    /// The file data checksum does not match.
    DataCorrupt,
    /// The file is too large to be encoded.
    TooLarge,
}

impl fmt::Display for FileRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRecordError::Truncated => write!(f, "file record truncated"),
            FileRecordError::InvalidHeader => write!(f, "invalid file header"),
            FileRecordError::InvalidState => write!(f, "file state is not DATA_VALID"),
            FileRecordError::DataCorrupt => write!(f, "file data checksum mismatch"),
            FileRecordError::TooLarge => write!(f, "file too large"),
        }
    }
}

impl core::error::Error for FileRecordError {}

impl From<scroll::Error> for FileRecordError {
    fn from(_: scroll::Error) -> Self {
        FileRecordError::Truncated
    }
}

/// Error definitions for Firmware Volume processing
///
/// Every error is terminal for the operation that raised it; no partially decoded volume or partially
/// encoded image is ever returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareVolumeError {
    /// The file system GUID or signature does not identify a supported Firmware Volume.
    UnsupportedFormat,
    /// The volume header is truncated or a header field is out of range.
    MalformedHeader,
    /// The block map is misaligned, truncated, not terminated, or not the supported two-entry form.
    MalformedBlockMap,
    /// The file at `index` (0-based, on-disk order) failed to decode.
    MalformedFile {
        /// Index of the failing file.
        index: usize,
        /// The underlying codec failure.
        cause: FileRecordError,
    },
    /// The file at `index` failed to serialize.
    SerializeFailed {
        /// Index of the failing file.
        index: usize,
        /// The underlying codec failure.
        cause: FileRecordError,
    },
    /// The requested operation is not implemented for this volume.
    UnsupportedOperation,
}

impl fmt::Display for FirmwareVolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirmwareVolumeError::UnsupportedFormat => write!(f, "volume header: unsupported format"),
            FirmwareVolumeError::MalformedHeader => write!(f, "volume header: malformed"),
            FirmwareVolumeError::MalformedBlockMap => write!(f, "volume block map: malformed"),
            FirmwareVolumeError::MalformedFile { index, cause } => write!(f, "reading file {index} failed: {cause}"),
            FirmwareVolumeError::SerializeFailed { index, cause } => write!(f, "file {index}: {cause}"),
            FirmwareVolumeError::UnsupportedOperation => {
                write!(f, "unsupported operation: volume has no padding file")
            }
        }
    }
}

impl core::error::Error for FirmwareVolumeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            FirmwareVolumeError::MalformedFile { cause, .. } | FirmwareVolumeError::SerializeFailed { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }
}
