//! Parsing and re-encoding of embedded-device Firmware Volume boot images.
//!
//! A boot image is a single Firmware Volume: a fixed header, a two-entry block map, a data region holding a
//! sequence of Firmware File System (FFS) files, and an opaque trailing blob carrying the signature and
//! certificate chain. [`volume::Volume`] decodes such an image into an editable tree and serializes it back,
//! recomputing the block map and header checksum.
//!
//! ```rust no_run
//! use nanofw_ffs::volume::Volume;
//!
//! # fn repack(image: &[u8]) -> Result<Vec<u8>, nanofw_ffs::FirmwareVolumeError> {
//! let mut volume = Volume::parse(image)?;
//! volume.custom_mut().clear();
//! volume.serialize()
//! # }
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
#![cfg_attr(all(not(test), not(feature = "mockall")), no_std)]

extern crate alloc;

pub mod block_map;
pub mod checksum;
pub mod cursor;
pub mod err;
pub mod file;
pub mod header;
pub mod volume;

pub use err::{FileRecordError, FirmwareVolumeError};
