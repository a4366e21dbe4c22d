//! Platform Initialization (PI) style definitions for embedded-device Firmware Volumes.
//!
//! This crate only describes the raw on-disk structures and their little-endian encodings. Parsing and
//! composition of whole volumes lives in `nanofw_ffs`.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
#![cfg_attr(not(test), no_std)]

pub mod fw_fs;
