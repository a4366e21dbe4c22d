//! Firmware File System (FFS) Definitions
//!
//! Only the file layer is described here. Sections nested inside a file are carried as opaque bytes by the
//! codec.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
pub mod attributes;
pub mod file;
