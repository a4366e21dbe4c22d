//! Firmware Storage Definitions
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
pub mod ffs;
pub mod fv;

/// Renders a GUID in registry format (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`) for diagnostics.
pub fn guid_display(guid: &r_efi::efi::Guid) -> uuid::fmt::Hyphenated {
    uuid::Uuid::from_bytes_le(*guid.as_bytes()).hyphenated()
}
