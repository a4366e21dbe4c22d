//! Bounded, zero-copy reader over a byte region.
//!
//! A [`Cursor`] is a `(buffer, start, end)` view. Carving a sub-region with [`Cursor::sub`] narrows the
//! bounds without copying, so a nested decoder can never read past the bytes it was handed.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
use scroll::{ctx, Endian, Pread};

/// Zero-copy view over a bounded region of a byte buffer with a read position.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    buffer: &'a [u8],
    start: usize,
    end: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor spanning all of `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, start: 0, end: buffer.len() }
    }

    /// Number of unread bytes left in the region.
    pub fn remaining(&self) -> usize {
        self.end - self.start
    }

    /// Absolute offset of the read position within the root buffer.
    pub fn offset(&self) -> usize {
        self.start
    }

    /// The unread bytes of the region.
    pub fn as_slice(&self) -> &'a [u8] {
        &self.buffer[self.start..self.end]
    }

    /// Carve a view of `length` bytes beginning `offset` bytes past the read position.
    ///
    /// The read position of `self` is left unchanged.
    pub fn sub(&self, offset: usize, length: usize) -> Result<Cursor<'a>, scroll::Error> {
        let start = self.bounded(offset)?;
        let end = start
            .checked_add(length)
            .filter(|end| *end <= self.end)
            .ok_or(scroll::Error::TooBig { size: length, len: self.end - start })?;
        Ok(Cursor { buffer: self.buffer, start, end })
    }

    /// Move the read position forward by `count` bytes.
    pub fn advance(&mut self, count: usize) -> Result<(), scroll::Error> {
        if count > self.remaining() {
            return Err(scroll::Error::TooBig { size: count, len: self.remaining() });
        }
        self.start += count;
        Ok(())
    }

    /// Borrow the next `count` bytes and advance past them.
    pub fn take(&mut self, count: usize) -> Result<&'a [u8], scroll::Error> {
        let bytes = self.sub(0, count)?.as_slice();
        self.start += count;
        Ok(bytes)
    }

    /// Borrow everything left in the region, leaving the cursor empty.
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let bytes = self.as_slice();
        self.start = self.end;
        bytes
    }

    /// Decode a little-endian `T` at the read position without advancing.
    pub fn peek<T>(&self) -> Result<T, scroll::Error>
    where
        T: ctx::TryFromCtx<'a, Endian, Error = scroll::Error>,
    {
        self.as_slice().pread_with(0, scroll::LE)
    }

    /// Decode a little-endian `T` at the read position and advance past it.
    pub fn read<T>(&mut self) -> Result<T, scroll::Error>
    where
        T: ctx::TryFromCtx<'a, Endian, Error = scroll::Error>,
    {
        let mut offset = 0;
        let value = self.as_slice().gread_with(&mut offset, scroll::LE)?;
        self.start += offset;
        Ok(value)
    }

    fn bounded(&self, offset: usize) -> Result<usize, scroll::Error> {
        if offset > self.remaining() {
            return Err(scroll::Error::BadOffset(offset));
        }
        Ok(self.start + offset)
    }
}

impl core::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("buffer_len", &self.buffer.len())
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}
