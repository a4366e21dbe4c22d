//! Firmware Volume (FV) parsing and re-encoding.
//!
//! [`Volume::parse`] decodes a complete boot image top-down: header, block map, data region, the file
//! records filling the data region, and the opaque trailing blob. [`Volume::serialize`] rebuilds an image
//! bottom-up from the (possibly edited) files: file sizes determine the block map, and the header checksum
//! is computed over the header and block map last.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!
use alloc::vec::Vec;
use core::fmt;
use nanofw_pi::fw_fs::fv::{self, BlockMapEntry};

use crate::{
    FileRecordError, FirmwareVolumeError,
    block_map::{self, ENCODED_HEADER_LENGTH, VendorQuirks},
    checksum::{checksum16, sum16},
    cursor::Cursor,
    file::{ALIGNMENT_FILL, FILE_ALIGNMENT, FfsFileCodec, File, FileRecord, FileRecordCodec},
    header,
};

/// Owned, editable Firmware Volume.
///
/// Files are kept in on-disk order. The trailing `custom` blob (signature and certificate chain) is
/// carried verbatim and never interpreted.
pub struct Volume<R = File> {
    header: fv::Header,
    files: Vec<R>,
    custom: Vec<u8>,
    quirks: VendorQuirks,
}

impl Volume<File> {
    /// Parse a boot image using the FFS file codec and the default [`VendorQuirks`].
    ///
    /// ## Examples
    ///
    /// ```rust no_run
    /// use nanofw_ffs::{file::FileRecord, volume::Volume};
    ///
    /// # fn dump(image: &[u8]) -> Result<(), nanofw_ffs::FirmwareVolumeError> {
    /// let volume = Volume::parse(image)?;
    /// for file in volume.files() {
    ///     println!("{:?} padding={}", file, file.is_padding());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, FirmwareVolumeError> {
        Self::parse_with(buffer, &FfsFileCodec, VendorQuirks::DEFAULT)
    }
}

impl<R: FileRecord> Volume<R> {
    /// Create a volume holding `files` with a default header, no trailing blob and the default
    /// [`VendorQuirks`].
    pub fn new(files: Vec<R>) -> Self {
        Self {
            header: fv::Header {
                zero_vector: [0u8; 16],
                file_system_guid: fv::guid::EFI_FIRMWARE_FILE_SYSTEM_GUID,
                fv_length: 0,
                signature: fv::SIGNATURE,
                attributes: 0,
                header_length: ENCODED_HEADER_LENGTH,
                checksum: 0,
                ext_header_offset: 0,
                reserved: 0,
                revision: 0,
            },
            files,
            custom: Vec::new(),
            quirks: VendorQuirks::DEFAULT,
        }
    }

    /// Use `quirks` for serialization.
    pub fn with_quirks(mut self, quirks: VendorQuirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// Parse a boot image, decoding file records with `codec`.
    ///
    /// Parsing stops at the first failure. File failures are reported with the 0-based index of the
    /// offending file.
    pub fn parse_with<C>(buffer: &[u8], codec: &C, quirks: VendorQuirks) -> Result<Self, FirmwareVolumeError>
    where
        C: FileRecordCodec<Record = R>,
    {
        let mut cursor = Cursor::new(buffer);

        let header = header::decode(&mut cursor)?;
        let block_map = block_map::decode(&mut cursor, header.header_length)?;
        if let Some(bytes) = buffer.get(..header.header_length as usize) {
            if sum16(bytes) != 0 {
                log::debug!("header checksum {:#06x} does not sum to zero; ignored", header.checksum);
            }
        }

        let data_size = block_map::data_region_length(&block_map, &quirks)? as usize;
        let mut data = cursor.sub(0, data_size).map_err(|_| {
            log::error!("data region of {data_size:#x} bytes exceeds image ({:#x} bytes left)", cursor.remaining());
            FirmwareVolumeError::MalformedBlockMap
        })?;
        cursor.advance(data_size).map_err(|_| FirmwareVolumeError::MalformedBlockMap)?;
        log::debug!("data size: {data_size} bytes");

        let custom = cursor.read_to_end().to_vec();
        if let Some(expected) = quirks.trailer_size {
            if custom.len() != expected {
                log::warn!("trailing data of {} bytes, expected {expected}", custom.len());
            }
        }

        let mut files = Vec::new();
        while data.remaining() != 0 {
            let index = files.len();
            let offset = data.offset();
            let remaining = data.remaining();

            let file = codec.decode(&mut data).map_err(|cause| {
                log::error!("reading file {index} at offset {offset:#x} failed: {cause}");
                FirmwareVolumeError::MalformedFile { index, cause }
            })?;

            // a record that consumes nothing would never exhaust the region.
            if data.remaining() == remaining {
                Err(FirmwareVolumeError::MalformedFile { index, cause: FileRecordError::InvalidHeader })?;
            }
            files.push(file);
        }
        log::debug!("{} files", files.len());

        Ok(Self { header, files, custom, quirks })
    }

    /// The header as decoded (or as built by [`Volume::new`]).
    ///
    /// `fv_length`, `header_length`, `checksum` and `ext_header_offset` are recomputed on serialize and
    /// may not describe the current contents.
    pub fn header(&self) -> &fv::Header {
        &self.header
    }

    /// Mutable access to the header. The reserved vector, attributes, reserved byte and revision are
    /// written out as set here.
    pub fn header_mut(&mut self) -> &mut fv::Header {
        &mut self.header
    }

    /// The file records in on-disk order.
    pub fn files(&self) -> &[R] {
        &self.files
    }

    /// Mutable access to the file records. Order is preserved on serialize.
    pub fn files_mut(&mut self) -> &mut Vec<R> {
        &mut self.files
    }

    /// The trailing signature/certificate blob.
    pub fn custom(&self) -> &[u8] {
        &self.custom
    }

    /// Mutable access to the trailing blob.
    pub fn custom_mut(&mut self) -> &mut Vec<u8> {
        &mut self.custom
    }

    /// Replace the trailing blob.
    pub fn set_custom(&mut self, custom: Vec<u8>) {
        self.custom = custom;
    }

    /// The device-family constants used for this volume.
    pub fn quirks(&self) -> &VendorQuirks {
        &self.quirks
    }

    /// Index of the padding file that absorbs size changes: the last pad file in the volume.
    pub fn padding_index(&self) -> Option<usize> {
        self.files.iter().rposition(|file| file.is_padding())
    }

    /// Serialize the volume into a boot image.
    ///
    /// The block map is rebuilt from the file sizes using [`VendorQuirks::block_size`], and the header
    /// length, volume length, extended header offset and checksum are recomputed. The volume itself is
    /// not modified.
    ///
    /// Fails with [`FirmwareVolumeError::UnsupportedOperation`] if the volume contains no pad file;
    /// synthesizing one is not supported.
    pub fn serialize(&self) -> Result<Vec<u8>, FirmwareVolumeError> {
        let Some(padding_index) = self.padding_index() else {
            log::error!("volume has no padding file");
            return Err(FirmwareVolumeError::UnsupportedOperation);
        };
        log::debug!("padding file: {padding_index}");

        let file_data = self
            .files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let mut data = file.serialize().map_err(|cause| {
                    log::error!("file {index}: {cause}");
                    FirmwareVolumeError::SerializeFailed { index, cause }
                })?;
                data.resize(data.len().next_multiple_of(FILE_ALIGNMENT), ALIGNMENT_FILL);
                Ok(data)
            })
            .collect::<Result<Vec<_>, FirmwareVolumeError>>()?;
        let files_size: usize = file_data.iter().map(Vec::len).sum();

        let total_size = files_size + ENCODED_HEADER_LENGTH as usize;
        let block_map = block_map::synthesize(total_size, &self.quirks)?;

        let block_size = self.quirks.block_size as usize;
        let padding_needed = (block_size - files_size % block_size) % block_size;
        let short = (block_size - total_size % block_size) % block_size;
        if short != 0 {
            log::warn!(
                "data region of {files_size:#x} bytes is not block aligned; padding file {padding_index} is {short} bytes short"
            );
        }

        let header = fv::Header {
            fv_length: (files_size + padding_needed) as u64,
            header_length: ENCODED_HEADER_LENGTH,
            checksum: 0,
            ext_header_offset: 0,
            ..self.header
        };
        let header = fv::Header { checksum: checksum16(&encode_header(&header, &block_map)?), ..header };

        let mut buffer = encode_header(&header, &block_map)?;
        debug_assert_eq!(sum16(&buffer), 0);

        buffer.reserve(files_size + self.custom.len());
        for data in &file_data {
            buffer.extend_from_slice(data);
        }
        buffer.extend_from_slice(&self.custom);
        Ok(buffer)
    }
}

fn encode_header(header: &fv::Header, block_map: &[BlockMapEntry]) -> Result<Vec<u8>, FirmwareVolumeError> {
    let mut buffer = header::encode(header)?;
    buffer.extend(block_map::encode(block_map)?);
    Ok(buffer)
}

impl TryFrom<&[u8]> for Volume<File> {
    type Error = FirmwareVolumeError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl<R: fmt::Debug> fmt::Debug for Volume<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Volume")
            .field("header", &self.header)
            .field("files", &self.files)
            .field("custom (bytes)", &self.custom.len())
            .field("quirks", &self.quirks)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use log::{self, Level, LevelFilter, Metadata, Record};
    use nanofw_pi::fw_fs::{
        ffs,
        fv::{self, BlockMapEntry},
    };
    use r_efi::efi;
    use scroll::{Pread, Pwrite};
    use serde::Deserialize;
    use std::{env, error::Error, fs, path::Path};
    use uuid::Uuid;

    use crate::{
        FileRecordError, FirmwareVolumeError,
        block_map::VendorQuirks,
        checksum::{checksum16, sum16},
        file::{ALIGNMENT_FILL, FILE_ALIGNMENT, File, FileRecord, MockFileRecord},
        volume::Volume,
    };

    #[derive(Debug, Deserialize, Clone)]
    struct VolumeFixture {
        zero_vector_fill: u8,
        reserved: u8,
        attributes: u32,
        revision: u8,
        block_count: u32,
        block_size: u32,
        trailer_size: usize,
        trailer_fill: u8,
        files: Vec<FileFixture>,
        expected: ExpectedValues,
    }

    #[derive(Debug, Deserialize, Clone)]
    struct FileFixture {
        name: String,
        file_type: u8,
        data_checksum: bool,
        content_size: usize,
        content_fill: u8,
    }

    #[derive(Debug, Deserialize, Clone)]
    struct ExpectedValues {
        data_region_length: usize,
        fv_length: u64,
        block_map: (u32, u32),
    }

    // Sample logger for log crate to dump stuff in tests
    struct SimpleLogger;
    impl log::Log for SimpleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Info
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                println!("{}", record.args());
            }
        }

        fn flush(&self) {}
    }
    static LOGGER: SimpleLogger = SimpleLogger;

    fn set_logger() {
        let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Info));
    }

    fn load_fixture(name: &str) -> Result<VolumeFixture, Box<dyn Error>> {
        let root = Path::new(&env::var("CARGO_MANIFEST_DIR")?).join("test_resources");
        Ok(serde_yaml::from_reader(fs::File::open(root.join(name))?)?)
    }

    fn fixture_files(fixture: &VolumeFixture) -> Result<Vec<File>, Box<dyn Error>> {
        fixture
            .files
            .iter()
            .map(|x| {
                let name = Uuid::parse_str(&x.name).map_err(|err| err.to_string())?;
                let name = efi::Guid::from_bytes(&name.to_bytes_le());
                let mut file = File::new(name, x.file_type);
                file.set_data_checksum(x.data_checksum);
                file.set_content(vec![x.content_fill; x.content_size]);
                Ok(file)
            })
            .collect()
    }

    fn fixture_header(fixture: &VolumeFixture, fv_length: u64, header_length: u16) -> fv::Header {
        fv::Header {
            zero_vector: [fixture.zero_vector_fill; 16],
            file_system_guid: fv::guid::EFI_FIRMWARE_FILE_SYSTEM_GUID,
            fv_length,
            signature: fv::SIGNATURE,
            attributes: fixture.attributes,
            header_length,
            checksum: 0,
            ext_header_offset: 0,
            reserved: fixture.reserved,
            revision: fixture.revision,
        }
    }

    /// Lay out an image the way the vendor tooling does, independently of `Volume::serialize`.
    fn build_image(header: fv::Header, block_map: &[BlockMapEntry], files: &[File], custom: &[u8]) -> Vec<u8> {
        let header_length = fv::HEADER_SIZE + block_map.len() * fv::BLOCK_MAP_ENTRY_SIZE;
        let mut image = vec![0u8; header_length];
        image.pwrite_with(header, 0, scroll::LE).unwrap();
        for (idx, entry) in block_map.iter().enumerate() {
            image.pwrite_with(*entry, fv::HEADER_SIZE + idx * fv::BLOCK_MAP_ENTRY_SIZE, scroll::LE).unwrap();
        }
        let checksum = image
            .chunks_exact(2)
            .fold(0u16, |sum, value| sum.wrapping_add(u16::from_le_bytes(value.try_into().unwrap())));
        image.pwrite_with(0u16.wrapping_sub(checksum), fv::CHECKSUM_OFFSET, scroll::LE).unwrap();

        for file in files {
            image.extend(file.serialize().unwrap());
            while image.len() % 8 != 0 {
                image.push(0xff);
            }
        }
        image.extend_from_slice(custom);
        image
    }

    fn fixture_image(fixture: &VolumeFixture) -> Result<Vec<u8>, Box<dyn Error>> {
        let block_map = [
            BlockMapEntry { num_blocks: fixture.block_count, length: fixture.block_size },
            BlockMapEntry::TERMINATOR,
        ];
        let data_size = (fixture.block_count * fixture.block_size) as u64;
        let header = fixture_header(fixture, data_size, 0x48);
        let custom = vec![fixture.trailer_fill; fixture.trailer_size];
        Ok(build_image(header, &block_map, &fixture_files(fixture)?, &custom))
    }

    fn check_fixture(name: &str) -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture(name)?;
        let image = fixture_image(&fixture)?;

        let volume = Volume::parse(&image)?;
        assert_eq!(volume.files(), fixture_files(&fixture)?.as_slice(), "[{name}] file sequence");
        assert_eq!(volume.custom(), vec![fixture.trailer_fill; fixture.trailer_size].as_slice(), "[{name}] custom");
        assert_eq!(volume.header().attributes, fixture.attributes, "[{name}] attributes");
        assert_eq!(volume.header().revision, fixture.revision, "[{name}] revision");
        assert_eq!(volume.header().zero_vector, [fixture.zero_vector_fill; 16], "[{name}] zero vector");
        assert_eq!(volume.header().reserved, fixture.reserved, "[{name}] reserved");

        let data_region_length: usize = volume.files().iter().map(|x| x.size().next_multiple_of(8)).sum();
        assert_eq!(data_region_length, fixture.expected.data_region_length, "[{name}] data region length");

        let output = volume.serialize()?;
        let reparsed = Volume::parse(&output)?;
        assert_eq!(reparsed.files(), volume.files(), "[{name}] file sequence after round trip");
        assert_eq!(reparsed.custom(), volume.custom(), "[{name}] custom after round trip");
        assert_eq!(reparsed.header().fv_length, fixture.expected.fv_length, "[{name}] fv_length");
        assert_eq!(reparsed.header().zero_vector, volume.header().zero_vector, "[{name}] zero vector after round trip");
        assert_eq!(reparsed.header().reserved, volume.header().reserved, "[{name}] reserved after round trip");
        assert_eq!(reparsed.header().attributes, volume.header().attributes, "[{name}] attributes after round trip");

        let (num_blocks, length) = fixture.expected.block_map;
        assert_eq!(
            &output[fv::HEADER_SIZE..0x48],
            &[num_blocks.to_le_bytes(), length.to_le_bytes(), [0u8; 4], [0u8; 4]].concat()[..],
            "[{name}] block map"
        );
        Ok(())
    }

    fn mock_file(padding: bool, data: Result<Vec<u8>, FileRecordError>) -> MockFileRecord {
        let mut file = MockFileRecord::new();
        file.expect_is_padding().return_const(padding);
        file.expect_file_type().return_const(if padding { ffs::file::raw::r#type::FFS_PAD } else { ffs::file::raw::r#type::DRIVER });
        file.expect_serialize().return_once(move || data);
        file
    }

    #[test]
    fn test_fixture_volume() -> Result<(), Box<dyn Error>> {
        check_fixture("two_block_volume.yml")
    }

    #[test]
    fn test_fixture_volume_is_requantized() -> Result<(), Box<dyn Error>> {
        check_fixture("large_block_volume.yml")
    }

    #[test]
    fn test_unedited_volume_is_byte_exact() -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture("two_block_volume.yml")?;
        let image = fixture_image(&fixture)?;
        assert_ne!(fixture.zero_vector_fill, 0);
        assert_ne!(fixture.reserved, 0);
        assert_eq!(Volume::parse(&image)?.serialize()?, image);
        Ok(())
    }

    #[test]
    fn test_checksum_is_self_consistent() -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture("large_block_volume.yml")?;
        let output = Volume::parse(&fixture_image(&fixture)?)?.serialize()?;

        let mut header = output[..0x48].to_vec();
        assert_eq!(sum16(&header), 0);
        let stored = u16::from_le_bytes([header[fv::CHECKSUM_OFFSET], header[fv::CHECKSUM_OFFSET + 1]]);
        header[fv::CHECKSUM_OFFSET..fv::CHECKSUM_OFFSET + 2].fill(0);
        assert_eq!(checksum16(&header), stored);
        Ok(())
    }

    #[test]
    fn test_malformed_firmware_volume() -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture("two_block_volume.yml")?;

        // bogus signature.
        let mut image = fixture_image(&fixture)?;
        image[0x2a] ^= 0x10;
        assert_eq!(Volume::parse(&image).unwrap_err(), FirmwareVolumeError::UnsupportedFormat);

        // bogus filesystem guid.
        let mut image = fixture_image(&fixture)?;
        image[0x10] ^= 0xff;
        assert_eq!(Volume::parse(&image).unwrap_err(), FirmwareVolumeError::UnsupportedFormat);

        // bogus header_length.
        let mut image = fixture_image(&fixture)?;
        image.pwrite_with(0x30u16, 0x30, scroll::LE).unwrap();
        assert_eq!(Volume::parse(&image).unwrap_err(), FirmwareVolumeError::MalformedHeader);

        // truncated header.
        let image = fixture_image(&fixture)?;
        assert_eq!(Volume::parse(&image[..0x20]).unwrap_err(), FirmwareVolumeError::MalformedHeader);

        // three entry block map.
        let block_map = [
            BlockMapEntry { num_blocks: 2, length: 256 },
            BlockMapEntry { num_blocks: 1, length: 512 },
            BlockMapEntry { num_blocks: 1, length: 1024 },
        ];
        let image = build_image(fixture_header(&fixture, 0, 0x50), &block_map, &fixture_files(&fixture)?, &[]);
        assert_eq!(Volume::parse(&image).unwrap_err(), FirmwareVolumeError::MalformedBlockMap);

        // data region larger than the image.
        let image = fixture_image(&fixture)?;
        assert_eq!(Volume::parse(&image[..0x100]).unwrap_err(), FirmwareVolumeError::MalformedBlockMap);

        Ok(())
    }

    #[test]
    fn test_stray_bytes_after_last_file() -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture("two_block_volume.yml")?;
        let mut files = fixture_files(&fixture)?;

        // shrink the padding file so that 8 stray bytes end the data region.
        let pad = files.last_mut().unwrap();
        let pad_len = pad.content().len();
        pad.content_mut().truncate(pad_len - 8);
        let block_map = [BlockMapEntry { num_blocks: 2, length: 256 }, BlockMapEntry::TERMINATOR];
        let mut image = build_image(fixture_header(&fixture, 512, 0x48), &block_map, &files, &[]);
        image.extend_from_slice(&[0x5a; 8]);

        assert_eq!(
            Volume::parse(&image).unwrap_err(),
            FirmwareVolumeError::MalformedFile { index: 3, cause: FileRecordError::Truncated }
        );
        Ok(())
    }

    #[test]
    fn test_stray_bytes_inside_alignment_gap() -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture("two_block_volume.yml")?;
        let block_map = [BlockMapEntry { num_blocks: 2, length: 256 }, BlockMapEntry::TERMINATOR];

        // a single pad file ending 1..=7 bytes short of the 440 byte data region.
        for stray in 1..FILE_ALIGNMENT {
            let mut pad = File::new(efi::Guid::from_bytes(&[0xff; 16]), ffs::file::raw::r#type::FFS_PAD);
            pad.set_content(vec![0xff; 440 - 24 - stray]);
            let mut image = build_image(fixture_header(&fixture, 512, 0x48), &block_map, &[], &[]);
            image.extend(pad.serialize()?);
            image.extend(core::iter::repeat(0x5a).take(stray));

            assert_eq!(
                Volume::parse(&image).unwrap_err(),
                FirmwareVolumeError::MalformedFile { index: 0, cause: FileRecordError::InvalidHeader },
                "{stray} stray bytes"
            );

            // the same gap holding fill bytes is accepted.
            let fill = image.len() - stray;
            image[fill..].fill(ALIGNMENT_FILL);
            assert_eq!(Volume::parse(&image)?.files().len(), 1, "{stray} fill bytes");
        }
        Ok(())
    }

    #[test]
    fn test_stray_bytes_between_files() -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture("two_block_volume.yml")?;
        let mut image = fixture_image(&fixture)?;

        // the second file is 101 bytes long; its alignment gap is the 3 bytes that follow.
        image[0x48 + 64 + 101] = 0x00;
        assert_eq!(
            Volume::parse(&image).unwrap_err(),
            FirmwareVolumeError::MalformedFile { index: 1, cause: FileRecordError::InvalidHeader }
        );
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_indexed() -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture("two_block_volume.yml")?;
        let mut image = fixture_image(&fixture)?;

        // flip a content byte of the second (data-checksummed) file.
        image[0x48 + 64 + 24] ^= 0x01;
        assert_eq!(
            Volume::parse(&image).unwrap_err(),
            FirmwareVolumeError::MalformedFile { index: 1, cause: FileRecordError::DataCorrupt }
        );
        Ok(())
    }

    #[test]
    fn test_trailer_size_mismatch_is_not_fatal() -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture("two_block_volume.yml")?;
        let mut image = fixture_image(&fixture)?;
        image.truncate(image.len() - 100);

        let volume = Volume::parse(&image)?;
        assert_eq!(volume.custom().len(), fixture.trailer_size - 100);
        Ok(())
    }

    #[test]
    fn test_edited_volume_round_trips() -> Result<(), Box<dyn Error>> {
        set_logger();
        let fixture = load_fixture("two_block_volume.yml")?;
        let mut volume = Volume::parse(&fixture_image(&fixture)?)?;
        let before = *volume.header();

        // grow the first file by 16 bytes and take them out of the padding file.
        volume.files_mut()[0].content_mut().extend_from_slice(&[0xa5; 16]);
        let pad = volume.padding_index().unwrap();
        let pad_len = volume.files()[pad].content().len();
        volume.files_mut()[pad].content_mut().truncate(pad_len - 16);
        volume.set_custom(b"new certificate chain".to_vec());

        let output = volume.serialize()?;
        assert_eq!(*volume.header(), before);

        let reparsed = Volume::parse(&output)?;
        assert_eq!(reparsed.files(), volume.files());
        assert_eq!(reparsed.custom(), b"new certificate chain");
        Ok(())
    }

    #[test]
    fn test_no_padding_file_is_unsupported() {
        set_logger();
        let mut file = MockFileRecord::new();
        file.expect_is_padding().return_const(false);
        file.expect_serialize().never();

        let volume = Volume::new(vec![file]);
        assert_eq!(volume.serialize().unwrap_err(), FirmwareVolumeError::UnsupportedOperation);
    }

    #[test]
    fn test_serialize_failure_is_indexed() {
        set_logger();
        let volume = Volume::new(vec![
            mock_file(false, Ok(vec![0u8; 24])),
            mock_file(true, Err(FileRecordError::TooLarge)),
            mock_file(false, Ok(vec![0u8; 24])),
        ]);
        assert_eq!(
            volume.serialize().unwrap_err(),
            FirmwareVolumeError::SerializeFailed { index: 1, cause: FileRecordError::TooLarge }
        );
    }

    #[test]
    fn test_serialize_layout() -> Result<(), Box<dyn Error>> {
        set_logger();
        let mut volume =
            Volume::new(vec![mock_file(false, Ok(vec![0x11u8; 20])), mock_file(true, Ok(vec![0x22u8; 160]))]);
        volume.set_custom(vec![0xcc; 4]);
        volume.header_mut().attributes = 0x0004_feff;
        assert_eq!(volume.padding_index(), Some(1));

        let output = volume.serialize()?;
        // 0x48 header, 24 + 160 file bytes, 4 trailing.
        assert_eq!(output.len(), 0x48 + 184 + 4);

        let header: fv::Header = output.as_slice().pread_with(0, scroll::LE).unwrap();
        assert_eq!(header.fv_length, 184 + 72);
        assert_eq!(header.header_length, 0x48);
        assert_eq!(header.ext_header_offset, 0);
        assert_eq!(header.attributes, 0x0004_feff);
        assert_eq!(&output[fv::HEADER_SIZE..0x48], &[1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        assert_eq!(&output[0x48..0x48 + 20], &[0x11; 20]);
        assert_eq!(&output[0x48 + 20..0x48 + 24], &[0xff; 4]);
        assert_eq!(&output[0x48 + 24..0x48 + 184], &[0x22; 160]);
        assert_eq!(&output[0x48 + 184..], &[0xcc; 4]);
        Ok(())
    }

    #[test]
    fn test_custom_quirks_drive_block_map() -> Result<(), Box<dyn Error>> {
        set_logger();
        let quirks = VendorQuirks { block_size: 512, ..VendorQuirks::DEFAULT };
        let volume = Volume::new(vec![mock_file(true, Ok(vec![0u8; 952]))]).with_quirks(quirks);

        let output = volume.serialize()?;
        let entry: BlockMapEntry = output.as_slice().pread_with(fv::HEADER_SIZE, scroll::LE).unwrap();
        assert_eq!(entry, BlockMapEntry { num_blocks: 2, length: 512 });

        let reparsed = Volume::parse_with(&output, &crate::file::FfsFileCodec, quirks);
        // the mock bytes are not an FFS file.
        assert!(matches!(reparsed, Err(FirmwareVolumeError::MalformedFile { index: 0, .. })));
        Ok(())
    }

}
