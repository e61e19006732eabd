//! Archive container access - a single read/write handle over a ZIP stream
//!
//! This module owns everything binary: central directory parsing (classic and
//! ZIP64), local header handling, compression and checksums. The navigation
//! layers above only ever consume the capability set exposed here: list entry
//! names, look up entry metadata, read or append an entry, query/set the
//! associated on-disk file name.

use crate::error::{Result, ZipPathError};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use indexmap::IndexMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// ZIP local file header signature
const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;

/// ZIP central directory signature
const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x02014b50;

/// ZIP end of central directory signature
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x06054b50;

/// ZIP64 end of central directory record signature
const ZIP64_END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x06064b50;

/// Compression method used when writing entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// No compression (stored)
    Stored,
    /// DEFLATE compression (most common)
    Deflate,
    /// Zstd compression (requires zstd-support feature)
    #[cfg(feature = "zstd-support")]
    Zstd,
}

impl CompressionMethod {
    pub(crate) fn to_zip_method(self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            #[cfg(feature = "zstd-support")]
            CompressionMethod::Zstd => 93,
        }
    }
}

/// Metadata for a single entry, as recorded in the central directory
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub compression_method: u16,
    pub crc32: u32,
    /// Offset of the entry's local file header
    pub offset: u64,
}

/// Open handle over a ZIP container stream.
///
/// Entries are kept in an insertion-ordered map mirroring central directory
/// order, so `entry_names` preserves the order entries appear in the archive.
/// Writing appends new entries after the last one; the central directory is
/// only serialized by [`ZipArchive::finish`], but appended entries are
/// immediately visible to reads through the same handle.
pub struct ZipArchive<S> {
    stream: S,
    entries: IndexMap<String, ZipEntry>,
    file_name: Option<PathBuf>,
    /// Position where the next local header goes (start of the central
    /// directory region in a parsed archive)
    append_offset: u64,
    writable: bool,
}

impl ZipArchive<File> {
    /// Open an existing archive file read-only and parse its central directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(&path)?;
        let (entries, cd_offset) = read_central_directory(&mut file)?;
        Ok(ZipArchive {
            stream: file,
            entries,
            file_name: Some(path.as_ref().to_path_buf()),
            append_offset: cd_offset,
            writable: false,
        })
    }

    /// Create a new, empty, writable archive file (truncating any existing one)
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(ZipArchive {
            stream: file,
            entries: IndexMap::new(),
            file_name: Some(path.as_ref().to_path_buf()),
            append_offset: 0,
            writable: true,
        })
    }
}

impl<S: Read + Seek> ZipArchive<S> {
    /// Create a new, empty, writable archive over an arbitrary stream
    /// (in-memory `Cursor`, network stream, etc.)
    pub fn new(stream: S) -> Self {
        ZipArchive {
            stream,
            entries: IndexMap::new(),
            file_name: None,
            append_offset: 0,
            writable: true,
        }
    }

    /// Parse an existing archive from an arbitrary seekable stream, read-only
    pub fn from_stream(mut stream: S) -> Result<Self> {
        let (entries, cd_offset) = read_central_directory(&mut stream)?;
        Ok(ZipArchive {
            stream,
            entries,
            file_name: None,
            append_offset: cd_offset,
            writable: false,
        })
    }

    /// Number of entries currently in the archive
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive currently holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in central directory order
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|name| name.as_str())
    }

    /// Look up an entry's metadata by exact name
    pub fn entry(&self, name: &str) -> Result<&ZipEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| ZipPathError::EntryNotFound(name.to_string()))
    }

    /// The archive's associated on-disk file name, if any
    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// Associate (or clear) the archive's on-disk file name
    pub fn set_file_name(&mut self, name: Option<PathBuf>) {
        self.file_name = name;
    }

    /// Read an entry's decompressed contents
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self.entry(name)?.clone();

        self.stream.seek(SeekFrom::Start(entry.offset))?;
        let signature = read_u32(&mut self.stream)?;
        if signature != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(ZipPathError::InvalidFormat(
                "Invalid local file header signature".to_string(),
            ));
        }

        // Skip version, flags, compression method, mod time/date, CRC-32,
        // and the (possibly placeholder) sizes; the central directory values
        // in `entry` are authoritative.
        self.stream.seek(SeekFrom::Current(22))?;

        let filename_len = read_u16(&mut self.stream)? as i64;
        let extra_len = read_u16(&mut self.stream)? as i64;
        self.stream.seek(SeekFrom::Current(filename_len + extra_len))?;

        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.stream.read_exact(&mut compressed)?;

        match entry.compression_method {
            0 => Ok(compressed),
            8 => {
                let mut decoder = DeflateDecoder::new(&compressed[..]);
                let mut data = Vec::with_capacity(entry.uncompressed_size as usize);
                decoder.read_to_end(&mut data)?;
                Ok(data)
            }
            #[cfg(feature = "zstd-support")]
            93 => Ok(zstd::decode_all(&compressed[..])?),
            method => Err(ZipPathError::UnsupportedCompression(method)),
        }
    }
}

impl<S: Read + Write + Seek> ZipArchive<S> {
    /// Append an entry compressed with DEFLATE
    pub fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.write_entry_with_method(name, data, CompressionMethod::Deflate)
    }

    /// Append an entry with an explicit compression method
    pub fn write_entry_with_method(
        &mut self,
        name: &str,
        data: &[u8],
        method: CompressionMethod,
    ) -> Result<()> {
        if !self.writable {
            return Err(ZipPathError::InvalidArgument(
                "archive is not opened for writing".to_string(),
            ));
        }

        let crc32 = crc32fast::hash(data);
        let compressed = match method {
            CompressionMethod::Stored => data.to_vec(),
            CompressionMethod::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()?
            }
            #[cfg(feature = "zstd-support")]
            CompressionMethod::Zstd => zstd::encode_all(data, 0)?,
        };
        if data.len() as u64 > u32::MAX as u64 || compressed.len() as u64 > u32::MAX as u64 {
            return Err(ZipPathError::InvalidArgument(format!(
                "entry {} exceeds the 4 GiB classic ZIP limit",
                name
            )));
        }

        let offset = self.append_offset;
        self.stream.seek(SeekFrom::Start(offset))?;

        // Local file header with exact sizes; no data descriptor needed
        self.stream.write_all(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes())?;
        self.stream.write_all(&[20, 0])?; // version needed
        self.stream.write_all(&[0, 0])?; // flags
        self.stream.write_all(&method.to_zip_method().to_le_bytes())?;
        self.stream.write_all(&[0, 0, 0, 0])?; // mod time/date
        self.stream.write_all(&crc32.to_le_bytes())?;
        self.stream.write_all(&(compressed.len() as u32).to_le_bytes())?;
        self.stream.write_all(&(data.len() as u32).to_le_bytes())?;
        self.stream.write_all(&(name.len() as u16).to_le_bytes())?;
        self.stream.write_all(&0u16.to_le_bytes())?; // extra len
        self.stream.write_all(name.as_bytes())?;
        self.stream.write_all(&compressed)?;

        self.append_offset = self.stream.stream_position()?;
        self.entries.insert(
            name.to_string(),
            ZipEntry {
                name: name.to_string(),
                compressed_size: compressed.len() as u64,
                uncompressed_size: data.len() as u64,
                compression_method: method.to_zip_method(),
                crc32,
                offset,
            },
        );
        Ok(())
    }

    /// Write the central directory and end-of-central-directory record,
    /// returning the underlying stream.
    ///
    /// Only needed when the serialized bytes must form a valid archive
    /// (e.g. before reopening by file name); reads through this handle see
    /// appended entries without it.
    pub fn finish(mut self) -> Result<S> {
        if !self.writable {
            // Nothing appended through this handle; the on-disk central
            // directory is already in place.
            return Ok(self.stream);
        }
        if self.entries.len() > u16::MAX as usize {
            return Err(ZipPathError::InvalidArgument(
                "too many entries for a classic central directory".to_string(),
            ));
        }

        self.stream.seek(SeekFrom::Start(self.append_offset))?;
        let central_dir_offset = self.append_offset;

        for entry in self.entries.values() {
            self.stream.write_all(&CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes())?;
            self.stream.write_all(&[20, 0])?; // version made by
            self.stream.write_all(&[20, 0])?; // version needed
            self.stream.write_all(&[0, 0])?; // flags
            self.stream.write_all(&entry.compression_method.to_le_bytes())?;
            self.stream.write_all(&[0, 0, 0, 0])?; // mod time/date
            self.stream.write_all(&entry.crc32.to_le_bytes())?;
            self.stream.write_all(&(entry.compressed_size as u32).to_le_bytes())?;
            self.stream.write_all(&(entry.uncompressed_size as u32).to_le_bytes())?;
            self.stream.write_all(&(entry.name.len() as u16).to_le_bytes())?;
            self.stream.write_all(&0u16.to_le_bytes())?; // extra len
            self.stream.write_all(&0u16.to_le_bytes())?; // comment len
            self.stream.write_all(&0u16.to_le_bytes())?; // disk number start
            self.stream.write_all(&0u16.to_le_bytes())?; // internal attrs
            self.stream.write_all(&0u32.to_le_bytes())?; // external attrs
            self.stream.write_all(&(entry.offset as u32).to_le_bytes())?;
            self.stream.write_all(entry.name.as_bytes())?;
        }

        let central_dir_size = self.stream.stream_position()? - central_dir_offset;

        self.stream.write_all(&END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes())?;
        self.stream.write_all(&0u16.to_le_bytes())?; // disk number
        self.stream.write_all(&0u16.to_le_bytes())?; // disk with central dir
        self.stream.write_all(&(self.entries.len() as u16).to_le_bytes())?;
        self.stream.write_all(&(self.entries.len() as u16).to_le_bytes())?;
        self.stream.write_all(&(central_dir_size as u32).to_le_bytes())?;
        self.stream.write_all(&(central_dir_offset as u32).to_le_bytes())?;
        self.stream.write_all(&0u16.to_le_bytes())?; // comment len

        self.stream.flush()?;
        Ok(self.stream)
    }
}

/// Read the full central directory, returning the entry map and the offset
/// where the central directory begins (the append position for new entries)
fn read_central_directory<S: Read + Seek>(
    stream: &mut S,
) -> Result<(IndexMap<String, ZipEntry>, u64)> {
    let eocd_offset = find_eocd(stream)?;

    stream.seek(SeekFrom::Start(eocd_offset))?;
    let signature = read_u32(stream)?;
    if signature != END_OF_CENTRAL_DIRECTORY_SIGNATURE {
        return Err(ZipPathError::InvalidFormat(format!(
            "Invalid end of central directory signature: 0x{:08x}",
            signature
        )));
    }

    // Skip disk number fields
    stream.seek(SeekFrom::Current(4))?;
    let _entries_on_disk = read_u16(stream)?;

    // These may be 0xFFFF/0xFFFFFFFF placeholders when ZIP64 is in play
    let total_entries_16 = read_u16(stream)?;
    let cd_size_32 = read_u32(stream)?;
    let cd_offset_32 = read_u32(stream)?;

    let mut total_entries = total_entries_16 as u64;
    let mut cd_offset = cd_offset_32 as u64;

    if total_entries_16 == 0xFFFF || cd_size_32 == 0xFFFFFFFF || cd_offset_32 == 0xFFFFFFFF {
        let (zip64_entries, zip64_cd_offset) = read_zip64_eocd(stream, eocd_offset)?;
        total_entries = zip64_entries;
        cd_offset = zip64_cd_offset;
    }

    stream.seek(SeekFrom::Start(cd_offset))?;

    let mut entries = IndexMap::with_capacity(total_entries as usize);
    for _ in 0..total_entries {
        let signature = read_u32(stream)?;
        if signature != CENTRAL_DIRECTORY_SIGNATURE {
            break;
        }

        // Skip version made by, version needed, flags
        stream.seek(SeekFrom::Current(6))?;
        let compression_method = read_u16(stream)?;
        // Skip modification time and date
        stream.seek(SeekFrom::Current(4))?;
        let crc32 = read_u32(stream)?;

        // 32-bit values may be 0xFFFFFFFF placeholders resolved by the
        // ZIP64 extra field below
        let mut compressed_size = read_u32(stream)? as u64;
        let mut uncompressed_size = read_u32(stream)? as u64;
        let filename_len = read_u16(stream)? as usize;
        let extra_len = read_u16(stream)? as usize;
        let comment_len = read_u16(stream)? as usize;

        // Skip disk number, internal attributes, external attributes
        stream.seek(SeekFrom::Current(8))?;
        let mut offset = read_u32(stream)? as u64;

        let mut filename_buf = vec![0u8; filename_len];
        stream.read_exact(&mut filename_buf)?;
        let name = String::from_utf8_lossy(&filename_buf).to_string();

        let mut extra_buf = vec![0u8; extra_len];
        if extra_len > 0 {
            stream.read_exact(&mut extra_buf)?;
        }
        parse_zip64_extra(
            &extra_buf,
            &mut uncompressed_size,
            &mut compressed_size,
            &mut offset,
        );

        if comment_len > 0 {
            stream.seek(SeekFrom::Current(comment_len as i64))?;
        }

        entries.insert(
            name.clone(),
            ZipEntry {
                name,
                compressed_size,
                uncompressed_size,
                compression_method,
                crc32,
                offset,
            },
        );
    }

    Ok((entries, cd_offset))
}

/// Resolve 0xFFFFFFFF placeholders from a ZIP64 extra field (ID 0x0001).
/// The field packs, in order, only the values that were placeholders:
/// uncompressed size, compressed size, local header offset.
fn parse_zip64_extra(
    extra: &[u8],
    uncompressed_size: &mut u64,
    compressed_size: &mut u64,
    offset: &mut u64,
) {
    let mut i = 0usize;
    while i + 4 <= extra.len() {
        let id = u16::from_le_bytes([extra[i], extra[i + 1]]);
        let data_len = u16::from_le_bytes([extra[i + 2], extra[i + 3]]) as usize;
        i += 4;
        if i + data_len > extra.len() {
            break;
        }
        if id == 0x0001 {
            let mut field = &extra[i..i + data_len];
            for value in [uncompressed_size, compressed_size, offset] {
                if *value == 0xFFFFFFFF && field.len() >= 8 {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(&field[..8]);
                    *value = u64::from_le_bytes(buf);
                    field = &field[8..];
                }
            }
            break;
        }
        i += data_len;
    }
}

/// When the EOCD carries ZIP64 placeholders, locate and read the ZIP64 EOCD
/// record, returning (total entries, central directory offset)
fn read_zip64_eocd<S: Read + Seek>(stream: &mut S, eocd_offset: u64) -> Result<(u64, u64)> {
    // Search backwards from the EOCD for the ZIP64 EOCD locator (50 4b 06 07)
    let search_start = eocd_offset.saturating_sub(65557);
    stream.seek(SeekFrom::Start(search_start))?;
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer)?;

    let mut locator_pos: Option<usize> = None;
    for i in (0..buffer.len().saturating_sub(3)).rev() {
        if buffer[i] == 0x50
            && buffer[i + 1] == 0x4b
            && buffer[i + 2] == 0x06
            && buffer[i + 3] == 0x07
        {
            locator_pos = Some(i);
            break;
        }
    }
    let locator_pos = locator_pos.ok_or_else(|| {
        ZipPathError::InvalidFormat("ZIP64 EOCD locator not found".to_string())
    })?;

    // Locator layout: signature(4), disk with ZIP64 EOCD(4),
    // relative offset of the ZIP64 EOCD(8), total disks(4)
    let mut offset_buf = [0u8; 8];
    offset_buf.copy_from_slice(&buffer[locator_pos + 8..locator_pos + 16]);
    let zip64_eocd_offset = u64::from_le_bytes(offset_buf);

    stream.seek(SeekFrom::Start(zip64_eocd_offset))?;
    let signature = read_u32(stream)?;
    if signature != ZIP64_END_OF_CENTRAL_DIRECTORY_SIGNATURE {
        return Err(ZipPathError::InvalidFormat(format!(
            "Invalid ZIP64 EOCD signature: 0x{:08x}",
            signature
        )));
    }

    // Skip record size (8), version made by (2), version needed (2),
    // disk number (4), disk where central directory starts (4)
    stream.seek(SeekFrom::Current(20))?;

    let total_entries = read_u64(stream)?;
    let _total_entries_all_disks = read_u64(stream)?;
    let _cd_size = read_u64(stream)?;
    let cd_offset = read_u64(stream)?;

    Ok((total_entries, cd_offset))
}

/// Find the end of central directory record by scanning back from the end
/// of the stream (EOCD is at least 22 bytes; the comment can pad it out to
/// 65557 bytes total)
fn find_eocd<S: Read + Seek>(stream: &mut S) -> Result<u64> {
    let stream_len = stream.seek(SeekFrom::End(0))?;
    let search_start = stream_len.saturating_sub(65557);
    stream.seek(SeekFrom::Start(search_start))?;

    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer)?;

    for i in (0..buffer.len().saturating_sub(3)).rev() {
        if buffer[i] == 0x50
            && buffer[i + 1] == 0x4b
            && buffer[i + 2] == 0x05
            && buffer[i + 3] == 0x06
        {
            return Ok(search_start + i as u64);
        }
    }

    Err(ZipPathError::InvalidFormat(
        "End of central directory not found".to_string(),
    ))
}

fn read_u16<S: Read>(stream: &mut S) -> Result<u16> {
    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<S: Read>(stream: &mut S) -> Result<u32> {
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<S: Read>(stream: &mut S) -> Result<u64> {
    let mut buf = [0u8; 8];
    stream.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn write_then_read_same_handle() {
        let mut archive = ZipArchive::new(Cursor::new(Vec::new()));
        archive.write_entry("hello.txt", b"hello world").unwrap();
        archive
            .write_entry_with_method("raw.bin", b"stored bytes", CompressionMethod::Stored)
            .unwrap();

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.read_entry("hello.txt").unwrap(), b"hello world");
        assert_eq!(archive.read_entry("raw.bin").unwrap(), b"stored bytes");
    }

    #[test]
    fn finish_then_reparse() {
        let mut archive = ZipArchive::new(Cursor::new(Vec::new()));
        archive.write_entry("a.txt", b"content of a").unwrap();
        archive.write_entry("b/c.txt", b"content of c").unwrap();
        let cursor = archive.finish().unwrap();

        let mut reopened = ZipArchive::from_stream(cursor).unwrap();
        let names: Vec<_> = reopened.entry_names().map(str::to_string).collect();
        assert_eq!(names, ["a.txt", "b/c.txt"]);
        assert_eq!(reopened.read_entry("b/c.txt").unwrap(), b"content of c");
    }

    #[test]
    fn entry_lookup_missing() {
        let archive = ZipArchive::new(Cursor::new(Vec::new()));
        assert!(matches!(
            archive.entry("does-not-exist"),
            Err(ZipPathError::EntryNotFound(_))
        ));
    }

    #[test]
    fn read_only_handle_rejects_writes() {
        let mut archive = ZipArchive::new(Cursor::new(Vec::new()));
        archive.write_entry("a.txt", b"a").unwrap();
        let cursor = archive.finish().unwrap();

        let mut reopened = ZipArchive::from_stream(cursor).unwrap();
        assert!(matches!(
            reopened.write_entry("b.txt", b"b"),
            Err(ZipPathError::InvalidArgument(_))
        ));
    }
}
