//! Local directory bucket
//!
//! Stores each object as one file inside a root directory.
//!
//! ## File Naming
//! The file name is the lowercase hex encoding of the object name plus
//! `.obj`. Hex keeps any object name (including `/`) filesystem-safe and
//! preserves byte order.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Header (bincode)                                 │
//! │ ┌──────────┬──────────┬──────────┬─────────────┐ │
//! │ │Magic (4) │Version(2)│ Size (8) │  CRC32 (4)  │ │
//! │ └──────────┴──────────┴──────────┴─────────────┘ │
//! ├──────────────────────────────────────────────────┤
//! │ Content (Size bytes)                             │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Writers fill a temporary file and rename it over the target on commit,
//! so readers see either the old object or the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Take, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    collect_page, BackendError, ListPage, ListQuery, ObjectBackend, ObjectReader, ObjectWriter,
};

/// Magic bytes at the start of every object file
pub const MAGIC: [u8; 4] = *b"BKV1";

/// Object file format version
pub const VERSION: u16 = 1;

/// Encoded header size: magic (4) + version (2) + size (8) + crc (4)
pub const HEADER_SIZE: u64 = 18;

const OBJECT_SUFFIX: &str = ".obj";
const TEMP_SUFFIX: &str = ".tmp";

/// Header stored in front of each object's content
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectHeader {
    magic: [u8; 4],
    version: u16,
    size: u64,
    crc: u32,
}

impl ObjectHeader {
    fn new(size: u64, crc: u32) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            size,
            crc,
        }
    }

    fn encode(&self) -> Result<Vec<u8>, BackendError> {
        bincode::serialize(self).map_err(|e| BackendError::Corrupt(e.to_string()))
    }

    fn read_from<R: Read>(reader: &mut R, name: &str) -> Result<Self, BackendError> {
        let header: ObjectHeader = bincode::deserialize_from(reader)
            .map_err(|e| BackendError::Corrupt(format!("{}: bad header: {}", name, e)))?;

        if header.magic != MAGIC {
            return Err(BackendError::Corrupt(format!(
                "{}: invalid magic {:?}",
                name, header.magic
            )));
        }
        if header.version != VERSION {
            return Err(BackendError::Corrupt(format!(
                "{}: unsupported version {}",
                name, header.version
            )));
        }
        Ok(header)
    }
}

/// Bucket backed by a directory on the local filesystem
///
/// The directory keeps no order, so every `list_objects` call scans the
/// whole directory and selects the smallest matching names past the token.
/// Walking all `n` objects at page size `p` costs about `n * n / p` entry
/// visits; pick a large page size for big buckets.
#[derive(Clone)]
pub struct LocalBucket {
    root: Arc<PathBuf>,
    next_temp_id: Arc<AtomicU64>,
}

impl LocalBucket {
    /// Connect to an existing bucket directory
    ///
    /// Fails with `Unavailable` if `root` is missing or not a directory.
    pub fn connect(root: impl AsRef<Path>) -> Result<Self, BackendError> {
        let root = root.as_ref();
        let metadata = fs::metadata(root).map_err(|e| {
            BackendError::Unavailable(format!("cannot access {}: {}", root.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(BackendError::Unavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        tracing::debug!(root = %root.display(), "connected to local bucket");

        Ok(Self {
            root: Arc::new(root.to_path_buf()),
            next_temp_id: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Create the bucket directory if needed, then connect
    pub fn create(root: impl AsRef<Path>) -> Result<Self, BackendError> {
        fs::create_dir_all(root.as_ref())?;
        Self::connect(root)
    }

    /// Bucket root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `name`
    pub fn object_path(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}{}", hex::encode(name.as_bytes()), OBJECT_SUFFIX))
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        let id = self.next_temp_id.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!(
            "{}.{}.{}{}",
            hex::encode(name.as_bytes()),
            std::process::id(),
            id,
            TEMP_SUFFIX
        ))
    }

    /// "6b6579.obj" → Some("key"); temp files and foreign files → None
    fn parse_object_name(file_name: &str) -> Option<String> {
        let stem = file_name.strip_suffix(OBJECT_SUFFIX)?;
        let raw = hex::decode(stem).ok()?;
        String::from_utf8(raw).ok()
    }
}

impl ObjectBackend for LocalBucket {
    fn open_reader(&self, name: &str) -> Result<Box<dyn ObjectReader>, BackendError> {
        let file = File::open(self.object_path(name)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => BackendError::NotFound(name.to_string()),
            _ => BackendError::Io(e),
        })?;

        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let header = ObjectHeader::read_from(&mut reader, name)?;

        let stored = file_len.saturating_sub(HEADER_SIZE);
        if header.size > stored {
            return Err(BackendError::Corrupt(format!(
                "{}: header declares {} bytes but only {} are stored",
                name, header.size, stored
            )));
        }

        Ok(Box::new(LocalReader {
            inner: reader.take(header.size),
            size: header.size,
            remaining: header.size,
            expected_crc: header.crc,
            hasher: crc32fast::Hasher::new(),
        }))
    }

    fn open_writer(&self, name: &str) -> Result<Box<dyn ObjectWriter>, BackendError> {
        let temp_path = self.temp_path(name);
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)?;

        let mut writer = BufWriter::new(file);
        // Placeholder header, rewritten in commit once size and CRC are known
        writer.write_all(&ObjectHeader::new(0, 0).encode()?)?;

        Ok(Box::new(LocalWriter {
            writer: Some(writer),
            temp_path,
            final_path: self.object_path(name),
            size: 0,
            hasher: crc32fast::Hasher::new(),
        }))
    }

    fn delete_object(&self, name: &str) -> Result<(), BackendError> {
        fs::remove_file(self.object_path(name)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => BackendError::NotFound(name.to_string()),
            _ => BackendError::Io(e),
        })
    }

    fn list_objects(
        &self,
        query: &ListQuery,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage, BackendError> {
        let mut entries: Vec<(String, u64)> = Vec::new();

        for entry in fs::read_dir(self.root.as_path())? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(Self::parse_object_name) else {
                continue;
            };

            if !query.matches(&name) {
                continue;
            }
            if let Some(token) = page_token {
                if name.as_str() <= token {
                    continue;
                }
            }

            let size = if query.names_only {
                0
            } else {
                entry.metadata()?.len().saturating_sub(HEADER_SIZE)
            };
            entries.push((name, size));
        }

        // Only the page plus one look-ahead entry needs ordering
        let keep = page_size.max(1).saturating_add(1);
        if entries.len() > keep {
            entries.select_nth_unstable_by(keep - 1, |a, b| a.0.cmp(&b.0));
            entries.truncate(keep);
        }
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let candidates = entries.iter().map(|(name, size)| (name.as_str(), *size));
        Ok(collect_page(query, candidates, page_size))
    }
}

/// Reads an object's content and verifies its CRC once fully consumed
struct LocalReader {
    inner: Take<BufReader<File>>,
    size: u64,
    remaining: u64,
    expected_crc: u32,
    hasher: crc32fast::Hasher,
}

impl Read for LocalReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            return Ok(0);
        }

        self.hasher.update(&buf[..n]);
        self.remaining = self.remaining.saturating_sub(n as u64);

        if self.remaining == 0 {
            let actual = self.hasher.clone().finalize();
            if actual != self.expected_crc {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "checksum mismatch: expected {:08x}, got {:08x}",
                        self.expected_crc, actual
                    ),
                ));
            }
        }
        Ok(n)
    }
}

impl ObjectReader for LocalReader {
    fn declared_size(&self) -> u64 {
        self.size
    }
}

/// Writes into a temp file; commit finalizes the header and renames it
struct LocalWriter {
    writer: Option<BufWriter<File>>,
    temp_path: PathBuf,
    final_path: PathBuf,
    size: u64,
    hasher: crc32fast::Hasher,
}

impl Write for LocalWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "writer already committed"))?;

        let n = writer.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl ObjectWriter for LocalWriter {
    fn commit(mut self: Box<Self>) -> Result<(), BackendError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| BackendError::Corrupt("writer already committed".to_string()))?;

        let header = ObjectHeader::new(self.size, self.hasher.clone().finalize());
        let result = Self::finalize(writer, &header, &self.temp_path, &self.final_path);
        if result.is_err() {
            let _ = fs::remove_file(&self.temp_path);
        }
        result
    }
}

impl LocalWriter {
    fn finalize(
        writer: BufWriter<File>,
        header: &ObjectHeader,
        temp_path: &Path,
        final_path: &Path,
    ) -> Result<(), BackendError> {
        let mut file = writer
            .into_inner()
            .map_err(|e| BackendError::Io(e.into_error()))?;

        file.seek(SeekFrom::Start(0))?;
        file.write_all(&header.encode()?)?;
        file.sync_all()?;
        drop(file);

        fs::rename(temp_path, final_path)?;
        Ok(())
    }
}

impl Drop for LocalWriter {
    fn drop(&mut self) {
        // Uncommitted write: discard the temp file
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}
