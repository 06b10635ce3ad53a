//! Directory-backed file store implementation
//!
//! [`FileStore`] owns every stored file's bytes and metadata; the filesystem root is the
//! single source of truth and nothing is cached in memory.
//!
//! # Write discipline
//!
//! `put` streams content into `<root>/.partial/<key>.<random>` and only renames it to
//! `<root>/<key>` once every byte has been written and synced. Rename within one filesystem
//! is atomic, so concurrent `list`/`open` calls (in this process or another) only ever
//! observe complete files. A failed or oversized write removes its staging file.
//!
//! Two writers racing on the same key both stage independently; whichever rename lands last
//! wins.

use crate::{FilesError, STAGING_DIR_NAME};
use chrono::{DateTime, Utc};
use filedrop_types::FileKey;
use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Bytes read from the head of a file for media type detection.
const SNIFF_LEN: usize = 8192;

/// Metadata for a stored file
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct StoredFile {
    /// Single-segment key the file is stored under
    pub name: FileKey,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// Last modification time reported by the filesystem
    pub modified: DateTime<Utc>,
}

impl StoredFile {
    fn from_metadata(name: FileKey, metadata: &fs::Metadata) -> io::Result<Self> {
        Ok(Self {
            name,
            size_bytes: metadata.len(),
            modified: DateTime::<Utc>::from(metadata.modified()?),
        })
    }
}

/// A stored file opened for reading.
#[derive(Debug)]
pub struct OpenedFile {
    /// Handle positioned at the start of the content
    pub file: fs::File,

    /// Metadata taken from the opened handle
    pub metadata: StoredFile,

    /// Detected media type (MIME type), if available
    ///
    /// This is a best-effort detection from the leading bytes and should not be considered
    /// authoritative.
    pub media_type: Option<&'static str>,
}

/// Flat file store rooted at one directory.
///
/// Cloning is cheap and every clone addresses the same directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Canonicalised root directory
    root_directory: PathBuf,

    /// Largest accepted content length, if bounded
    max_file_size: Option<u64>,
}

impl FileStore {
    /// Creates a store over an existing directory.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if:
    /// - the directory does not exist,
    /// - the path is not a directory,
    /// - path canonicalisation fails.
    pub fn new(root_directory: &Path) -> Result<Self, FilesError> {
        if !root_directory.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self {
            root_directory,
            max_file_size: None,
        })
    }

    /// Bounds the size of content accepted by [`Self::put`].
    #[must_use]
    pub fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = Some(limit);
        self
    }

    /// Returns the canonicalised root directory.
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Returns the configured size limit, if any.
    #[must_use]
    pub fn max_file_size(&self) -> Option<u64> {
        self.max_file_size
    }

    /// Returns the final location of `key` inside the store.
    #[must_use]
    pub fn path_for(&self, key: &FileKey) -> PathBuf {
        self.root_directory.join(key.as_str())
    }

    /// Stores `content` under the sanitised form of `raw_name`.
    ///
    /// Any directory component of `raw_name` is discarded first, so `a/b/evil.txt` is stored
    /// as `evil.txt`. An existing file under the same key is replaced atomically.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `raw_name` sanitises to nothing usable (`InvalidName`),
    /// - the content exceeds the configured limit (`TooLarge`); nothing is stored,
    /// - staging, writing or renaming fails (`Io`).
    pub fn put(&self, raw_name: &str, content: impl Read) -> Result<StoredFile, FilesError> {
        let key = FileKey::sanitize(raw_name)?;
        self.put_key(&key, content)
    }

    /// Stores `content` under an already sanitised key.
    ///
    /// See [`Self::put`] for the write discipline and errors.
    pub fn put_key(&self, key: &FileKey, content: impl Read) -> Result<StoredFile, FilesError> {
        let staging_path = staging_path_in(&self.root_directory, key)?;
        let destination = self.path_for(key);

        let written = match self.write_staged(&staging_path, content) {
            Ok(written) => written,
            Err(e) => {
                discard_staged(&staging_path);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&staging_path, &destination) {
            discard_staged(&staging_path);
            return Err(FilesError::Io(io::Error::new(
                e.kind(),
                format!(
                    "Failed to move staged file into {}: {}",
                    destination.display(),
                    e
                ),
            )));
        }

        let metadata = fs::metadata(&destination)?;
        tracing::debug!(name = %key, size = written, "stored file");
        Ok(StoredFile::from_metadata(key.clone(), &metadata)?)
    }

    /// Lists every stored file in directory enumeration order.
    ///
    /// Directories (including the staging area) are excluded. An entry whose metadata cannot
    /// be read, or whose name is not exactly a valid key (not UTF-8, or containing a backslash), is
    /// skipped rather than failing the listing.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the root directory itself cannot be read.
    pub fn list(&self) -> Result<Vec<StoredFile>, FilesError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.root_directory)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(path = ?entry.path(), error = %e, "skipping entry without metadata");
                    continue;
                }
            };
            if metadata.is_dir() {
                continue;
            }

            // A name must already be its own key: `a\b.txt` is not listed as `b.txt`.
            let file_name = entry.file_name();
            let Some(key) = file_name.to_str().and_then(|name| {
                FileKey::sanitize(name)
                    .ok()
                    .filter(|key| key.as_str() == name)
            }) else {
                tracing::warn!(path = ?entry.path(), "skipping entry with unusable name");
                continue;
            };

            match StoredFile::from_metadata(key, &metadata) {
                Ok(stored) => files.push(stored),
                Err(e) => {
                    tracing::warn!(path = ?entry.path(), error = %e, "skipping entry without modification time");
                }
            }
        }

        Ok(files)
    }

    /// Opens the stored file named by the sanitised form of `raw_name`.
    ///
    /// The caller-supplied path structure is never trusted: `x/../../etc/passwd` opens the
    /// stored key `passwd`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `raw_name` sanitises to nothing usable (`InvalidName`),
    /// - no stored file exists under the key (`NotFound`),
    /// - the file cannot be opened or read (`Io`).
    pub fn open(&self, raw_name: &str) -> Result<OpenedFile, FilesError> {
        let key = FileKey::sanitize(raw_name)?;
        let path = self.path_for(&key);

        let mut file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FilesError::NotFound(key));
            }
            Err(e) => return Err(FilesError::Io(e)),
        };

        let metadata = file.metadata()?;
        if metadata.is_dir() {
            return Err(FilesError::NotFound(key));
        }
        let metadata = StoredFile::from_metadata(key, &metadata)?;

        let mut head = Vec::with_capacity(SNIFF_LEN);
        (&mut file).take(SNIFF_LEN as u64).read_to_end(&mut head)?;
        file.seek(SeekFrom::Start(0))?;
        let media_type = infer::get(&head).map(|kind| kind.mime_type());

        Ok(OpenedFile {
            file,
            metadata,
            media_type,
        })
    }

    /// Reads the whole content of a stored file.
    ///
    /// # Errors
    ///
    /// Same as [`Self::open`].
    pub fn read(&self, raw_name: &str) -> Result<Vec<u8>, FilesError> {
        let mut opened = self.open(raw_name)?;
        let mut buffer = Vec::with_capacity(opened.metadata.size_bytes as usize);
        opened.file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn write_staged(&self, staging_path: &Path, content: impl Read) -> Result<u64, FilesError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(staging_path)?;

        let written = match self.max_file_size {
            Some(limit) => {
                let written = io::copy(&mut content.take(limit.saturating_add(1)), &mut file)?;
                if written > limit {
                    return Err(FilesError::TooLarge { limit });
                }
                written
            }
            None => {
                let mut content = content;
                io::copy(&mut content, &mut file)?
            }
        };

        file.flush()?;
        file.sync_all()?;
        Ok(written)
    }
}

/// Allocates a fresh staging path for `key` under `root`, creating the staging directory
/// when needed.
///
/// The staging file name is a random token plus the key's extension, never the key itself,
/// so any key that fits the filesystem's name limit also fits in staging. Keeping the
/// extension lets encoders that infer a format from the path still work.
///
/// # Errors
///
/// Returns an `io::Error` if the staging directory cannot be created.
pub fn staging_path_in(root: &Path, key: &FileKey) -> io::Result<PathBuf> {
    let staging_dir = root.join(STAGING_DIR_NAME);
    fs::create_dir_all(&staging_dir)?;

    let token = Uuid::new_v4().simple().to_string();
    let file_name = match key.extension() {
        Some(ext) => format!("{}.{}", token, ext),
        None => token,
    };
    Ok(staging_dir.join(file_name))
}

/// Removes a staging file, logging rather than failing when that is not possible.
pub fn discard_staged(staging_path: &Path) {
    match fs::remove_file(staging_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = ?staging_path, error = %e, "failed to clean up staged file");
        }
    }
}
