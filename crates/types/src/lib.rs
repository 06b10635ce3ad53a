//! Validated text types shared across filedrop crates.
//!
//! The store's public key space is flat: every stored file is addressed by a single path
//! segment. [`FileKey`] is the only way to turn caller-supplied text into such a key, so
//! every entry point (HTTP upload, HTTP download, CLI) sanitises names identically.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors that can occur when sanitising a file name into a [`FileKey`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FileKeyError {
    /// Nothing usable remained after discarding directory components
    #[error("file name is empty")]
    Empty,

    /// The final segment is `.` or `..`
    #[error("file name refers to a directory: {0}")]
    DirectoryReference(String),

    /// The name contains a NUL byte
    #[error("file name contains a NUL byte")]
    Nul,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, returning `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A file name reduced to a single path segment.
///
/// Construction discards every directory component of the raw name, so `a/b/evil.txt`,
/// `..\evil.txt` and `evil.txt` all produce the key `evil.txt`. Both `/` and `\` are treated
/// as separators regardless of platform, and trailing separators are ignored (`docs/` is
/// `docs`). Keys that would name a directory (`.` or `..`) are rejected, which means a key
/// joined onto a root directory can never resolve outside it.
///
/// Unlike [`NonEmptyText`], surrounding whitespace is preserved: it is part of the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileKey(String);

impl FileKey {
    /// Sanitises `raw` into a single-segment key.
    ///
    /// # Errors
    ///
    /// Returns `FileKeyError` if:
    /// - the final segment is empty (empty input, or separators only),
    /// - the final segment is `.` or `..`,
    /// - the input contains a NUL byte.
    pub fn sanitize(raw: impl AsRef<str>) -> Result<Self, FileKeyError> {
        let raw = raw.as_ref();
        if raw.contains('\0') {
            return Err(FileKeyError::Nul);
        }

        let trimmed = raw.trim_end_matches(['/', '\\']);
        let segment = trimmed
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();

        match segment {
            "" => Err(FileKeyError::Empty),
            "." | ".." => Err(FileKeyError::DirectoryReference(segment.to_owned())),
            name => Ok(Self(name.to_owned())),
        }
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the lowercased extension (without the dot), if the key has one.
    ///
    /// A leading dot does not start an extension: `.bashrc` has none.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.0.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl std::fmt::Display for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for FileKey {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl std::str::FromStr for FileKey {
    type Err = FileKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::sanitize(s)
    }
}

impl serde::Serialize for FileKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for FileKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileKey::sanitize(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims() {
        let text = NonEmptyText::new("  hello ").unwrap();
        assert_eq!(text.as_str(), "hello");
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(FileKey::sanitize("cat.png").unwrap().as_str(), "cat.png");
        assert_eq!(
            FileKey::sanitize(" spaced name.txt").unwrap().as_str(),
            " spaced name.txt"
        );
    }

    #[test]
    fn sanitize_discards_directory_components() {
        for raw in [
            "a/b/evil.txt",
            "/etc/evil.txt",
            "../../evil.txt",
            "..\\..\\evil.txt",
            "C:\\Users\\me\\evil.txt",
            "nested/dir/evil.txt/",
        ] {
            assert_eq!(FileKey::sanitize(raw).unwrap().as_str(), "evil.txt", "{raw}");
        }
    }

    #[test]
    fn sanitize_rejects_unusable_names() {
        assert_eq!(FileKey::sanitize(""), Err(FileKeyError::Empty));
        assert_eq!(FileKey::sanitize("///"), Err(FileKeyError::Empty));
        assert_eq!(
            FileKey::sanitize("a/.."),
            Err(FileKeyError::DirectoryReference("..".into()))
        );
        assert_eq!(
            FileKey::sanitize("."),
            Err(FileKeyError::DirectoryReference(".".into()))
        );
        assert_eq!(FileKey::sanitize("bad\0name"), Err(FileKeyError::Nul));
    }

    #[test]
    fn extension_is_lowercased() {
        let key = FileKey::sanitize("Holiday.JPEG").unwrap();
        assert_eq!(key.extension().as_deref(), Some("jpeg"));
        assert_eq!(FileKey::sanitize("README").unwrap().extension(), None);
        assert_eq!(FileKey::sanitize(".bashrc").unwrap().extension(), None);
        assert_eq!(FileKey::sanitize("archive.").unwrap().extension(), None);
    }

    #[test]
    fn deserialize_sanitizes() {
        let key: FileKey = serde_json::from_str("\"x/y/z.gif\"").unwrap();
        assert_eq!(key.as_str(), "z.gif");
        assert!(serde_json::from_str::<FileKey>("\"..\"").is_err());
    }
}
