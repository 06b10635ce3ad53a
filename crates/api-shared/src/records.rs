//! Records returned to clients.
//!
//! Field names follow the wire format the browser client already consumes
//! (`modTime`, `thumbnailUrl`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One entry of the file listing.
///
/// Built fresh on every listing request by joining stored-file metadata with thumbnail
/// presence; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Stored file name (a single path segment)
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, RFC 3339 in UTC
    pub mod_time: String,
    /// Locator of the thumbnail, present only when one exists right now
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Response to a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadRes {
    /// Key the upload was stored under, after sanitisation
    pub name: String,
    /// Number of bytes stored
    pub size: u64,
    /// Whether thumbnail generation was scheduled for this upload
    pub thumbnail_scheduled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_record_omits_missing_thumbnail() {
        let record = FileRecord {
            name: "notes.txt".into(),
            size: 10240,
            mod_time: "2024-05-01T10:00:00Z".into(),
            thumbnail_url: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "notes.txt",
                "size": 10240,
                "modTime": "2024-05-01T10:00:00Z"
            })
        );
    }

    #[test]
    fn file_record_includes_thumbnail() {
        let record = FileRecord {
            name: "cat.png".into(),
            size: 51200,
            mod_time: "2024-05-01T10:00:00Z".into(),
            thumbnail_url: Some("/thumbnails/cat.png".into()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["thumbnailUrl"], "/thumbnails/cat.png");
    }
}
