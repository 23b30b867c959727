//! Media upload types.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Kind of media sent to the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Image,
    Video,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Image => "image",
            UploadKind::Video => "video",
        }
    }

    /// MIME type guessed from a file extension.
    pub fn mime_for(&self, file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match (self, ext.as_str()) {
            (UploadKind::Image, "png") => "image/png",
            (UploadKind::Image, "gif") => "image/gif",
            (UploadKind::Image, "webp") => "image/webp",
            (UploadKind::Image, _) => "image/jpeg",
            (UploadKind::Video, "mov") => "video/quicktime",
            (UploadKind::Video, "webm") => "video/webm",
            (UploadKind::Video, _) => "video/mp4",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file held in memory, ready to be sent.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Read a file from disk, keeping only its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::upload(path.display().to_string(), "not a file path"))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::upload(path.display().to_string(), e))?;
        Ok(Self { file_name, bytes })
    }
}

/// Upload endpoint answer: server-relative paths of the stored files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    #[serde(default, alias = "files", alias = "data")]
    pub urls: Vec<String>,
}
