//! Client-side checks for files offered for upload.
//!
//! Only images are accepted. The content type is inferred from the file
//! extension; anything that is not a known image type is rejected here, before
//! a request is ever built.

use crate::{Error, Result};
use std::path::Path;

/// An image file ready to be sent to `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidFile(format!("{} has no file name", path.display())))?
            .to_string();
        // Validate before touching the disk
        let content_type = image_content_type(&filename)?;
        let bytes = std::fs::read(path)?;
        Ok(Self {
            filename,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let filename = filename.into();
        let content_type = image_content_type(&filename)?;
        Ok(Self {
            filename,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    /// The file as a `data:` URL, usable directly as a custom image.
    pub fn to_data_url(&self) -> String {
        crate::loader::encode_data_url(&self.content_type, &self.bytes)
    }
}

/// `image/*` content type for a file name, or [`Error::InvalidFile`].
pub fn image_content_type(filename: &str) -> Result<&'static str> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "bmp" => Ok("image/bmp"),
        _ => Err(Error::InvalidFile(format!("{} is not an image", filename))),
    }
}
