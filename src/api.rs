//! Backend contract: wire models and the [`MemeBackend`] trait.
//!
//! Every endpoint answers with the same envelope,
//! `{ "success": bool, "data": ..., "error_message": ..., "message": ... }`.

use crate::model::{string_or_number, Template, TextLine};
use crate::upload::UploadFile;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// The payload of a successful response.
    pub fn into_data(self) -> Result<T> {
        if !self.success {
            return Err(Error::ApiError(
                self.error_message
                    .or(self.message)
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| Error::ApiError("response has no data".into()))
    }

    /// For acknowledgements that carry no payload.
    pub fn into_ack(self) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(Error::ApiError(
                self.error_message
                    .or(self.message)
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            ))
        }
    }
}

/// One overlay box as the remote renderer expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBox {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: String,
    pub outline_color: String,
}

/// Body of `POST /memes/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMemeRequest {
    pub template_id: String,
    pub boxes: Vec<TextBox>,
    pub font_family: String,
    pub font_size: u32,
}

/// Body of `POST /memes/create-custom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateCustomMemeRequest {
    pub image_url: String,
    pub text_lines: Vec<TextLine>,
    pub font_family: String,
    pub font_size: u32,
    pub text_color: String,
}

/// A meme rendered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedMeme {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

/// Response data of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    /// Usually a `data:` URL.
    pub url: String,
}

/// A meme stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SavedMeme {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Blocking access to a meme backend.
pub trait MemeBackend: Send {
    /// `GET /memes/templates`
    fn list_templates(&self) -> Result<Vec<Template>>;

    /// `POST /upload`
    fn upload_image(&self, file: &UploadFile) -> Result<UploadedImage>;

    /// `POST /memes/create`
    fn create_meme(&self, request: &CreateMemeRequest) -> Result<CreatedMeme>;

    /// `POST /memes/create-custom`
    fn create_custom_meme(&self, request: &CreateCustomMemeRequest) -> Result<CreatedMeme>;

    /// `GET /memes`
    fn list_memes(&self) -> Result<Vec<SavedMeme>>;

    /// `DELETE /memes/{id}`
    fn delete_meme(&self, id: &str) -> Result<()>;
}
