//! HTTP implementation of [`MemeBackend`] on top of a blocking reqwest client.

use crate::api::{
    CreateCustomMemeRequest, CreateMemeRequest, CreatedMeme, Envelope, MemeBackend, SavedMeme,
    UploadedImage,
};
use crate::model::Template;
use crate::upload::UploadFile;
use crate::{Error, MemeConfig, Result};
use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Talks to the backend at `MemeConfig::api_base`.
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(config: &MemeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        // `Url::join` replaces the last segment unless the base ends with '/'
        let mut base = config.api_base.trim_end_matches('/').to_string();
        base.push('/');
        let base = Url::parse(&base)
            .map_err(|e| Error::ConfigError(format!("Invalid API base {}: {}", config.api_base, e)))?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::ConfigError(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn read_envelope<T: DeserializeOwned>(resp: Response) -> Result<Envelope<T>> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            // FastAPI style errors: {"detail": "..."}
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(Error::ApiError(format!("HTTP {}: {}", status.as_u16(), detail)));
        }
        resp.json::<Envelope<T>>()
            .map_err(|e| Error::ApiError(format!("Malformed response: {}", e)))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        log::debug!("GET {}", url);
        let resp = self.client.get(url).send()?;
        Self::read_envelope::<T>(resp)?.into_data()
    }

    fn post_json<B: serde::Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.endpoint(path)?;
        log::debug!("POST {}", url);
        let resp = self.client.post(url).json(body).send()?;
        Self::read_envelope::<T>(resp)?.into_data()
    }
}

impl MemeBackend for HttpBackend {
    fn list_templates(&self) -> Result<Vec<Template>> {
        let templates: Vec<Template> = self.get("memes/templates")?;
        log::info!("Fetched {} templates", templates.len());
        Ok(templates)
    }

    fn upload_image(&self, file: &UploadFile) -> Result<UploadedImage> {
        let url = self.endpoint("upload")?;
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| Error::InvalidFile(format!("{}: {}", file.filename, e)))?;
        let form = multipart::Form::new().part("file", part);
        log::debug!("POST {} ({} bytes)", url, file.bytes.len());
        let resp = self.client.post(url).multipart(form).send()?;
        Self::read_envelope::<UploadedImage>(resp)?.into_data()
    }

    fn create_meme(&self, request: &CreateMemeRequest) -> Result<CreatedMeme> {
        self.post_json("memes/create", request)
    }

    fn create_custom_meme(&self, request: &CreateCustomMemeRequest) -> Result<CreatedMeme> {
        self.post_json("memes/create-custom", request)
    }

    fn list_memes(&self) -> Result<Vec<SavedMeme>> {
        self.get("memes")
    }

    fn delete_meme(&self, id: &str) -> Result<()> {
        // Path segment, so ids cannot escape the collection
        let mut url = self.endpoint("memes/")?;
        url.path_segments_mut()
            .map_err(|_| Error::ConfigError("API base cannot carry a path".into()))?
            .pop_if_empty()
            .push(id);
        log::debug!("DELETE {}", url);
        let resp = self.client.delete(url).send()?;
        Self::read_envelope::<serde_json::Value>(resp)?.into_ack()
    }
}
