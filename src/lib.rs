//! memegen
//!
//! Meme composition for Rust: pick a template or supply an image, overlay
//! positioned text lines under one shared style, and either render the result
//! locally or hand it to a meme backend that returns a finished image URL.
//!
//! # Components
//!
//! - **Compositor** ([`rendering`]): background image + text lines + style →
//!   a fixed-size raster, deterministic for identical inputs
//! - **Editor** ([`editor::MemeEditor`]): the single owner of editing state
//! - **Loader** ([`loader`]): sequence-tagged asynchronous image decoding
//! - **Backend client** ([`api`], `http`, `async_api`): typed access to the
//!   template, upload, creation and gallery endpoints
//!
//! # Example
//!
//! ```
//! use memegen::editor::MemeEditor;
//! use memegen::rendering::Compositor;
//!
//! let mut editor = MemeEditor::new();
//! let top = editor.text_lines()[0].id;
//! editor.update_text(top, "ONE DOES NOT SIMPLY");
//!
//! let background = image::DynamicImage::new_rgba8(300, 300);
//! editor.set_image(background.into());
//!
//! let raster = editor.render_preview(&Compositor::default()).unwrap();
//! assert_eq!((raster.width, raster.height), (500, 500));
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod model;
pub use model::{FontFamily, ImageSource, Style, Template, TextColor, TextLine, TextLineId};

pub mod rendering;
pub use rendering::{Compositor, Raster};

pub mod api;
pub mod editor;
pub mod gallery;
pub mod loader;
pub mod upload;

// reqwest-backed implementation of the backend contract
#[cfg(feature = "api")]
pub mod http;

// Async-friendly client running a backend on a worker thread
pub mod async_api;
pub use async_api::MemeClient;

/// Configuration shared by the compositor, loader and backend client
///
/// Defaults target a backend running locally on port 8001 and the 500×500
/// canvas the editor previews on.
///
/// # Examples
///
/// ```
/// let cfg = memegen::MemeConfig::default();
/// assert_eq!(cfg.canvas.width, 500);
/// assert!(cfg.api_base.ends_with("/api"));
/// ```
#[derive(Debug, Clone)]
pub struct MemeConfig {
    /// Base URL of the backend API, e.g. `http://localhost:8001/api`
    pub api_base: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Timeout for backend calls and image fetches in milliseconds
    pub timeout_ms: u64,
    /// Output canvas size
    pub canvas: CanvasSize,
    /// Directory searched for font files; `None` uses the built-in face only
    pub fonts_dir: Option<PathBuf>,
}

impl Default for MemeConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8001/api".to_string(),
            user_agent: format!("memegen/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 30000,
            canvas: CanvasSize::default(),
            fonts_dir: Some(PathBuf::from("fonts")),
        }
    }
}

impl MemeConfig {
    /// Defaults overridden by `MEMEGEN_API_URL`, `MEMEGEN_TIMEOUT_MS` and
    /// `MEMEGEN_FONTS_DIR` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(url) = lookup("MEMEGEN_API_URL") {
            cfg.api_base = url;
        }
        if let Some(ms) = lookup("MEMEGEN_TIMEOUT_MS") {
            cfg.timeout_ms = ms
                .trim()
                .parse()
                .map_err(|_| Error::ConfigError(format!("MEMEGEN_TIMEOUT_MS is not a number: {}", ms)))?;
        }
        if let Some(dir) = lookup("MEMEGEN_FONTS_DIR") {
            cfg.fonts_dir = Some(PathBuf::from(dir));
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(Error::ConfigError("canvas must not be empty".into()));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(Error::ConfigError(format!(
                "api base must be an http(s) URL: {}",
                self.api_base
            )));
        }
        Ok(())
    }
}

/// Output canvas dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
        }
    }
}

/// Create the default backend for `config`: the HTTP client.
#[cfg(feature = "api")]
pub fn new_backend(config: &MemeConfig) -> Result<http::HttpBackend> {
    http::HttpBackend::new(config)
}
