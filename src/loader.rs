//! Image loading.
//!
//! [`ImageFetcher`] resolves a location (http(s) URL, `data:` URL or file
//! path) to a decoded image. [`ImageLoader`] runs the fetcher on a worker
//! thread: every request gets a [`LoadTicket`] with a monotonically increasing
//! sequence number, and every result is delivered through one completion sink,
//! [`LoadCompletions`]. Consumers compare the ticket of a completion with the
//! latest ticket they issued and drop anything older.

use crate::{Error, MemeConfig, Result};
use base64::Engine as _;
use image::DynamicImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Handle of one load request. Later requests carry larger sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub u64);

/// Result of one load request.
#[derive(Debug)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub location: String,
    pub result: Result<Arc<DynamicImage>>,
}

/// Resolves image locations to decoded images.
#[derive(Clone)]
pub struct ImageFetcher {
    #[cfg(feature = "api")]
    client: reqwest::blocking::Client,
}

impl ImageFetcher {
    pub fn new(config: &MemeConfig) -> Result<Self> {
        #[cfg(feature = "api")]
        {
            let client = reqwest::blocking::Client::builder()
                .timeout(std::time::Duration::from_millis(config.timeout_ms))
                .user_agent(config.user_agent.clone())
                .build()
                .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
            Ok(Self { client })
        }

        #[cfg(not(feature = "api"))]
        {
            let _ = config;
            Ok(Self {})
        }
    }

    pub fn fetch(&self, location: &str) -> Result<DynamicImage> {
        let location = location.trim();
        if location.is_empty() {
            return Err(Error::LoadError("empty image location".into()));
        }
        if location.starts_with("data:") {
            decode_data_url(location)
        } else if location.starts_with("http://") || location.starts_with("https://") {
            self.fetch_remote(location)
        } else {
            let bytes = std::fs::read(location)
                .map_err(|e| Error::LoadError(format!("{}: {}", location, e)))?;
            Ok(image::load_from_memory(&bytes)?)
        }
    }

    #[cfg(feature = "api")]
    fn fetch_remote(&self, url: &str) -> Result<DynamicImage> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", url, e)))?;
        if !resp.status().is_success() {
            return Err(Error::LoadError(format!("Failed to fetch {}: HTTP {}", url, resp.status())));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| Error::LoadError(format!("Failed to read {}: {}", url, e)))?;
        Ok(image::load_from_memory(&bytes)?)
    }

    #[cfg(not(feature = "api"))]
    fn fetch_remote(&self, url: &str) -> Result<DynamicImage> {
        Err(Error::LoadError(format!(
            "remote images need the `api` feature: {}",
            url
        )))
    }
}

/// Decode a `data:image/<type>;base64,<payload>` URL.
pub fn decode_data_url(url: &str) -> Result<DynamicImage> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::LoadError("not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::LoadError("data URL has no payload".into()))?;
    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or_default();
    if !mime.starts_with("image/") {
        return Err(Error::LoadError(format!("data URL is not an image: {}", mime)));
    }
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(Error::LoadError("only base64 data URLs are supported".into()));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::LoadError(format!("invalid base64 payload: {}", e)))?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Encode image bytes as a data URL, the form uploads are handed around in.
pub fn encode_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        content_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

enum Command {
    Load(LoadTicket, String),
    Shutdown,
}

/// Asynchronous image loader backed by a dedicated worker thread.
pub struct ImageLoader {
    cmd_tx: Sender<Command>,
    next_seq: AtomicU64,
}

/// The single sink all load results arrive on.
pub struct LoadCompletions {
    rx: UnboundedReceiver<LoadCompletion>,
}

impl ImageLoader {
    /// Spawn the worker thread. The returned sink receives every completion.
    pub fn spawn(fetcher: ImageFetcher) -> (Self, LoadCompletions) {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (done_tx, done_rx): (UnboundedSender<LoadCompletion>, _) = unbounded_channel();

        thread::spawn(move || {
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Load(ticket, location) => {
                        log::debug!("Loading image #{} from {}", ticket.0, summarize(&location));
                        let result = fetcher.fetch(&location).map(Arc::new);
                        if let Err(e) = &result {
                            log::warn!("Image load #{} failed: {}", ticket.0, e);
                        }
                        let completion = LoadCompletion { ticket, location, result };
                        if done_tx.send(completion).is_err() {
                            // Nobody is listening any more
                            break;
                        }
                    }
                    Command::Shutdown => break,
                }
            }
        });

        let loader = Self {
            cmd_tx,
            next_seq: AtomicU64::new(1),
        };
        (loader, LoadCompletions { rx: done_rx })
    }

    /// Queue a load and return its ticket.
    pub fn load(&self, location: impl Into<String>) -> Result<LoadTicket> {
        let ticket = LoadTicket(self.next_seq.fetch_add(1, Ordering::SeqCst));
        self.cmd_tx
            .send(Command::Load(ticket, location.into()))
            .map_err(|_| Error::Other("image loader worker has stopped".into()))?;
        Ok(ticket)
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

impl LoadCompletions {
    pub async fn recv(&mut self) -> Option<LoadCompletion> {
        self.rx.recv().await
    }

    /// Block until the next completion. Must not be called from within an
    /// async runtime.
    pub fn recv_blocking(&mut self) -> Option<LoadCompletion> {
        self.rx.blocking_recv()
    }

    pub fn try_recv(&mut self) -> Option<LoadCompletion> {
        self.rx.try_recv().ok()
    }
}

/// Data URLs are long; keep log lines readable.
fn summarize(location: &str) -> String {
    if location.len() > 64 {
        let cut = (0..=64).rev().find(|&i| location.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &location[..cut])
    } else {
        location.to_string()
    }
}
