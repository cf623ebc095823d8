//! The list of memes the backend has stored.

use crate::api::{MemeBackend, SavedMeme};
use crate::{Error, Result};

#[derive(Debug, Default, Clone)]
pub struct Gallery {
    memes: Vec<SavedMeme>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memes(&self) -> &[SavedMeme] {
        &self.memes
    }

    pub fn is_empty(&self) -> bool {
        self.memes.is_empty()
    }

    /// Replace the list with the backend's. On failure the current list is
    /// kept.
    pub fn refresh(&mut self, backend: &dyn MemeBackend) -> Result<usize> {
        let memes = backend.list_memes()?;
        log::info!("Gallery holds {} memes", memes.len());
        self.memes = memes;
        Ok(self.memes.len())
    }

    /// Remove the meme locally, then ask the backend to delete it.
    ///
    /// The local removal is not undone when the backend call fails; the error
    /// is returned so the caller can report it.
    pub fn delete(&mut self, backend: &dyn MemeBackend, id: &str) -> Result<()> {
        let before = self.memes.len();
        self.memes.retain(|m| m.id != id);
        if self.memes.len() == before {
            log::debug!("Meme {} was not in the local list", id);
        }
        backend.delete_meme(id).map_err(|e| {
            log::warn!("Deleting meme {} failed: {}", id, e);
            e
        })
    }

    /// URL of a stored meme, to be used as a custom image.
    pub fn reuse(&self, id: &str) -> Result<&str> {
        self.memes
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.url.as_str())
            .ok_or_else(|| Error::InvalidInput(format!("no meme with id {}", id)))
    }
}
