use crate::api::{
    CreateCustomMemeRequest, CreateMemeRequest, CreatedMeme, MemeBackend, SavedMeme, UploadedImage,
};
use crate::model::Template;
use crate::upload::UploadFile;
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;

enum Command {
    ListTemplates(oneshot::Sender<Result<Vec<Template>>>),
    Upload(UploadFile, oneshot::Sender<Result<UploadedImage>>),
    Create(CreateMemeRequest, InFlight, oneshot::Sender<Result<CreatedMeme>>),
    CreateCustom(CreateCustomMemeRequest, InFlight, oneshot::Sender<Result<CreatedMeme>>),
    ListMemes(oneshot::Sender<Result<Vec<SavedMeme>>>),
    Delete(String, oneshot::Sender<Result<()>>),
    Close(oneshot::Sender<()>),
}

/// An async-friendly backend client backed by a dedicated worker thread.
///
/// The worker thread owns a blocking [`MemeBackend`] and executes commands
/// sent from async tasks one at a time. Meme creation is guarded by a single
/// in-flight flag: while one creation is pending, further creation calls fail
/// immediately with [`Error::SubmissionInFlight`]. Nothing is queued or
/// retried.
#[derive(Clone)]
pub struct MemeClient {
    cmd_tx: Sender<Command>,
    creating: Arc<AtomicBool>,
}

/// Holds the in-flight flag for one creation. It travels with the command,
/// so the flag stays set until the worker has finished the request even if
/// the caller stops waiting. Dropping an unsent command clears it too.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn worker_gone() -> Error {
    Error::Other("backend worker has stopped".into())
}

impl MemeClient {
    /// Move `backend` onto a new worker thread.
    pub fn new<B>(backend: B) -> Self
    where
        B: MemeBackend + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

        thread::spawn(move || {
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::ListTemplates(resp) => {
                        let _ = resp.send(backend.list_templates());
                    }
                    Command::Upload(file, resp) => {
                        let _ = resp.send(backend.upload_image(&file));
                    }
                    Command::Create(req, in_flight, resp) => {
                        let result = backend.create_meme(&req);
                        // Free before replying so the caller sees it cleared
                        drop(in_flight);
                        let _ = resp.send(result);
                    }
                    Command::CreateCustom(req, in_flight, resp) => {
                        let result = backend.create_custom_meme(&req);
                        drop(in_flight);
                        let _ = resp.send(result);
                    }
                    Command::ListMemes(resp) => {
                        let _ = resp.send(backend.list_memes());
                    }
                    Command::Delete(id, resp) => {
                        let _ = resp.send(backend.delete_meme(&id));
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
        });

        Self {
            cmd_tx,
            creating: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a client around the HTTP backend for `config`.
    #[cfg(feature = "api")]
    pub fn connect(config: &crate::MemeConfig) -> Result<Self> {
        Ok(Self::new(crate::http::HttpBackend::new(config)?))
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx.send(make(tx)).map_err(|_| worker_gone())?;
        rx.await.map_err(|_| worker_gone())?
    }

    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        self.call(Command::ListTemplates).await
    }

    pub async fn upload_image(&self, file: UploadFile) -> Result<UploadedImage> {
        self.call(|tx| Command::Upload(file, tx)).await
    }

    /// Whether a creation request is currently pending.
    pub fn is_creating(&self) -> bool {
        self.creating.load(Ordering::SeqCst)
    }

    fn begin_create(&self) -> Result<InFlight> {
        self.creating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::SubmissionInFlight)?;
        Ok(InFlight(self.creating.clone()))
    }

    pub async fn create_meme(&self, request: CreateMemeRequest) -> Result<CreatedMeme> {
        let in_flight = self.begin_create()?;
        self.call(|tx| Command::Create(request, in_flight, tx)).await
    }

    pub async fn create_custom_meme(&self, request: CreateCustomMemeRequest) -> Result<CreatedMeme> {
        let in_flight = self.begin_create()?;
        self.call(|tx| Command::CreateCustom(request, in_flight, tx)).await
    }

    pub async fn list_memes(&self) -> Result<Vec<SavedMeme>> {
        self.call(Command::ListMemes).await
    }

    pub async fn delete_meme(&self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        self.call(|tx| Command::Delete(id, tx)).await
    }

    /// Stop the worker thread. Other clones stop working as well.
    pub async fn close(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx.send(Command::Close(tx)).map_err(|_| worker_gone())?;
        rx.await.map_err(|_| worker_gone())
    }
}
