//! Session persistence and the background sync worker.
//!
//! A session lives either in a local directory (one JSON snapshot per session plus an
//! append-only move log) or behind an HTTP session server. The initial load blocks; every
//! later write goes through `SyncWorker`, which runs on its own thread with a
//! current-thread tokio runtime. Writes are best-effort: failures are logged and dropped,
//! never retried and never surfaced to gameplay.
//!
//! HTTP layout, relative to the configured base URL:
//!
//! ```text
//! GET  {base}/sessions/{id}        -> SessionSnapshot
//! POST {base}/sessions/{id}/state  <- SessionSnapshot
//! POST {base}/sessions/{id}/moves  <- MoveRecord
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tactics_core::{MoveRecord, SessionSnapshot, SyncRequest};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session id `{0}` may only contain letters, digits, `-` and `_`")]
    InvalidSessionId(String),
    #[error("session `{0}` not found")]
    NotFound(String),
    #[error("session file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("session JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("session server request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("session server answered {status} for {url}")]
    Status { status: u16, url: String },
}

fn check_session_id(session_id: &str) -> Result<(), StoreError> {
    let valid = !session_id.is_empty()
        && session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid { Ok(()) } else { Err(StoreError::InvalidSessionId(session_id.to_string())) }
}

#[derive(Clone, Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    pub fn moves_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.moves.jsonl"))
    }

    pub fn load(&self, session_id: &str) -> Result<SessionSnapshot, StoreError> {
        check_session_id(session_id)?;
        let path = self.state_path(session_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(session_id.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let mut snapshot: SessionSnapshot = serde_json::from_str(&content)?;
        snapshot.session_id = session_id.to_string();
        Ok(snapshot)
    }

    pub fn save_state(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        check_session_id(&snapshot.session_id)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.state_path(&snapshot.session_id);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(snapshot)?)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn record_move(&self, record: &MoveRecord) -> Result<(), StoreError> {
        check_session_id(&record.session_id)?;
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.moves_path(&record.session_id))?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct HttpSessionStore {
    base_url: String,
    http_client: Client,
}

impl HttpSessionStore {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let http_client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http_client })
    }

    pub fn session_url(&self, session_id: &str) -> String {
        format!("{}/sessions/{session_id}", self.base_url)
    }

    pub async fn load(&self, session_id: &str) -> Result<SessionSnapshot, StoreError> {
        check_session_id(session_id)?;
        let url = self.session_url(session_id);
        debug!(%url, "fetching session");
        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(session_id.to_string()));
        }
        if !status.is_success() {
            return Err(StoreError::Status { status: status.as_u16(), url });
        }
        let mut snapshot: SessionSnapshot = response.json().await?;
        snapshot.session_id = session_id.to_string();
        Ok(snapshot)
    }

    pub async fn save_state(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        check_session_id(&snapshot.session_id)?;
        let url = format!("{}/state", self.session_url(&snapshot.session_id));
        self.post(url, snapshot).await
    }

    pub async fn record_move(&self, record: &MoveRecord) -> Result<(), StoreError> {
        check_session_id(&record.session_id)?;
        let url = format!("{}/moves", self.session_url(&record.session_id));
        self.post(url, record).await
    }

    async fn post<T: Serialize>(&self, url: String, body: &T) -> Result<(), StoreError> {
        let response = self.http_client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { status: status.as_u16(), url });
        }
        Ok(())
    }
}

/// Where sessions are read from and written to.
#[derive(Clone, Debug)]
pub enum SessionBackend {
    File(FileSessionStore),
    Http(HttpSessionStore),
}

impl SessionBackend {
    pub fn describe(&self) -> String {
        match self {
            Self::File(store) => format!("file:{}", store.dir().display()),
            Self::Http(store) => store.base_url.clone(),
        }
    }

    pub async fn load(&self, session_id: &str) -> Result<SessionSnapshot, StoreError> {
        match self {
            Self::File(store) => store.load(session_id),
            Self::Http(store) => store.load(session_id).await,
        }
    }

    pub async fn apply(&self, request: &SyncRequest) -> Result<(), StoreError> {
        match (self, request) {
            (Self::File(store), SyncRequest::State(snapshot)) => store.save_state(snapshot),
            (Self::File(store), SyncRequest::Move(record)) => store.record_move(record),
            (Self::Http(store), SyncRequest::State(snapshot)) => store.save_state(snapshot).await,
            (Self::Http(store), SyncRequest::Move(record)) => store.record_move(record).await,
        }
    }
}

fn build_runtime() -> io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Blocking initial fetch. Any failure falls back to `fallback`, which the caller builds
/// from the configured map or the built-in roster.
pub fn load_or_fallback(
    backend: &SessionBackend,
    session_id: &str,
    fallback: impl FnOnce() -> SessionSnapshot,
) -> SessionSnapshot {
    let loaded = build_runtime()
        .map_err(StoreError::from)
        .and_then(|runtime| runtime.block_on(backend.load(session_id)));
    match loaded {
        Ok(snapshot) => {
            info!(session = session_id, backend = %backend.describe(), "session fetched");
            snapshot
        }
        Err(StoreError::NotFound(_)) => {
            info!(session = session_id, "no stored session, starting fresh");
            fallback()
        }
        Err(err) => {
            warn!(session = session_id, %err, "session fetch failed, using default roster");
            fallback()
        }
    }
}

/// Fire-and-forget writer. Requests are applied in submission order on a dedicated thread.
pub struct SyncWorker {
    sender: Option<mpsc::UnboundedSender<SyncRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    pub fn spawn(backend: SessionBackend) -> io::Result<Self> {
        let runtime = build_runtime()?;
        let (sender, mut receiver) = mpsc::unbounded_channel::<SyncRequest>();
        let handle = thread::Builder::new().name("session-sync".to_string()).spawn(move || {
            runtime.block_on(async move {
                while let Some(request) = receiver.recv().await {
                    if let Err(err) = backend.apply(&request).await {
                        warn!(%err, kind = request_kind(&request), "session sync failed");
                    } else {
                        debug!(kind = request_kind(&request), "session synced");
                    }
                }
            });
            debug!("session sync worker stopped");
        })?;
        Ok(Self { sender: Some(sender), handle: Some(handle) })
    }

    pub fn submit(&self, request: SyncRequest) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };
        if sender.send(request).is_err() {
            warn!("session sync worker is gone, dropping request");
        }
    }

    /// Flush queued requests and stop the worker thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender = None;
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("session sync worker panicked");
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn request_kind(request: &SyncRequest) -> &'static str {
    match request {
        SyncRequest::State(_) => "state",
        SyncRequest::Move(_) => "move",
    }
}
