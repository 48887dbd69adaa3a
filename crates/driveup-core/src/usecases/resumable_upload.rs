//! Resumable upload use case
//!
//! Drives one file through a OneDrive upload session, chunk by chunk:
//!
//! ```text
//!   gate ──► duplicate check ──► status query ──► read chunk ──► PUT
//!    ▲        (skipped after a partial ack)                        │
//!    │                                                             ▼
//!    └──────── 202: adopt session, reseek, reset retries ◄── response
//!                                    200/201: finished ─────────────┘
//! ```
//!
//! Every failure inside the loop is logged and counted; only exhausting the
//! retry ceiling ends `start_upload` with an error. The server's
//! next-expected offset is always authoritative, so the local cursor may
//! move backwards after a status query.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::{
    ChunkRange, ParentFolder, RemoteFile, TransferState, UploadError, UploadProgress,
    UploadSession, UploadUrl, DEFAULT_CHUNK_SIZE,
};
use crate::ports::{HttpRequest, IRequestExecutor, ISessionNegotiator, RequestMethod};
use crate::usecases::transfer_gate::TransferGate;

/// Consecutive failed attempts after which an upload is abandoned
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Tunables for a single upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Bytes per chunk; the final chunk carries the remainder
    pub chunk_size: u64,
    /// Retry ceiling; reaching it cancels the upload
    pub max_retries: u32,
    /// Pause between a failed attempt and the next one
    pub retry_delay: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::ZERO,
        }
    }
}

/// What is being uploaded and where to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    path: PathBuf,
    file_name: String,
    folder: ParentFolder,
    size: u64,
}

impl UploadTarget {
    /// Local source file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the file gets remotely
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Destination folder
    pub fn folder(&self) -> &ParentFolder {
        &self.folder
    }

    /// Source length captured when the upload was created
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Outcome of one successful pass through the loop body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The server acknowledged a chunk and expects more
    Advanced,
    /// The remote file exists; the gate is now terminal
    Completed,
}

/// Controller for a single resumable upload
///
/// Share it as `Arc<ResumableUpload>`: one task runs
/// [`start_upload`](Self::start_upload) while others may call
/// [`pause_upload`](Self::pause_upload), [`resume_upload`](Self::resume_upload)
/// or [`cancel_upload`](Self::cancel_upload).
pub struct ResumableUpload {
    target: UploadTarget,
    negotiator: Arc<dyn ISessionNegotiator + Send + Sync>,
    executor: Arc<dyn IRequestExecutor + Send + Sync>,
    options: UploadOptions,
    /// Source handle; `None` once released
    file: tokio::sync::Mutex<Option<File>>,
    /// The one live session descriptor
    session: Mutex<Option<UploadSession>>,
    gate: TransferGate,
    progress_tx: watch::Sender<UploadProgress>,
    result: Mutex<Option<RemoteFile>>,
}

/// Locks a std mutex, recovering the data if a previous holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ResumableUpload {
    /// Validates the source file, opens it and negotiates an upload session
    ///
    /// # Arguments
    ///
    /// * `negotiator` - Opens and queries upload sessions
    /// * `executor` - Sends chunk and cancel requests
    /// * `file` - Local file to upload
    /// * `file_name` - Name for the remote file
    /// * `folder` - Destination folder
    /// * `options` - Chunk size and retry policy
    ///
    /// # Errors
    ///
    /// [`UploadError::InvalidInput`] if the path is empty, missing, not a
    /// regular file or unreadable; otherwise whatever session negotiation
    /// returned. The file handle is closed before any error is returned.
    ///
    /// A zero-byte file is also rejected with [`UploadError::InvalidInput`],
    /// before any session is opened. Graph has no `Content-Range` for an
    /// empty body, so such an upload could only end in retry exhaustion.
    pub async fn new(
        negotiator: Arc<dyn ISessionNegotiator + Send + Sync>,
        executor: Arc<dyn IRequestExecutor + Send + Sync>,
        file: impl AsRef<Path>,
        file_name: impl Into<String>,
        folder: ParentFolder,
        options: UploadOptions,
    ) -> Result<Self, UploadError> {
        let path = file.as_ref();
        let file_name = file_name.into();

        if path.as_os_str().is_empty() {
            return Err(UploadError::InvalidInput("no file to upload was given".into()));
        }
        if file_name.trim().is_empty() {
            return Err(UploadError::InvalidInput("target file name is empty".into()));
        }
        if options.chunk_size == 0 || options.max_retries == 0 {
            return Err(UploadError::InvalidInput(format!(
                "chunk size and retry ceiling must be positive: {options:?}"
            )));
        }

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| UploadError::InvalidInput(format!("{}: {e}", path.display())))?;
        if !metadata.is_file() {
            return Err(UploadError::InvalidInput(format!(
                "{} is not a file",
                path.display()
            )));
        }
        if metadata.len() == 0 {
            return Err(UploadError::InvalidInput(format!(
                "{} is empty; upload sessions need at least one byte",
                path.display()
            )));
        }

        let handle = File::open(path).await.map_err(|e| {
            UploadError::InvalidInput(format!("File {} is not readable: {e}", path.display()))
        })?;

        // `handle` is dropped (closed) if negotiation fails.
        let session = negotiator.open_session(&folder, &file_name).await?;
        info!(
            file = %path.display(),
            name = %file_name,
            folder = %folder,
            size = metadata.len(),
            "Upload session created"
        );
        debug!(upload_url = %session.upload_url(), "Upload session URL");

        let size = metadata.len();
        let (progress_tx, _) = watch::channel(UploadProgress {
            bytes_confirmed: session.next_offset(),
            total: size,
        });

        Ok(Self {
            target: UploadTarget {
                path: path.to_path_buf(),
                file_name,
                folder,
                size,
            },
            negotiator,
            executor,
            options,
            file: tokio::sync::Mutex::new(Some(handle)),
            session: Mutex::new(Some(session)),
            gate: TransferGate::new(),
            progress_tx,
            result: Mutex::new(None),
        })
    }

    /// Like [`new`](Self::new), naming the remote file after the local one
    pub async fn for_file(
        negotiator: Arc<dyn ISessionNegotiator + Send + Sync>,
        executor: Arc<dyn IRequestExecutor + Send + Sync>,
        file: impl AsRef<Path>,
        folder: ParentFolder,
        options: UploadOptions,
    ) -> Result<Self, UploadError> {
        let path = file.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                UploadError::InvalidInput(format!("{} has no file name", path.display()))
            })?;
        Self::new(negotiator, executor, path, name, folder, options).await
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Source file length in bytes
    pub fn file_size(&self) -> u64 {
        self.target.size
    }

    /// Source file path
    pub fn upload_file(&self) -> &Path {
        &self.target.path
    }

    /// Upload target description
    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    /// Current lifecycle state
    pub fn state(&self) -> TransferState {
        self.gate.state()
    }

    /// Receiver observing lifecycle state changes
    pub fn subscribe_state(&self) -> watch::Receiver<TransferState> {
        self.gate.subscribe()
    }

    /// Receiver observing server-confirmed progress
    pub fn subscribe_progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress_tx.subscribe()
    }

    /// Copy of the live session descriptor
    pub fn session(&self) -> Option<UploadSession> {
        lock(&self.session).clone()
    }

    /// The remote file, once the upload finished
    pub fn finished_file(&self) -> Option<RemoteFile> {
        lock(&self.result).clone()
    }

    fn session_url(&self) -> Option<UploadUrl> {
        lock(&self.session)
            .as_ref()
            .map(|s| s.upload_url().clone())
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Asks the server how many bytes it has received
    ///
    /// Returns 0 when no session exists (e.g. after cancellation).
    ///
    /// # Errors
    /// [`UploadError::RemoteSession`] with the response body when the
    /// status query is answered with a non-success status
    pub async fn upload_status(&self) -> Result<u64, UploadError> {
        let Some(url) = self.session_url() else {
            return Ok(0);
        };
        let session = self.negotiator.query_status(&url).await?;
        Ok(session.next_offset())
    }

    // ========================================================================
    // Transfer loop
    // ========================================================================

    /// Runs the upload until it finishes, is canceled, or exhausts retries
    ///
    /// # Returns
    /// `Some(file)` when the remote file exists, `None` when canceled.
    /// Calling this again after a terminal state returns the same outcome
    /// without any I/O.
    ///
    /// # Errors
    /// [`UploadError::RetryLimitExceeded`] once `max_retries` consecutive
    /// attempts failed; the upload is canceled at that point.
    pub async fn start_upload(&self) -> Result<Option<RemoteFile>, UploadError> {
        let mut handle = self.file.lock().await;

        let outcome = match handle.as_mut() {
            Some(file) => {
                info!(name = %self.target.file_name, "Starting upload");
                self.run_transfer(file).await
            }
            None => Ok(()),
        };

        if handle.take().is_some() {
            debug!(file = %self.target.path.display(), "Released source file");
        }
        drop(handle);

        outcome?;
        let finished = self.finished_file();
        if finished.is_some() {
            info!(name = %self.target.file_name, "Finished upload");
        } else {
            info!(name = %self.target.file_name, state = %self.state(), "Upload ended without a remote file");
        }
        Ok(finished)
    }

    async fn run_transfer(&self, file: &mut File) -> Result<(), UploadError> {
        let mut retries: u32 = 0;
        let mut resumed = false;

        loop {
            let state = self.gate.wait_runnable().await;
            if !state.is_runnable() {
                debug!(%state, "Transfer loop exiting");
                return Ok(());
            }

            match self.attempt(file, &mut resumed).await {
                Ok(Step::Advanced) => retries = 0,
                Ok(Step::Completed) => {}
                Err(e) => {
                    retries += 1;
                    error!(
                        name = %self.target.file_name,
                        attempt = retries,
                        max = self.options.max_retries,
                        error = %e,
                        "Upload attempt failed"
                    );

                    if retries >= self.options.max_retries {
                        self.gate.cancel();
                        return Err(UploadError::RetryLimitExceeded {
                            attempts: retries,
                            last_error: e.to_string(),
                        });
                    }

                    let delay = e
                        .retry_after()
                        .map_or(self.options.retry_delay, |d| d.max(self.options.retry_delay));
                    if !delay.is_zero() {
                        debug!(delay_ms = delay.as_millis() as u64, "Waiting before next attempt");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    /// One pass of the loop body
    ///
    /// `resumed` is true when the previous pass adopted a session from a
    /// partial-chunk ack; the duplicate check and status query are skipped
    /// then.
    async fn attempt(&self, file: &mut File, resumed: &mut bool) -> Result<Step, UploadError> {
        let total = self.target.size;

        if !std::mem::take(resumed) {
            if let Some(existing) = self.find_duplicate().await {
                self.complete(existing);
                return Ok(Step::Completed);
            }

            let url = self.require_session_url()?;
            let session = self.negotiator.query_status(&url).await?;
            if session.is_expired() {
                warn!(expires_at = ?session.expires_at(), "Upload session reported as expired");
            }
            file.seek(SeekFrom::Start(session.next_offset())).await?;
            info!(
                next_offset = session.next_offset(),
                "Fetched upload session; server requests next chunk"
            );
            self.adopt(session);
        }

        let url = self.require_session_url()?;
        let cursor = file.stream_position().await?;
        let range = ChunkRange::next(cursor, total, self.options.chunk_size).ok_or_else(|| {
            UploadError::MalformedResponse(format!(
                "server expects offset {cursor} of a {total}-byte file"
            ))
        })?;

        let mut bytes = vec![0u8; range.len() as usize];
        file.read_exact(&mut bytes).await?;

        let request = HttpRequest::new(RequestMethod::Put, url.as_str())
            .header("Content-Length", range.content_length())
            .header("Content-Range", range.content_range())
            .body(bytes);

        debug!(
            start = range.start(),
            end = range.end(),
            total,
            final_chunk = range.is_final(),
            "Uploading chunk"
        );
        let response = self.executor.execute(request).await?;

        if !response.is_success() {
            if let Some(retry_after) = response.retry_after {
                return Err(UploadError::Throttled {
                    status: response.status,
                    retry_after,
                    body: response.body,
                });
            }
            return Err(UploadError::RemoteSession {
                status: Some(response.status),
                body: format!(
                    "uploading chunk {}-{} failed: {}",
                    range.start(),
                    range.end(),
                    response.body
                ),
            });
        }

        if response.is_complete() {
            let remote = RemoteFile::from_json(&response.body)?;
            self.complete(remote);
            return Ok(Step::Completed);
        }

        let session = UploadSession::from_json(&response.body, Some(&url))?;
        file.seek(SeekFrom::Start(session.next_offset())).await?;
        debug!(
            status = response.status,
            next_offset = session.next_offset(),
            "Chunk accepted"
        );
        self.adopt(session);
        *resumed = true;
        Ok(Step::Advanced)
    }

    /// Advisory lookup of an identical remote file
    ///
    /// "Not found" is silent; a failed lookup is logged and ignored.
    async fn find_duplicate(&self) -> Option<RemoteFile> {
        let path = self.target.folder.child_path(&self.target.file_name);
        match self.negotiator.find_file(&path).await {
            Ok(Some(existing)) if existing.size == self.target.size => {
                info!(
                    path = %path,
                    id = %existing.id,
                    "File already exists remotely with identical size, skipping upload"
                );
                Some(existing)
            }
            Ok(Some(existing)) => {
                debug!(
                    path = %path,
                    remote_size = existing.size,
                    local_size = self.target.size,
                    "Remote file differs in size"
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(path = %path, error = %e, "Duplicate check failed; continuing with upload");
                None
            }
        }
    }

    fn require_session_url(&self) -> Result<UploadUrl, UploadError> {
        self.session_url().ok_or_else(|| {
            UploadError::RemoteSession {
                status: None,
                body: "no upload session".to_string(),
            }
        })
    }

    /// Replaces the live session and publishes the new progress
    ///
    /// Dropped once the gate is terminal: a cancel that raced an in-flight
    /// request has already deleted the session remotely.
    fn adopt(&self, session: UploadSession) {
        let confirmed = session.next_offset();
        let mut slot = lock(&self.session);
        let state = self.gate.state();
        if state.is_terminal() {
            debug!(%state, "Discarding session reported after the upload ended");
            return;
        }
        *slot = Some(session);
        drop(slot);
        self.progress_tx.send_replace(UploadProgress {
            bytes_confirmed: confirmed,
            total: self.target.size,
        });
    }

    /// Records the remote file and moves the gate to `Finished`
    fn complete(&self, remote: RemoteFile) {
        let id = remote.id.clone();
        *lock(&self.result) = Some(remote);

        match self.gate.finish() {
            Ok(()) => {
                self.progress_tx.send_replace(UploadProgress {
                    bytes_confirmed: self.target.size,
                    total: self.target.size,
                });
                info!(id = %id, name = %self.target.file_name, "Upload complete");
            }
            Err(_) => {
                lock(&self.result).take();
                warn!(id = %id, "Upload completed remotely after it was canceled");
            }
        }
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Stops the loop at its next gate check
    ///
    /// A chunk already in flight completes first.
    pub fn pause_upload(&self) -> &Self {
        info!("Pausing upload");
        self.gate.pause();
        self
    }

    /// Lets a paused loop continue; a no-op if the upload is not paused
    pub fn resume_upload(&self) -> &Self {
        info!("Resuming upload");
        self.gate.resume();
        self
    }

    /// Cancels the upload and abandons the remote session
    ///
    /// The local state becomes `Canceled` even when the DELETE fails. A 404
    /// means the session is already gone and is not an error.
    ///
    /// # Errors
    /// The transport or remote error of the DELETE request
    pub async fn cancel_upload(&self) -> Result<&Self, UploadError> {
        info!("Canceling upload");
        // Must flip before the session is taken; `adopt` checks the gate
        // under the session lock.
        self.gate.cancel();

        let Some(session) = lock(&self.session).take() else {
            return Ok(self);
        };

        let request = HttpRequest::new(RequestMethod::Delete, session.upload_url().as_str());
        let response = self.executor.execute(request).await?;
        if !response.is_success() && response.status != 404 {
            return Err(UploadError::remote(response.status, response.body));
        }

        info!("Upload was canceled");
        Ok(self)
    }
}

impl std::fmt::Debug for ResumableUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumableUpload")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("state", &self.state())
            .field("session", &self.session())
            .finish()
    }
}
