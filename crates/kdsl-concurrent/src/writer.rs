//! The single-writer background queue.

use std::path::PathBuf;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace};

use crate::command::{Command, job_for};
use crate::error::{ActionError, WriterError, WriterResult};
use crate::handle::WriteHandle;
use crate::options::WriterOptions;

/// Serialises commands onto one dedicated worker thread.
///
/// Commands run strictly in submission order. The queue is bounded: once
/// [`WriterOptions::queue_capacity`] commands are waiting, blocking
/// submission parks the caller until the worker catches up.
///
/// A failing or panicking command is reported through its [`WriteHandle`]
/// and does not stop the worker.
///
/// # Example
///
/// ```rust
/// use kdsl_concurrent::AsyncWriter;
///
/// # fn main() -> kdsl_concurrent::WriterResult<()> {
/// let dir = tempfile::tempdir().unwrap();
/// let writer = AsyncWriter::start()?;
///
/// let handle = writer.write_file(dir.path().join("FooKt.class"), vec![0xCA_u8, 0xFE])?;
/// writer.close()?;
///
/// handle.wait()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AsyncWriter {
    submitter: WriterHandle,
    worker: Option<JoinHandle<()>>,
    thread_name: String,
}

impl AsyncWriter {
    /// Start a writer with default options.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Spawn`] if the worker thread cannot be created.
    pub fn start() -> WriterResult<Self> {
        Self::with_options(WriterOptions::default())
    }

    /// Start a writer with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::InvalidOptions`] for a zero or oversized
    /// capacity or an invalid thread name, and [`WriterError::Spawn`] if the worker thread
    /// cannot be created.
    pub fn with_options(options: WriterOptions) -> WriterResult<Self> {
        options.validate()?;

        let (tx, rx) = mpsc::channel(options.queue_capacity);
        let thread_name = options.thread_name.clone();
        let worker_name = thread_name.clone();

        let worker = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || run_worker(rx, &worker_name))
            .map_err(WriterError::Spawn)?;

        debug!(
            thread = %thread_name,
            capacity = options.queue_capacity,
            "writer started"
        );

        Ok(Self {
            submitter: WriterHandle { tx },
            worker: Some(worker),
            thread_name,
        })
    }

    /// A cloneable submitter for other producer threads.
    #[must_use]
    pub fn handle(&self) -> WriterHandle {
        self.submitter.clone()
    }

    /// Name of the worker thread.
    #[must_use]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Number of commands waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.submitter.pending()
    }

    /// Enqueue `action`, blocking while the queue is full.
    ///
    /// Returns as soon as the command is queued. Must not be called from
    /// within an async runtime; use [`AsyncWriter::submit_async`] there.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Closed`] if the worker has stopped.
    pub fn submit<F, T, E>(&self, action: F) -> WriterResult<WriteHandle<T>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<ActionError>,
    {
        self.submitter.submit(action)
    }

    /// Enqueue `action` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::QueueFull`] when the queue is at capacity and
    /// [`WriterError::Closed`] if the worker has stopped.
    pub fn try_submit<F, T, E>(&self, action: F) -> WriterResult<WriteHandle<T>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<ActionError>,
    {
        self.submitter.try_submit(action)
    }

    /// Enqueue `action`, waiting asynchronously while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Closed`] if the worker has stopped.
    pub async fn submit_async<F, T, E>(&self, action: F) -> WriterResult<WriteHandle<T>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<ActionError>,
    {
        self.submitter.submit_async(action).await
    }

    /// Enqueue a whole-file overwrite of `path` with `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Closed`] if the worker has stopped. Write
    /// failures surface as [`WriterError::Io`] through the handle.
    pub fn write_file(
        &self,
        path: impl Into<PathBuf>,
        bytes: impl Into<Vec<u8>>,
    ) -> WriterResult<WriteHandle<()>> {
        self.submitter.write_file(path, bytes)
    }

    /// Async counterpart of [`AsyncWriter::write_file`].
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Closed`] if the worker has stopped.
    pub async fn write_file_async(
        &self,
        path: impl Into<PathBuf>,
        bytes: impl Into<Vec<u8>>,
    ) -> WriterResult<WriteHandle<()>> {
        self.submitter.write_file_async(path, bytes).await
    }

    /// Stop the writer after every previously submitted command has run.
    ///
    /// The quit signal is queued behind pending commands, then the worker
    /// thread is joined. Commands submitted through other handles after this
    /// call are not guaranteed to run.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::WorkerPanicked`] if the worker thread died.
    pub fn close(mut self) -> WriterResult<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        if self.submitter.tx.blocking_send(Command::Quit).is_err() {
            debug!(thread = %self.thread_name, "writer already stopped before close");
        }

        worker.join().map_err(|_| WriterError::WorkerPanicked)?;
        debug!(thread = %self.thread_name, "writer closed");
        Ok(())
    }

    /// Async counterpart of [`AsyncWriter::close`].
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::WorkerPanicked`] if the worker thread died.
    pub async fn close_async(mut self) -> WriterResult<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        if self.submitter.tx.send(Command::Quit).await.is_err() {
            debug!(thread = %self.thread_name, "writer already stopped before close");
        }

        tokio::task::spawn_blocking(move || worker.join())
            .await
            .map_err(|_| WriterError::WorkerPanicked)?
            .map_err(|_| WriterError::WorkerPanicked)?;
        debug!(thread = %self.thread_name, "writer closed");
        Ok(())
    }
}

impl Drop for AsyncWriter {
    fn drop(&mut self) {
        if self.worker.is_some() {
            // The worker drains the queue and exits once every sender is gone.
            debug!(thread = %self.thread_name, "writer dropped without close; detaching worker");
        }
    }
}

/// Cloneable submission side of an [`AsyncWriter`].
///
/// Shares the writer's queue and ordering guarantees. Once the writer is
/// closed every submission fails with [`WriterError::Closed`].
#[derive(Debug, Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Command>,
}

impl WriterHandle {
    /// Number of commands waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tx.max_capacity().saturating_sub(self.tx.capacity())
    }

    /// See [`AsyncWriter::submit`].
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Closed`] if the worker has stopped.
    pub fn submit<F, T, E>(&self, action: F) -> WriterResult<WriteHandle<T>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<ActionError>,
    {
        let (job, handle) = job_for(wrap_action(action));
        self.tx
            .blocking_send(Command::Execute(job))
            .map_err(|_| WriterError::Closed)?;
        trace!("command queued");
        Ok(handle)
    }

    /// See [`AsyncWriter::try_submit`].
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::QueueFull`] or [`WriterError::Closed`].
    pub fn try_submit<F, T, E>(&self, action: F) -> WriterResult<WriteHandle<T>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<ActionError>,
    {
        let (job, handle) = job_for(wrap_action(action));
        self.tx
            .try_send(Command::Execute(job))
            .map_err(|e| match e {
                TrySendError::Full(_) => WriterError::QueueFull,
                TrySendError::Closed(_) => WriterError::Closed,
            })?;
        trace!("command queued");
        Ok(handle)
    }

    /// See [`AsyncWriter::submit_async`].
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Closed`] if the worker has stopped.
    pub async fn submit_async<F, T, E>(&self, action: F) -> WriterResult<WriteHandle<T>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<ActionError>,
    {
        let (job, handle) = job_for(wrap_action(action));
        self.tx
            .send(Command::Execute(job))
            .await
            .map_err(|_| WriterError::Closed)?;
        trace!("command queued");
        Ok(handle)
    }

    /// See [`AsyncWriter::write_file`].
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Closed`] if the worker has stopped.
    pub fn write_file(
        &self,
        path: impl Into<PathBuf>,
        bytes: impl Into<Vec<u8>>,
    ) -> WriterResult<WriteHandle<()>> {
        let (job, handle) = job_for(write_action(path.into(), bytes.into()));
        self.tx
            .blocking_send(Command::Execute(job))
            .map_err(|_| WriterError::Closed)?;
        Ok(handle)
    }

    /// See [`AsyncWriter::write_file_async`].
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Closed`] if the worker has stopped.
    pub async fn write_file_async(
        &self,
        path: impl Into<PathBuf>,
        bytes: impl Into<Vec<u8>>,
    ) -> WriterResult<WriteHandle<()>> {
        let (job, handle) = job_for(write_action(path.into(), bytes.into()));
        self.tx
            .send(Command::Execute(job))
            .await
            .map_err(|_| WriterError::Closed)?;
        Ok(handle)
    }
}

fn wrap_action<F, T, E>(action: F) -> impl FnOnce() -> WriterResult<T> + Send + 'static
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ActionError>,
{
    move || action().map_err(|e| WriterError::Action(e.into()))
}

fn write_action(path: PathBuf, bytes: Vec<u8>) -> impl FnOnce() -> WriterResult<()> + Send + 'static {
    move || {
        trace!(path = %path.display(), len = bytes.len(), "writing file");
        std::fs::write(&path, &bytes).map_err(|source| WriterError::Io { path, source })
    }
}

fn run_worker(mut rx: mpsc::Receiver<Command>, name: &str) {
    debug!(thread = %name, "writer thread started");
    let mut executed: u64 = 0;

    while let Some(command) = rx.blocking_recv() {
        match command {
            Command::Execute(job) => {
                job();
                executed = executed.saturating_add(1);
            },
            Command::Quit => break,
        }
    }

    debug!(thread = %name, executed, "writer thread stopped");
}
