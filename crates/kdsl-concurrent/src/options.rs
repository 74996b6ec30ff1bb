//! Writer construction options.

use crate::error::{WriterError, WriterResult};

/// Default number of commands the queue holds before submission blocks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Largest accepted queue capacity.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

/// Default name of the writer thread.
pub const DEFAULT_THREAD_NAME: &str = "kotlin-dsl-writer";

/// Options for [`AsyncWriter`](crate::AsyncWriter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Maximum number of queued, not yet executed commands.
    pub queue_capacity: usize,
    /// Name given to the worker thread.
    pub thread_name: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl WriterOptions {
    /// Create options with the default capacity and thread name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the worker thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub(crate) fn validate(&self) -> WriterResult<()> {
        if self.queue_capacity == 0 {
            return Err(WriterError::InvalidOptions(
                "queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(WriterError::InvalidOptions(format!(
                "queue_capacity must not exceed {MAX_QUEUE_CAPACITY}"
            )));
        }
        if self.thread_name.contains('\0') {
            return Err(WriterError::InvalidOptions(
                "thread_name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "config")]
impl From<&kdsl_config::WriterSection> for WriterOptions {
    fn from(section: &kdsl_config::WriterSection) -> Self {
        Self {
            queue_capacity: section.queue_capacity,
            thread_name: section.thread_name.clone(),
        }
    }
}
