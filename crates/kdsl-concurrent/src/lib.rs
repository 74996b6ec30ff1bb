//! Kotlin DSL Concurrent - single-writer background command queue.
//!
//! This crate provides:
//! - [`AsyncWriter`], one dedicated worker thread per instance
//! - A bounded FIFO queue with blocking backpressure (64 commands by default)
//! - Whole-file writes and arbitrary commands, executed strictly in order
//! - Per-command [`WriteHandle`]s carrying success or a typed failure
//!
//! # Fault model
//!
//! Every command's error or panic is captured and reported to the
//! submitter only. The worker keeps draining the queue, so one failed write
//! never wedges later producers.
//!
//! # Example
//!
//! ```rust
//! use kdsl_concurrent::{AsyncWriter, WriterOptions};
//!
//! # fn main() -> kdsl_concurrent::WriterResult<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let writer = AsyncWriter::with_options(WriterOptions::new().with_queue_capacity(16))?;
//!
//! let first = writer.write_file(dir.path().join("a.txt"), b"a".to_vec())?;
//! let length = writer.submit(|| Ok::<_, std::io::Error>(42_usize))?;
//!
//! writer.close()?;
//! first.wait()?;
//! assert_eq!(length.wait()?, 42);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod command;
mod error;
mod handle;
mod options;
mod writer;

pub use error::{ActionError, WriterError, WriterResult};
pub use handle::WriteHandle;
pub use options::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_THREAD_NAME, MAX_QUEUE_CAPACITY, WriterOptions,
};
pub use writer::{AsyncWriter, WriterHandle};
