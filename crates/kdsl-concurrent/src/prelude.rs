//! Prelude module - commonly used types for convenient import.
//!
//! Use `use kdsl_concurrent::prelude::*;` to import all essential types.

// Errors
pub use crate::{ActionError, WriterError, WriterResult};

// Writer
pub use crate::{AsyncWriter, WriteHandle, WriterHandle, WriterOptions};
