//! Worker instructions and the job wrapper that reports their outcome.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tokio::sync::oneshot;
use tracing::{error, warn};

use crate::error::{WriterError, WriterResult};
use crate::handle::WriteHandle;

/// A type-erased unit of work executed on the writer thread.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Instruction consumed by the writer thread, in queue order.
pub(crate) enum Command {
    /// Run the job.
    Execute(Job),
    /// Stop the worker loop. Everything queued before it has already run.
    Quit,
}

/// Wrap `action` into a job whose outcome is delivered to the returned handle.
///
/// Errors and panics stay inside the job so the worker loop keeps running.
pub(crate) fn job_for<F, T>(action: F) -> (Job, WriteHandle<T>)
where
    F: FnOnce() -> WriterResult<T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    let job: Job = Box::new(move || {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(action)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(error = %e, "writer action failed");
                Err(e)
            },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "writer action panicked");
                Err(WriterError::ActionPanicked(message))
            },
        };

        // The submitter may have discarded its handle; nothing to report then.
        let _ = tx.send(outcome);
    });

    (job, WriteHandle::new(rx))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_reports_value() {
        let (job, handle) = job_for(|| Ok(42));
        job();
        assert_eq!(handle.wait().unwrap(), 42);
    }

    #[test]
    fn test_job_reports_error() {
        let (job, handle) = job_for::<_, ()>(|| Err(WriterError::Closed));
        job();
        assert!(matches!(handle.wait(), Err(WriterError::Closed)));
    }

    #[test]
    fn test_job_captures_panic() {
        let (job, handle) = job_for::<_, ()>(|| panic!("disk on fire"));
        job();
        match handle.wait() {
            Err(WriterError::ActionPanicked(msg)) => assert_eq!(msg, "disk on fire"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_dropped_job_cancels_handle() {
        let (job, handle) = job_for(|| Ok(()));
        drop(job);
        assert!(matches!(handle.wait(), Err(WriterError::Cancelled)));
    }
}
