// Registered job: a compiled schedule plus the callback it dispatches

use crate::schedule::Schedule;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

/// Callback type invoked when a job fires.
///
/// Arguments are bound by the caller as closure captures at registration
/// time; the registry never inspects them.
pub(crate) type JobFn =
    Arc<dyn Fn() -> BoxFuture<'static, Result<(), anyhow::Error>> + Send + Sync>;

/// One registered job. Immutable once built; the registry replaces
/// entries rather than editing them.
pub(crate) struct Job {
    pub(crate) name: String,
    pub(crate) schedule: Schedule,
    pub(crate) callback: JobFn,
}

impl Job {
    /// Invoke the callback as its own task, fire and forget.
    ///
    /// Failures stop here: an `Err` return or a panic is logged and
    /// dropped, so the tick loop and sibling jobs never observe it.
    pub(crate) fn dispatch(&self) {
        let name = self.name.clone();
        let callback = Arc::clone(&self.callback);
        tokio::spawn(async move {
            match AssertUnwindSafe(async move { callback().await })
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => {
                    debug!(job = %name, "Job completed");
                }
                Ok(Err(e)) => {
                    error!(job = %name, error = %e, "Job failed");
                }
                Err(panic) => {
                    error!(job = %name, panic = panic_message(panic.as_ref()), "Job panicked");
                }
            }
        });
    }
}

/// Best-effort extraction of a panic payload message.
fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
