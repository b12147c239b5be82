//! Run an async computation to completion from synchronous compile code.
//!
//! Compilation is synchronous, but resolving a state snapshot is not. When
//! the caller is already driving an async scheduler, blocking on a nested
//! runtime in the same thread would deadlock or panic, so the work moves to
//! a dedicated worker thread with its own runtime and the caller blocks
//! until it returns.

use std::future::Future;
use std::thread;

use crate::{CompileError, Result};

/// Where the caller of a compile step is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Inside an active async scheduler (e.g. a tokio task or `block_on`).
    Scheduler,
    /// Plain synchronous code with no scheduler on this thread.
    Blocking,
}

impl ExecutionContext {
    /// Best-effort detection for callers that do not track their context.
    pub fn detect() -> Self {
        if tokio::runtime::Handle::try_current().is_ok() {
            ExecutionContext::Scheduler
        } else {
            ExecutionContext::Blocking
        }
    }
}

/// Drive `future` to completion and return its output.
///
/// No cancellation and no timeout: the future either finishes or fails.
pub fn run_to_completion<F, T>(context: ExecutionContext, future: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send,
    T: Send,
{
    match context {
        ExecutionContext::Blocking => block_on(future),
        ExecutionContext::Scheduler => thread::scope(|scope| {
            scope
                .spawn(move || block_on(future))
                .join()
                .map_err(|_| CompileError::StateResolution("resolution worker panicked".into()))?
        }),
    }
}

fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
