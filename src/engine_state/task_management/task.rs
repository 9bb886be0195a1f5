//! # Task System Core Trait
//!
//! A `Task` is a unit of recurring background work. The `TaskManager` hands one shared
//! task to every worker thread, and each worker calls `process()` once per tick until
//! the manager shuts down.
//!
//! ## Thread Safety
//! - `Task` must be `Send + Sync`: every worker holds an `Arc` to the same instance
//! - `process()` takes `&self`, so any state the task mutates must be synchronized by
//!   the task itself

/// A unit of work run repeatedly by the worker pool.
///
/// # Implementation Guidelines
/// - Keep one call bounded; the worker can only notice a shutdown request between calls
/// - Handle errors internally; a worker has nowhere to report them but the log
pub trait Task: Send + Sync {
    /// Runs one tick of the task.
    ///
    /// # Returns
    /// `true` if the tick produced something, `false` if there was nothing to do
    fn process(&self) -> bool;
}
