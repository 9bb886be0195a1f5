//! # Task Management System
//!
//! A fixed pool of named worker threads that run one shared [`Task`] over and over.
//!
//! ## Worker Lifecycle
//! 1. `TaskManager::new()` spawns the workers; a failed spawn stops the already-running
//!    workers and is reported as an error
//! 2. Each worker calls `task.process()`, then sleeps for the tick interval
//! 3. `TaskManager::shutdown()` raises the stop flag, wakes sleeping workers and joins them
//!
//! Dropping the manager performs the same shutdown, so workers never outlive it.
//!
//! ## Example Usage
//! ```rust,ignore
//! let mut task_manager = TaskManager::new(
//!     Arc::new(MyTask::new(...)),
//!     WORKER_COUNT,
//!     Duration::from_millis(WORKER_INTERVAL_MS),
//! )?;
//!
//! // On exit:
//! task_manager.shutdown();
//! ```

pub mod task;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, info, warn};
use task::Task;

use crate::error::EngineError;

/// Default number of generation workers.
pub const WORKER_COUNT: usize = 19;
/// Default pause between two ticks of one worker, in milliseconds.
pub const WORKER_INTERVAL_MS: u64 = 100;

/// Manages a pool of worker threads running one shared task.
///
/// # Fields
/// - `workers`: Join handles of the running workers
/// - `shutdown`: Stop flag polled by every worker between ticks
pub struct TaskManager {
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl TaskManager {
    /// Spawns `worker_count` workers running `task`.
    ///
    /// # Arguments
    /// * `task` - The work every worker repeats
    /// * `worker_count` - Number of worker threads
    /// * `interval` - Pause after each tick
    ///
    /// # Errors
    /// [`EngineError::WorkerSpawn`] if the OS refuses to create a thread
    pub fn new(
        task: Arc<dyn Task>,
        worker_count: usize,
        interval: Duration,
    ) -> Result<Self, EngineError> {
        info!(
            "Starting {} workers (available parallelism: {:?})",
            worker_count,
            thread::available_parallelism()
        );

        let mut task_manager = TaskManager {
            workers: Vec::with_capacity(worker_count),
            shutdown: Arc::new(AtomicBool::new(false)),
        };

        for index in 0..worker_count {
            let task = task.clone();
            let shutdown = task_manager.shutdown.clone();

            let worker = thread::Builder::new()
                .name(format!("chunk-worker-{index}"))
                .spawn(move || {
                    while !shutdown.load(Ordering::Acquire) {
                        task.process();
                        thread::park_timeout(interval);
                    }
                    debug!("Worker {} stopped", index);
                })
                .map_err(EngineError::WorkerSpawn)?;

            task_manager.workers.push(worker);
        }

        Ok(task_manager)
    }

    /// Number of workers still attached to the manager.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Whether a shutdown has been requested.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Stops every worker and waits for it to finish its current tick.
    ///
    /// Idempotent. A worker that panicked is logged and otherwise ignored.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);

        for worker in &self.workers {
            worker.thread().unpark();
        }

        for worker in self.workers.drain(..) {
            let name = worker.thread().name().unwrap_or("worker").to_owned();
            if worker.join().is_err() {
                warn!("{} panicked before shutdown", name);
            }
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::HashSet,
        sync::{atomic::AtomicUsize, Mutex},
        time::Instant,
    };

    #[derive(Default)]
    struct CountingTask {
        ticks: AtomicUsize,
        threads: Mutex<HashSet<String>>,
    }

    impl Task for CountingTask {
        fn process(&self) -> bool {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            let name = thread::current().name().unwrap_or_default().to_owned();
            self.threads.lock().unwrap().insert(name);
            true
        }
    }

    fn wait_for(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn every_worker_runs_the_task_repeatedly() {
        let task = Arc::new(CountingTask::default());
        let mut manager = TaskManager::new(task.clone(), 3, Duration::from_millis(1)).unwrap();
        assert_eq!(manager.worker_count(), 3);

        wait_for(|| task.threads.lock().unwrap().len() == 3 && task.ticks.load(Ordering::SeqCst) > 6);
        manager.shutdown();

        let names = task.threads.lock().unwrap();
        assert!(names.contains("chunk-worker-0"));
        assert!(names.contains("chunk-worker-2"));
    }

    #[test]
    fn shutdown_stops_ticking_and_is_idempotent() {
        let task = Arc::new(CountingTask::default());
        let mut manager = TaskManager::new(task.clone(), 2, Duration::from_secs(60)).unwrap();
        wait_for(|| task.ticks.load(Ordering::SeqCst) >= 2);

        // Workers are parked for a minute; shutdown must wake them rather than wait.
        let started = Instant::now();
        manager.shutdown();
        assert!(started.elapsed() < Duration::from_secs(30));
        assert!(manager.is_shut_down());
        assert_eq!(manager.worker_count(), 0);

        let after = task.ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(task.ticks.load(Ordering::SeqCst), after);

        manager.shutdown();
    }

    #[test]
    fn drop_joins_workers() {
        let task = Arc::new(CountingTask::default());
        {
            let _manager = TaskManager::new(task.clone(), 2, Duration::from_millis(1)).unwrap();
            wait_for(|| task.ticks.load(Ordering::SeqCst) > 0);
        }
        // Only the test still holds the task once both workers have exited.
        assert_eq!(Arc::strong_count(&task), 1);
    }

    #[test]
    fn zero_workers_is_allowed() {
        let task = Arc::new(CountingTask::default());
        let manager = TaskManager::new(task.clone(), 0, Duration::from_millis(1)).unwrap();
        assert_eq!(manager.worker_count(), 0);
        drop(manager);
        assert_eq!(task.ticks.load(Ordering::SeqCst), 0);
    }
}
