//! A worker abstraction to create thread pools.
//!
//! Tasks are submitted with a priority from the controlling thread, executed by a set of worker
//! threads, and their results are collected back by the controlling thread whenever it wants.

use std::sync::Arc;
use std::thread::JoinHandle;

mod threads;
pub use threads::Results;

/// The type used to represent the priority of a task.
///
/// Tasks with a higher priority are executed first.
pub type Priority = i32;

/// Describes the state of a worker.
///
/// This trait can be implemented by the user to provide custom worker implementations.
pub trait Worker {
    /// The input type of the worker.
    type Input;
    /// The output type of the worker.
    type Output;

    /// Runs the worker with the provided input.
    fn run(&mut self, input: Self::Input) -> Self::Output;
}

/// A handle to a pool of worker threads.
///
/// Dropping the handle stops the workers: queued tasks are discarded, tasks that are being
/// executed run to completion, and the threads are joined.
pub struct TaskPool<I, O> {
    /// The state shared with the worker threads.
    shared: Arc<threads::Shared<I, O>>,
    /// The worker threads.
    threads: Vec<JoinHandle<()>>,
}

impl<I, O> TaskPool<I, O> {
    /// Submits a new task to the task pool.
    #[inline]
    pub fn submit(&self, input: I, priority: Priority) {
        self.shared.submit(input, priority);
    }

    /// Submits a batch of tasks to the task pool.
    #[inline]
    pub fn submit_batch(&self, iter: impl IntoIterator<Item = (I, Priority)>) {
        self.shared.submit_batch(iter);
    }

    /// Removes the queued tasks for which `f` returns `false`.
    ///
    /// Tasks that are already being executed are not affected.
    #[inline]
    pub fn retain_tasks(&self, f: impl FnMut(&I) -> bool) {
        self.shared.retain_tasks(f);
    }

    /// Returns the results that have been produced by the workers so far.
    ///
    /// # Remarks
    ///
    /// The returned iterator holds a lock to an internal queue, so you better don't hold on to
    /// it for too long.
    #[inline]
    pub fn fetch_results(&self) -> Results<'_, O> {
        self.shared.fetch_results()
    }

    /// Returns the number of tasks that are waiting for a worker.
    #[inline]
    pub fn task_count(&self) -> usize {
        self.shared.task_count()
    }

    /// Returns the number of tasks that have been submitted but whose result has not been
    /// produced yet.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.shared.pending_count()
    }

    /// Returns the number of worker threads.
    #[inline]
    pub fn worker_count(&self) -> usize {
        self.threads.len()
    }
}

impl<I, O> Drop for TaskPool<I, O> {
    fn drop(&mut self) {
        self.shared.stop();
        for thread in self.threads.drain(..) {
            // A panicking worker already reported its panic through the panic hook.
            let _ = thread.join();
        }
    }
}

/// Starts a collection of worker threads and returns a handle to the task pool.
pub fn start<W, It>(workers: It) -> TaskPool<W::Input, W::Output>
where
    It: IntoIterator<Item = W>,
    W: 'static + Send + Worker,
    W::Input: Send + 'static,
    W::Output: Send + 'static,
{
    let shared = Arc::new(threads::Shared::default());

    let threads = workers
        .into_iter()
        .enumerate()
        .map(|(index, worker)| threads::spawn_worker(index, shared.clone(), worker))
        .collect();

    TaskPool { shared, threads }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct Square;

    impl Worker for Square {
        type Input = u32;
        type Output = (u32, u64);

        fn run(&mut self, input: u32) -> Self::Output {
            (input, input as u64 * input as u64)
        }
    }

    fn collect_all<O>(pool: &TaskPool<u32, O>, expected: usize) -> Vec<O> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut ret = Vec::new();
        while ret.len() < expected {
            assert!(Instant::now() < deadline, "workers did not finish in time");
            ret.extend(pool.fetch_results());
            std::thread::yield_now();
        }
        ret
    }

    #[test]
    fn every_task_produces_a_result() {
        let pool = start((0..3).map(|_| Square));
        assert_eq!(pool.worker_count(), 3);

        pool.submit_batch((0..50).map(|i| (i, i as Priority)));
        pool.submit(100, 0);

        let mut results = collect_all(&pool, 51);
        results.sort_unstable();
        assert_eq!(results.len(), 51);
        assert_eq!(results[7], (7, 49));
        assert_eq!(results[50], (100, 10_000));
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn retain_discards_queued_tasks() {
        // Without workers, nothing is ever executed.
        let pool: TaskPool<u32, (u32, u64)> = start(std::iter::empty::<Square>());
        pool.submit_batch((0..10).map(|i| (i, 0)));
        assert_eq!(pool.task_count(), 10);

        pool.retain_tasks(|&i| i % 2 == 0);
        assert_eq!(pool.task_count(), 5);
        assert_eq!(pool.pending_count(), 5);
    }

    #[test]
    fn dropping_the_pool_stops_the_workers() {
        let pool = start((0..2).map(|_| Square));
        pool.submit_batch((0..1000).map(|i| (i, 0)));
        drop(pool);
    }
}
