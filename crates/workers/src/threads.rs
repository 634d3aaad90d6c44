use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::BinaryHeap;
use std::sync::atomic::Ordering::{Relaxed, SeqCst};
use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::{Priority, Worker};

/// A task with a payload.
struct Task<T> {
    priority: Priority,
    payload: T,
}

impl<T> PartialEq for Task<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl<T> Eq for Task<T> {}

impl<T> PartialOrd for Task<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Task<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// The state shared between a [`TaskPool`](crate::TaskPool) handle and its worker threads.
pub struct Shared<I, O> {
    /// The tasks that have been submitted, but not taken by a worker just yet.
    tasks: Mutex<BinaryHeap<Task<I>>>,
    /// The output values that have been produced by the workers.
    results: Mutex<Vec<O>>,
    /// Notified whenever a new task is pushed, and when the pool stops.
    condvar: Condvar,
    /// The number of tasks submitted whose result has not been pushed yet.
    pending: AtomicUsize,
    /// Whether the worker threads should stop.
    should_stop: AtomicBool,
}

impl<I, O> Default for Shared<I, O> {
    #[inline]
    fn default() -> Self {
        Self {
            tasks: Mutex::new(BinaryHeap::new()),
            results: Mutex::new(Vec::new()),
            condvar: Condvar::new(),
            pending: AtomicUsize::new(0),
            should_stop: AtomicBool::new(false),
        }
    }
}

impl<I, O> Shared<I, O> {
    /// Returns whether the worker threads should stop.
    #[inline]
    fn should_stop(&self) -> bool {
        self.should_stop.load(Relaxed)
    }

    /// Asks the worker threads to stop and wakes them up.
    pub fn stop(&self) {
        // Taking the lock makes sure that no worker is between its check of `should_stop` and
        // its call to `wait`, which would miss the notification.
        let mut lock = self.tasks.lock();
        self.should_stop.store(true, Relaxed);
        let discarded = lock.len();
        lock.clear();
        self.pending.fetch_sub(discarded, SeqCst);
        drop(lock);
        self.condvar.notify_all();
    }

    /// Returns the total number of tasks currently in the queue.
    #[inline]
    pub fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Returns the number of tasks whose result is not available yet.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(SeqCst)
    }

    /// Fetches a task to execute.
    ///
    /// If no task is available, the function blocks until a new task is pushed to the list.
    ///
    /// If the thread must stop, `None` is returned.
    fn fetch_task(&self) -> Option<I> {
        let mut lock = self.tasks.lock();
        loop {
            if self.should_stop() {
                return None;
            }

            match lock.pop() {
                Some(task) => return Some(task.payload),
                None => self.condvar.wait(&mut lock),
            }
        }
    }

    /// Submits a new task to be executed.
    pub fn submit(&self, payload: I, priority: Priority) {
        let mut lock = self.tasks.lock();
        lock.push(Task { payload, priority });
        self.pending.fetch_add(1, SeqCst);
        drop(lock);
        self.condvar.notify_one();
    }

    /// Submits a batch of tasks to be executed.
    pub fn submit_batch(&self, iter: impl IntoIterator<Item = (I, Priority)>) {
        let mut lock = self.tasks.lock();
        let before = lock.len();
        lock.extend(
            iter.into_iter()
                .map(|(payload, priority)| Task { payload, priority }),
        );
        self.pending.fetch_add(lock.len() - before, SeqCst);
        drop(lock);
        self.condvar.notify_all();
    }

    /// Removes the queued tasks that do not match the provided predicate.
    pub fn retain_tasks(&self, mut f: impl FnMut(&I) -> bool) {
        let mut lock = self.tasks.lock();
        let before = lock.len();
        lock.retain(|task| f(&task.payload));
        self.pending.fetch_sub(before - lock.len(), SeqCst);
    }

    /// Adds a result to the list of results.
    fn push_result(&self, output: O) {
        self.results.lock().push(output);
        self.pending.fetch_sub(1, SeqCst);
    }

    /// Returns an iterator over the results that were produced by the workers.
    pub fn fetch_results(&self) -> Results<'_, O> {
        Results(self.results.lock())
    }
}

/// An iterator over the results that were produced by the workers of a task pool.
///
/// Results are removed from the pool as they are yielded.
pub struct Results<'a, T>(MutexGuard<'a, Vec<T>>);

impl<'a, T> Iterator for Results<'a, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.pop()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len(), Some(self.0.len()))
    }
}

impl<'a, T> ExactSizeIterator for Results<'a, T> {
    #[inline]
    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Spawns a new worker thread.
pub fn spawn_worker<W>(
    index: usize,
    shared: Arc<Shared<W::Input, W::Output>>,
    mut worker: W,
) -> JoinHandle<()>
where
    W: 'static + Send + Worker,
    W::Output: Send + 'static,
    W::Input: Send + 'static,
{
    std::thread::Builder::new()
        .name(format!("worker-{index}"))
        .spawn(move || {
            while let Some(task) = shared.fetch_task() {
                let output = worker.run(task);
                shared.push_result(output);
            }
        })
        .unwrap_or_else(|err| panic!("failed to spawn worker thread {index}: {err}"))
}
