//! Bounded worker pool
//!
//! A fixed set of threads consuming a shared job queue. Jobs are opaque
//! closures; results travel back over a per-job channel held by a
//! `JobHandle`. Abandoning a handle (or timing out on it) drops the result
//! when the worker finishes; no external resources are held mid-job, so
//! abandonment needs no cleanup beyond the drop.

use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a submitted job's eventual result.
pub struct JobHandle<T> {
    receiver: Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Blocks until the job finishes. Returns `None` if the pool shut
    /// down before the job ran.
    pub fn wait(self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Blocks up to `timeout` for the result. `None` means the deadline
    /// passed or the pool shut down; the in-flight computation is
    /// abandoned and its result dropped.
    pub fn wait_timeout(self, timeout: Duration) -> Option<T> {
        match self.receiver.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Fixed-size thread pool over a shared job queue.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                thread::spawn(move || {
                    debug!(worker = index, "export worker started");
                    loop {
                        // Hold the queue lock only for the dequeue itself.
                        let job = receiver.lock().recv();
                        match job {
                            Ok(job) => job(),
                            Err(_) => break,
                        }
                    }
                    debug!(worker = index, "export worker stopped");
                })
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job and returns a handle to its result.
    pub fn submit<T, F>(&self, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let wrapped: Job = Box::new(move || {
            // The caller may have abandoned the handle; a dead channel is
            // not an error.
            let _ = tx.send(job());
        });
        if let Some(sender) = &self.sender {
            let _ = sender.send(wrapped);
        }
        JobHandle { receiver: rx }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue ends each worker's recv loop.
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_jobs_run_and_report_back() {
        let pool = WorkerPool::new(4);
        let handles: Vec<_> = (0..16u64).map(|i| pool.submit(move || i * i)).collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
        assert_eq!(results, (0..16u64).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_size_is_clamped_to_one_worker() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.submit(|| 7).wait(), Some(7));
    }

    #[test]
    fn test_timeout_abandons_slow_job() {
        let pool = WorkerPool::new(1);
        let slow = pool.submit(|| {
            thread::sleep(Duration::from_millis(200));
            1
        });
        assert_eq!(slow.wait_timeout(Duration::from_millis(10)), None);

        // The pool keeps serving after an abandoned job.
        let next = pool.submit(|| 2);
        assert_eq!(next.wait_timeout(Duration::from_secs(5)), Some(2));
    }

    #[test]
    fn test_drop_joins_workers() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(2);
            for _ in 0..8 {
                let counter = Arc::clone(&counter);
                // Results are deliberately abandoned.
                let _ = pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            let flush = pool.submit(|| ());
            flush.wait();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }
}
