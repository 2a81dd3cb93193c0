//! Deferred callback queue drained by `tick`.

use std::collections::VecDeque;

use parking_lot::Mutex;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// FIFO of pending completions.
///
/// Jobs queued while a tick is draining run on the next tick, so a callback
/// that issues another call never sees that call complete re-entrantly.
#[derive(Default)]
pub(crate) struct CallbackQueue {
    jobs: Mutex<VecDeque<Job>>,
}

impl CallbackQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, job: Job) {
        self.jobs.lock().push_back(job);
    }

    /// Run every job queued before this call. Returns the number run.
    pub(crate) fn run_pending(&self) -> usize {
        let jobs: Vec<Job> = self.jobs.lock().drain(..).collect();
        let count = jobs.len();
        for job in jobs {
            job();
        }
        count
    }

    /// Drop every pending job without running it.
    pub(crate) fn clear(&self) -> usize {
        let jobs: Vec<Job> = self.jobs.lock().drain(..).collect();
        jobs.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.jobs.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_jobs_queued_during_drain_run_next_time() {
        let queue = Arc::new(CallbackQueue::new());
        let ran = Arc::new(AtomicUsize::new(0));

        let inner_queue = Arc::clone(&queue);
        let inner_ran = Arc::clone(&ran);
        queue.push(Box::new(move || {
            inner_ran.fetch_add(1, Ordering::SeqCst);
            let again = Arc::clone(&inner_ran);
            inner_queue.push(Box::new(move || {
                again.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_drops_jobs() {
        let queue = CallbackQueue::new();
        queue.push(Box::new(|| panic!("must not run")));
        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.run_pending(), 0);
    }
}
