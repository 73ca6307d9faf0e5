//! Single-threaded event loop with a virtual clock.
//!
//! # Responsibility
//! - Queue deferred work (store notifications, write-through, retry backoff).
//! - Run it deterministically in `(due time, post order)` order.
//!
//! # Invariants
//! - Tasks never run while the queue is borrowed, so a task may post more tasks.
//! - The clock only moves forward, and only through `advance`/`run_all`.
//! - Handles are `Rc`-based and intentionally not `Send`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

/// Deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct LoopInner {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), Task>,
}

/// Cloneable handle to one event loop.
#[derive(Clone, Default)]
pub struct EventLoop {
    inner: Rc<RefCell<LoopInner>>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since the loop was created.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Queues `task` to run on the next turn.
    pub fn post(&self, task: impl FnOnce() + 'static) {
        self.post_after(Duration::ZERO, task);
    }

    /// Queues `task` to run once the clock has advanced by `delay`.
    pub fn post_after(&self, delay: Duration, task: impl FnOnce() + 'static) {
        let mut inner = self.inner.borrow_mut();
        let due = inner.now.saturating_add(delay);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.queue.insert((due, seq), Box::new(task));
    }

    /// Number of queued tasks, due or not.
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Due time of the earliest queued task.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner
            .borrow()
            .queue
            .keys()
            .next()
            .map(|(due, _)| *due)
    }

    /// Runs every task due at the current time, including tasks they post.
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let now = self.now();
        self.run_through(now)
    }

    /// Moves the clock forward by `by`, running tasks as their deadlines pass.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        let ran = self.run_through(target);
        let mut inner = self.inner.borrow_mut();
        if inner.now < target {
            inner.now = target;
        }
        ran
    }

    /// Runs until the queue is empty, jumping the clock to each deadline.
    pub fn run_all(&self) -> usize {
        self.run_through(Duration::MAX)
    }

    fn run_through(&self, deadline: Duration) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop_due(deadline) {
            task();
            ran += 1;
        }
        ran
    }

    fn pop_due(&self, deadline: Duration) -> Option<Task> {
        let mut inner = self.inner.borrow_mut();
        let key = *inner.queue.keys().next()?;
        if key.0 > deadline {
            return None;
        }
        if key.0 > inner.now {
            inner.now = key.0;
        }
        inner.queue.remove(&key)
    }
}
