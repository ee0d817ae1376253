//! Delayed tasks on the event thread.
//!
//! Tasks are plain values; whoever drains the queue decides what running one
//! means. Time is always passed in so the queue never reads the clock.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Handle to a posted task, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Single-threaded queue of tasks ordered by deadline
#[derive(Debug)]
pub struct TaskQueue<T> {
    next_id: u64,
    /// Keyed by (deadline, id) so equal deadlines run in posting order
    pending: BTreeMap<(Instant, TaskId), T>,
    deadlines: HashMap<TaskId, Instant>,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn post_delayed(&mut self, now: Instant, delay: Duration, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let deadline = now + delay;
        self.pending.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Remove a task that has not run yet. Returns false if it already ran
    /// or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.pending.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    /// Remove and return every task whose deadline is at or before `now`
    pub fn take_due(&mut self, now: Instant) -> Vec<(TaskId, T)> {
        let mut due = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, id), task) = entry.remove_entry();
            self.deadlines.remove(&id);
            due.push((id, task));
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
