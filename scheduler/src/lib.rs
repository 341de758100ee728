#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic virtual-clock task queue backing every delayed callback.
//!
//! Time never moves on its own: the owner drains due tasks up to a deadline
//! with [`TaskQueue::pop_due`] and then settles the clock with
//! [`TaskQueue::advance_to`]. Tasks fire in `(due, sequence)` order, so two
//! tasks scheduled for the same instant fire in the order they were queued.

use std::{collections::BTreeMap, time::Duration};

use whack_core::{Scheduler, Task, TaskToken};

/// Task that fell due, paired with the token it was scheduled under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DueTask<T> {
    /// Token returned when the task was scheduled.
    pub token: TaskToken,
    /// Payload of the task.
    pub task: T,
}

/// Ordered queue of pending tasks keyed by their cancellation token.
#[derive(Clone, Debug)]
pub struct TaskQueue<T> {
    now: Duration,
    next_sequence: u64,
    pending: BTreeMap<TaskToken, T>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    /// Creates an empty queue with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_sequence: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of tasks that have been scheduled and neither fired nor been cancelled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Reports whether the task behind `token` is still pending.
    #[must_use]
    pub fn contains(&self, token: TaskToken) -> bool {
        self.pending.contains_key(&token)
    }

    /// Queues `task` to fire once `delay` has elapsed from the current time.
    pub fn push_after(&mut self, delay: Duration, task: T) -> TaskToken {
        let token = TaskToken::new(self.now.saturating_add(delay), self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let _ = self.pending.insert(token, task);
        token
    }

    /// Removes a pending task, returning its payload if it had not fired yet.
    pub fn remove(&mut self, token: TaskToken) -> Option<T> {
        self.pending.remove(&token)
    }

    /// Pops the earliest task due at or before `deadline`.
    ///
    /// The clock moves forward to the task's due time so that work scheduled
    /// while handling it is measured from the instant it fired.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<DueTask<T>> {
        let (&token, _) = self.pending.first_key_value()?;
        if token.due() > deadline {
            return None;
        }
        let task = self.pending.remove(&token)?;
        self.now = self.now.max(token.due());
        Some(DueTask { token, task })
    }

    /// Moves the clock to `deadline` once every due task has been drained.
    pub fn advance_to(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }

    /// Drops every pending task without firing it.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Scheduler for TaskQueue<Task> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule_after(&mut self, delay: Duration, task: Task) -> TaskToken {
        self.push_after(delay, task)
    }

    fn cancel(&mut self, token: TaskToken) -> bool {
        self.remove(token).is_some()
    }
}
