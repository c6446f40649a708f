use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    time::{Duration, Instant},
};

use super::{ScheduleError, Scheduler, TimerId, TimerTask};

#[derive(Debug)]
struct Entry {
    deadline: Instant,
    id: TimerId,
    task: TimerTask,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Ties on the deadline are broken by scheduling order
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A queue of timers driven by an explicit clock
///
/// The owner moves the clock forward with [`advance_to`](TimerQueue::advance_to) and then
/// drains every task whose deadline has passed with [`pop_due`](TimerQueue::pop_due).
#[derive(Debug)]
pub struct TimerQueue {
    now: Instant,
    next_id: u64,
    heap: BinaryHeap<Reverse<Entry>>,
    closed: bool,
}

impl TimerQueue {
    /// Creates an empty queue whose clock starts at `now`
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            next_id: 0,
            heap: BinaryHeap::new(),
            closed: false,
        }
    }

    /// The current time as seen by the queue
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Moves the clock forward. Time never goes backwards.
    pub fn advance_to(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Removes and returns the earliest task whose deadline is not after the current time
    pub fn pop_due(&mut self) -> Option<TimerTask> {
        match self.heap.peek() {
            Some(Reverse(entry)) if entry.deadline <= self.now => {
                self.heap.pop().map(|Reverse(entry)| entry.task)
            }
            _ => None,
        }
    }

    /// The earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(entry)| entry.deadline)
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no task is pending
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Stops accepting new tasks. Tasks already queued still fire.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether [`close`](TimerQueue::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration, task: TimerTask) -> Result<TimerId, ScheduleError> {
        if self.closed {
            return Err(ScheduleError::Closed);
        }
        let deadline = self
            .now
            .checked_add(delay)
            .ok_or(ScheduleError::DeadlineOverflow)?;

        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Entry {
            deadline,
            id,
            task,
        }));
        Ok(id)
    }
}
