//! Cooperative task scheduler
//!
//! Every suspended sequence (spawning, per-box transitions, the collapse) is
//! a [`Task`] polled once per tick on the simulation thread. Tasks are tagged
//! with the epoch they were started in; cancelling bumps the epoch and drops
//! every pending task, and completions from an older epoch are discarded
//! instead of fired.

use super::arrange::Collapse;
use super::spawn::SpawnSequencer;
use super::state::BoxId;
use super::transition::Transition;

/// Callback to run once a task finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Initial spawn sequence emitted every box
    SpawnFinished,
    /// The smallest box reached its column
    SortComplete,
    /// Every box was moved to the central tower
    CollapseFinished,
}

/// A suspended sequence
#[derive(Debug, Clone)]
pub enum Task {
    Spawn(SpawnSequencer),
    Move {
        id: BoxId,
        transition: Transition,
        on_done: Option<Completion>,
    },
    Collapse(Collapse),
}

/// A task plus the epoch that started it
#[derive(Debug, Clone)]
pub struct Scheduled {
    pub epoch: u64,
    pub task: Task,
}

/// A completion produced by a task in some epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub epoch: u64,
    pub completion: Completion,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    epoch: u64,
    tasks: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a task in the current epoch
    pub fn spawn(&mut self, task: Task) {
        self.tasks.push(Scheduled {
            epoch: self.epoch,
            task,
        });
    }

    /// Drop every pending task and invalidate their completions.
    /// Returns the number of tasks cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.tasks.len();
        self.tasks.clear();
        self.epoch += 1;
        cancelled
    }

    /// Move the pending tasks out for polling
    pub fn take_tasks(&mut self) -> Vec<Scheduled> {
        std::mem::take(&mut self.tasks)
    }

    /// Put polled tasks back, ahead of anything started while they were out
    pub fn restore(&mut self, survivors: Vec<Scheduled>) {
        let started = std::mem::take(&mut self.tasks);
        self.tasks = survivors.into_iter().chain(started).collect();
    }

    /// Let a completion through only if its epoch is still current
    pub fn accept(&self, fired: Fired) -> Option<Completion> {
        if fired.epoch == self.epoch {
            Some(fired.completion)
        } else {
            log::trace!(
                "Dropping stale {:?} from epoch {} (now {})",
                fired.completion,
                fired.epoch,
                self.epoch
            );
            None
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Pending per-box transitions
    pub fn moving_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|s| matches!(s.task, Task::Move { .. }))
            .count()
    }
}
