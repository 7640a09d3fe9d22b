//! Schedulers: "invoke this action now or later".
//!
//! The command engine and property chains take a scheduler at construction
//! and route every externally observable emission through it. There is no
//! ambient or global scheduler; [`ImmediateScheduler`] is the documented
//! default and [`TestScheduler`] drives virtual time in tests.

mod immediate;
mod test_scheduler;

use std::{cell::Cell, rc::Rc};

pub use immediate::ImmediateScheduler;
pub use std::time::Duration;
pub use test_scheduler::{Recorded, TestObserver, TestScheduler};

use crate::subscription::Subscription;

/// Orders tasks and runs them, now or after a delay.
pub trait Scheduler: Clone + 'static {
  /// Current time on this scheduler's clock, measured from its origin.
  fn now(&self) -> Duration;

  /// Runs `task` after `delay` (or as soon as possible when `None`).
  ///
  /// Whether the delay blocks is up to the scheduler.
  /// [`ImmediateScheduler`] runs every task inline, so a positive delay
  /// sleeps the calling thread, and with it the whole single-threaded
  /// runtime. [`TestScheduler`] queues the task on its virtual clock and
  /// returns at once. Nothing in this crate passes a delay to the scheduler
  /// it is given.
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + 'static;

  /// Runs `task` at the absolute time `at`; a time in the past means now.
  fn schedule_at<F>(&self, task: F, at: Duration) -> TaskHandle
  where
    F: FnOnce() + 'static,
  {
    let delay = at.checked_sub(self.now()).filter(|d| !d.is_zero());
    self.schedule(task, delay)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  Pending,
  Finished,
  Cancelled,
}

/// Handle of a scheduled task. Unsubscribing cancels it if it has not run
/// yet.
#[derive(Debug, Clone)]
pub struct TaskHandle(Rc<Cell<TaskState>>);

impl TaskHandle {
  pub(crate) fn pending() -> Self { TaskHandle(Rc::new(Cell::new(TaskState::Pending))) }

  pub fn state(&self) -> TaskState { self.0.get() }

  pub(crate) fn mark_finished(&self) {
    if self.0.get() == TaskState::Pending {
      self.0.set(TaskState::Finished);
    }
  }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) {
    if self.0.get() == TaskState::Pending {
      self.0.set(TaskState::Cancelled);
    }
  }

  fn is_closed(&self) -> bool { self.0.get() != TaskState::Pending }
}
