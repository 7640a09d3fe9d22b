use std::time::Instant;

use once_cell::sync::Lazy;

use super::{Duration, Scheduler, TaskHandle};

static ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// Runs every task inline on the calling thread.
///
/// A positive delay puts the calling thread to sleep for that long first.
/// Nothing is ever deferred past the `schedule` call, so prefer
/// [`TestScheduler`](super::TestScheduler) wherever time has to pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn now(&self) -> Duration { ORIGIN.elapsed() }

  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + 'static,
  {
    if let Some(delay) = delay.filter(|d| !d.is_zero()) {
      tracing::debug!(?delay, "immediate scheduler blocking the caller");
      std::thread::sleep(delay);
    }
    let handle = TaskHandle::pending();
    task();
    handle.mark_finished();
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use super::*;
  use crate::{scheduler::TaskState, subscription::Subscription};

  #[rxlite_macro::test]
  fn runs_inline() {
    let ran = Rc::new(Cell::new(false));
    let c_ran = ran.clone();
    let handle = ImmediateScheduler.schedule(move || c_ran.set(true), None);
    assert!(ran.get());
    assert!(handle.is_closed());
    assert_eq!(handle.state(), TaskState::Finished);
  }

  #[rxlite_macro::test]
  fn delay_blocks_first() {
    let start = ImmediateScheduler.now();
    ImmediateScheduler.schedule(|| {}, Some(Duration::from_millis(5)));
    assert!(ImmediateScheduler.now() - start >= Duration::from_millis(5));
  }

  #[rxlite_macro::test]
  fn schedule_at_in_the_past_runs_now() {
    let ran = Rc::new(Cell::new(0));
    let c_ran = ran.clone();
    ImmediateScheduler.schedule_at(move || c_ran.set(c_ran.get() + 1), Duration::ZERO);
    assert_eq!(ran.get(), 1);
  }
}
