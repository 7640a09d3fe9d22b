//! Virtual-time scheduler for deterministic tests.
//!
//! Virtual time only advances when explicitly instructed. Tasks run
//! synchronously inside `advance_by` / `advance_to` / `flush`, earliest
//! first and FIFO for equal times.
//!
//! # Usage
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//!
//! use rxlite::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let fired = Rc::new(Cell::new(false));
//! let c_fired = fired.clone();
//! scheduler.schedule(move || c_fired.set(true), Some(Duration::from_millis(100)));
//!
//! scheduler.advance_by(Duration::from_millis(99));
//! assert!(!fired.get());
//! scheduler.advance_by(Duration::from_millis(1));
//! assert!(fired.get());
//! ```
//!
//! Each instance owns its own clock and queue; clones share them.

use std::{
  cell::RefCell,
  cmp::Ordering,
  collections::BinaryHeap,
  fmt::{Debug, Formatter},
  rc::Rc,
};

use super::{Duration, Scheduler, TaskHandle};
use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  subscription::Subscription,
};

// ==================== Internal State ====================

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  task: Box<dyn FnOnce()>,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

// ==================== TestScheduler ====================

/// A virtual time scheduler for deterministic testing.
#[derive(Clone, Default)]
pub struct TestScheduler(Rc<RefCell<TestSchedulerState>>);

impl TestScheduler {
  /// Virtual time at which [`start`](TestScheduler::start) creates the
  /// observable.
  pub const CREATED: Duration = Duration::from_millis(100);
  /// Virtual time at which [`start`](TestScheduler::start) subscribes.
  pub const SUBSCRIBED: Duration = Duration::from_millis(200);
  /// Virtual time at which [`start`](TestScheduler::start) disposes.
  pub const DISPOSED: Duration = Duration::from_millis(1000);

  pub fn new() -> Self { Self::default() }

  /// Number of tasks waiting in the queue, cancelled ones included.
  pub fn pending_count(&self) -> usize { self.0.borrow().task_queue.len() }

  pub fn is_empty(&self) -> bool { self.0.borrow().task_queue.is_empty() }

  fn execute_tasks_until(&self, target_time: Option<Duration>) {
    loop {
      let task = {
        let mut state = self.0.borrow_mut();
        let due = state
          .task_queue
          .peek()
          .is_some_and(|peek| target_time.is_none_or(|limit| peek.scheduled_time <= limit));
        if !due {
          break;
        }
        let Some(task) = state.task_queue.pop() else { break };
        state.virtual_time = task.scheduled_time;
        task
      };

      if task.handle.is_closed() {
        continue;
      }
      (task.task)();
      task.handle.mark_finished();
    }
  }

  /// Advances virtual time by `duration`, running every task that falls due.
  pub fn advance_by(&self, duration: Duration) {
    let target = self.now() + duration;
    self.advance_to(target);
  }

  /// Advances virtual time to `time`, running every task that falls due. A
  /// time in the past runs what is already due and leaves the clock alone.
  pub fn advance_to(&self, time: Duration) {
    self.execute_tasks_until(Some(time));
    let mut state = self.0.borrow_mut();
    if state.virtual_time < time {
      state.virtual_time = time;
    }
  }

  /// Runs every pending task, moving the clock to each task's time. Tasks
  /// scheduled while flushing run too.
  pub fn flush(&self) { self.execute_tasks_until(None); }

  /// An observer recording every notification with the virtual time it
  /// arrived at.
  pub fn create_observer<Item, Err>(&self) -> TestObserver<Item, Err> {
    TestObserver { scheduler: self.clone(), messages: Rc::new(RefCell::new(vec![])) }
  }

  /// Runs the standard virtual-time scenario: `create` is called at
  /// [`CREATED`](Self::CREATED), the result is subscribed at
  /// [`SUBSCRIBED`](Self::SUBSCRIBED) and disposed at
  /// [`DISPOSED`](Self::DISPOSED). Returns the recording observer.
  pub fn start<S, F>(&self, create: F) -> TestObserver<S::Item, S::Err>
  where
    F: FnOnce() -> S + 'static,
    S: Observable + 'static,
  {
    let observer = self.create_observer();
    let source = Rc::new(RefCell::new(None));
    let subscription = Rc::new(RefCell::new(None));

    let c_source = source.clone();
    self.schedule_at(move || *c_source.borrow_mut() = Some(create()), Self::CREATED);

    let (c_source, c_subscription, c_observer) = (source, subscription.clone(), observer.clone());
    self.schedule_at(
      move || {
        let source = c_source.borrow_mut().take();
        if let Some(source) = source {
          let handle = source.subscribe_with(c_observer);
          *c_subscription.borrow_mut() = Some(handle);
        }
      },
      Self::SUBSCRIBED,
    );

    self.schedule_at(
      move || {
        let handle = subscription.borrow_mut().take();
        if let Some(handle) = handle {
          handle.unsubscribe();
        }
      },
      Self::DISPOSED,
    );

    self.advance_to(Self::DISPOSED);
    observer
  }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Duration { self.0.borrow().virtual_time }

  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + 'static,
  {
    let mut state = self.0.borrow_mut();
    let scheduled_time = state.virtual_time + delay.unwrap_or(Duration::ZERO);
    let handle = TaskHandle::pending();
    let task_id = state.next_task_id;
    state.next_task_id += 1;
    tracing::trace!(task_id, ?scheduled_time, "task scheduled on virtual time");
    state.task_queue.push(ScheduledTask {
      scheduled_time,
      task_id,
      task: Box::new(task),
      handle: handle.clone(),
    });
    handle
  }
}

impl Debug for TestScheduler {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.0.borrow();
    f.debug_struct("TestScheduler")
      .field("virtual_time", &state.virtual_time)
      .field("pending", &state.task_queue.len())
      .finish()
  }
}

// ==================== Recording observer ====================

/// A notification stamped with the virtual time it was observed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded<Item, Err> {
  pub time: Duration,
  pub value: Notification<Item, Err>,
}

/// Observer created by [`TestScheduler::create_observer`]. Clones share the
/// same recording.
pub struct TestObserver<Item, Err> {
  scheduler: TestScheduler,
  messages: Rc<RefCell<Vec<Recorded<Item, Err>>>>,
}

impl<Item, Err> Clone for TestObserver<Item, Err> {
  fn clone(&self) -> Self {
    TestObserver { scheduler: self.scheduler.clone(), messages: self.messages.clone() }
  }
}

impl<Item: Clone, Err: Clone> TestObserver<Item, Err> {
  pub fn messages(&self) -> Vec<Recorded<Item, Err>> { self.messages.borrow().clone() }

  /// Just the `next` values, in arrival order.
  pub fn values(&self) -> Vec<Item> {
    self
      .messages
      .borrow()
      .iter()
      .filter_map(|r| r.value.value().cloned())
      .collect()
  }
}

impl<Item, Err> TestObserver<Item, Err> {
  fn record(&self, value: Notification<Item, Err>) {
    let time = self.scheduler.now();
    self.messages.borrow_mut().push(Recorded { time, value });
  }
}

impl<Item, Err> Observer<Item, Err> for TestObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.record(Notification::Next(value)) }

  fn error(self, err: Err) { self.record(Notification::Error(err)) }

  fn complete(self) { self.record(Notification::Completed) }

  fn is_closed(&self) -> bool { false }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::prelude::*;

  // ==================== Time Advancement ====================

  #[rxlite_macro::test]
  fn test_advance_by_cumulative() {
    let scheduler = TestScheduler::new();
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(scheduler.now(), Duration::from_millis(100));
    scheduler.advance_by(Duration::from_millis(50));
    assert_eq!(scheduler.now(), Duration::from_millis(150));
  }

  #[rxlite_macro::test]
  fn test_fifo_for_equal_times() {
    let scheduler = TestScheduler::new();
    let order = Rc::new(RefCell::new(vec![]));
    for i in 0..3 {
      let c_order = order.clone();
      scheduler.schedule(move || c_order.borrow_mut().push(i), Some(Duration::from_millis(10)));
    }
    let c_order = order.clone();
    scheduler.schedule(move || c_order.borrow_mut().push(-1), Some(Duration::from_millis(5)));

    assert_eq!(scheduler.pending_count(), 4);
    scheduler.flush();
    assert_eq!(*order.borrow(), vec![-1, 0, 1, 2]);
    assert_eq!(scheduler.now(), Duration::from_millis(10));
  }

  #[rxlite_macro::test]
  fn test_cancelled_task_does_not_run() {
    let scheduler = TestScheduler::new();
    let ran = Rc::new(RefCell::new(false));
    let c_ran = ran.clone();
    let handle = scheduler.schedule(move || *c_ran.borrow_mut() = true, None);
    handle.clone().unsubscribe();
    scheduler.flush();
    assert!(!*ran.borrow());
    assert_eq!(handle.state(), crate::scheduler::TaskState::Cancelled);
  }

  #[rxlite_macro::test]
  fn test_tasks_scheduled_while_running() {
    let scheduler = TestScheduler::new();
    let order = Rc::new(RefCell::new(vec![]));
    let (c_scheduler, c_order) = (scheduler.clone(), order.clone());
    scheduler.schedule(
      move || {
        c_order.borrow_mut().push("outer");
        let c_order = c_order.clone();
        c_scheduler.schedule(move || c_order.borrow_mut().push("inner"), None);
      },
      None,
    );
    scheduler.advance_by(Duration::ZERO);
    assert_eq!(*order.borrow(), vec!["outer", "inner"]);
  }

  // ==================== Harness ====================

  #[rxlite_macro::test]
  fn start_records_with_virtual_times() {
    let scheduler = TestScheduler::new();
    let observer = scheduler.start(|| observable::of::<_, ()>(42));
    assert_eq!(
      observer.messages(),
      vec![
        Recorded { time: TestScheduler::SUBSCRIBED, value: Notification::Next(42) },
        Recorded { time: TestScheduler::SUBSCRIBED, value: Notification::Completed },
      ]
    );
  }

  #[rxlite_macro::test]
  fn start_disposes_at_the_end() {
    let scheduler = TestScheduler::new();
    let subject = Subject::<i32, ()>::new();
    let c_subject = subject.clone();
    let observer = scheduler.start(move || c_subject);
    assert_eq!(scheduler.now(), TestScheduler::DISPOSED);
    assert_eq!(subject.subscriber_count(), 0);
    subject.clone().next(1);
    assert!(observer.values().is_empty());
  }
}
