//! Gated, single-flight commands.
//!
//! A [`Command`] wraps an action together with the streams a UI binds to:
//!
//! - [`can_execute`](Command::can_execute): `true` while the caller's
//!   CanExecute source allows it, no execution is in flight and the command
//!   has not been latched off;
//! - [`is_executing`](Command::is_executing);
//! - [`thrown_exceptions`](Command::thrown_exceptions): every error the
//!   command ran into, delivered out of band;
//! - [`results`](Command::results): every value produced by any execution.
//!
//! Errors never escape a command. An action failure is reported on
//! `thrown_exceptions`, terminates that `execute` call's stream with the same
//! [`Exception`] instance, and leaves the command usable. A failure of the
//! CanExecute source is reported once on `thrown_exceptions` and latches the
//! command off for good.
//!
//! ```rust
//! use rxlite::prelude::*;
//!
//! let command = Command::create(|v: i32| Ok(v * 2));
//! assert_eq!(command.can_execute().first_now(), Ok(Ok(true)));
//! assert_eq!(command.execute(21).first_now(), Ok(Ok(42)));
//! ```
//!
//! Every externally observable emission goes through the command's
//! scheduler (see [`CommandBuilder::scheduler`]); the default is
//! [`ImmediateScheduler`].

use std::{
  cell::{Cell, RefCell},
  convert::Infallible,
  rc::{Rc, Weak},
};

use crate::{
  error::Exception,
  observable::{self, BoxedObservable, Observable},
  observer::Observer,
  ops::{distinct_until_changed::DistinctUntilChanged, observe_on::ObserveOn},
  scheduler::{ImmediateScheduler, Scheduler},
  subject::{BehaviorSubject, ReplaySubject, Subject},
  subscription::{BoxedSubscription, Subscription},
};

type Action<P, R> = Box<dyn FnMut(P) -> Result<BoxedObservable<R, Exception>, Exception>>;

/// The stream returned by [`Command::execute`].
pub type Execution<R, S> = ObserveOn<ReplaySubject<R, Exception>, S>;

/// `can_execute` and `is_executing` streams.
pub type StateStream<S> = ObserveOn<DistinctUntilChanged<BehaviorSubject<bool, Infallible>>, S>;

/// Hot streams that never fail: `thrown_exceptions` and `results`.
pub type HotStream<T, S> = ObserveOn<Subject<T, Infallible>, S>;

// ============================================================================
// Builder
// ============================================================================

/// Configures a [`Command`] before it starts listening to its CanExecute
/// source.
///
/// ```rust
/// use std::convert::Infallible;
///
/// use rxlite::prelude::*;
///
/// let allowed = BehaviorSubject::<bool, Infallible>::new(false);
/// let command = CommandBuilder::new(|name: &'static str| Ok(name.len()))
///   .can_execute(allowed.clone())
///   .build();
/// assert_eq!(command.can_execute().first_now(), Ok(Ok(false)));
///
/// allowed.clone().next(true);
/// assert_eq!(command.can_execute().first_now(), Ok(Ok(true)));
/// ```
pub struct CommandBuilder<P, R, S = ImmediateScheduler> {
  action: Action<P, R>,
  can_execute: Option<BoxedObservable<bool, Exception>>,
  scheduler: S,
}

impl<P, R> CommandBuilder<P, R>
where
  P: 'static,
  R: 'static,
{
  /// A command running a synchronous action.
  pub fn new<F>(mut action: F) -> Self
  where
    F: FnMut(P) -> Result<R, Exception> + 'static,
  {
    Self::from_observable(move |param| action(param).map(observable::of::<R, Exception>))
  }

  /// A command whose action returns an observable producing the result.
  pub fn from_observable<F, O>(mut action: F) -> Self
  where
    F: FnMut(P) -> Result<O, Exception> + 'static,
    O: Observable<Item = R, Err = Exception> + 'static,
  {
    CommandBuilder {
      action: Box::new(move |param| action(param).map(Observable::box_it)),
      can_execute: None,
      scheduler: ImmediateScheduler,
    }
  }
}

impl<P, R, S> CommandBuilder<P, R, S> {
  /// Gates execution on `source`. Until the source emits, the command cannot
  /// execute.
  pub fn can_execute<Src>(mut self, source: Src) -> Self
  where
    Src: Observable<Item = bool> + 'static,
    Src::Err: Into<Exception>,
  {
    self.can_execute = Some(source.map_err(Into::<Exception>::into).box_it());
    self
  }

  /// Routes every emission of the command through `scheduler`.
  pub fn scheduler<S2: Scheduler>(self, scheduler: S2) -> CommandBuilder<P, R, S2> {
    CommandBuilder { action: self.action, can_execute: self.can_execute, scheduler }
  }
}

impl<P, R, S> CommandBuilder<P, R, S>
where
  P: 'static,
  R: Clone + 'static,
  S: Scheduler,
{
  pub fn build(self) -> Command<P, R, S> {
    let has_source = self.can_execute.is_some();
    let gate = Gate { source: !has_source, ..Gate::default() };
    let inner = Rc::new(CommandInner {
      action: RefCell::new(self.action),
      scheduler: self.scheduler,
      can_execute: BehaviorSubject::new(gate.can_execute()),
      gate: RefCell::new(gate),
      is_executing: BehaviorSubject::new(false),
      thrown_exceptions: Subject::new(),
      results: Subject::new(),
      source_subscription: RefCell::new(None),
      execution: RefCell::new(None),
      refreshing: Cell::new(false),
      stale: Cell::new(false),
    });

    if let Some(source) = self.can_execute {
      let (on_error, on_next) = (Rc::downgrade(&inner), Rc::downgrade(&inner));
      let subscription = source
        .catch_error(move |err| {
          if let Some(inner) = on_error.upgrade() {
            inner.latch_off(err);
          }
          observable::empty::<bool, Infallible>()
        })
        .subscribe(move |allowed| {
          if let Some(inner) = on_next.upgrade() {
            inner.on_source(allowed);
          }
        });
      *inner.source_subscription.borrow_mut() = Some(BoxedSubscription::new(subscription));
    }

    Command { inner }
  }
}

// ============================================================================
// Command
// ============================================================================

/// A gated, single-flight action. See the [module docs](self).
///
/// Clones share the same command. It is disposed when the last clone is
/// dropped, or earlier through [`dispose`](Command::dispose).
pub struct Command<P, R, S = ImmediateScheduler> {
  inner: Rc<CommandInner<P, R, S>>,
}

impl<P, R, S> Clone for Command<P, R, S> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<P, R> Command<P, R>
where
  P: 'static,
  R: Clone + 'static,
{
  /// A command running a synchronous action, always allowed to execute.
  pub fn create<F>(action: F) -> Self
  where
    F: FnMut(P) -> Result<R, Exception> + 'static,
  {
    CommandBuilder::new(action).build()
  }

  /// A command whose action returns an observable producing the result.
  pub fn create_from_observable<F, O>(action: F) -> Self
  where
    F: FnMut(P) -> Result<O, Exception> + 'static,
    O: Observable<Item = R, Err = Exception> + 'static,
  {
    CommandBuilder::from_observable(action).build()
  }
}

impl<P, R, S> Command<P, R, S>
where
  P: 'static,
  R: Clone + 'static,
  S: Scheduler,
{
  /// Runs the action if the command can execute right now.
  ///
  /// The action is invoked exactly once, eagerly. The returned stream replays
  /// its outcome to every subscriber: the produced values, then completion,
  /// or the error the action failed with. When the command cannot execute
  /// the call is rejected and the stream completes without values.
  pub fn execute(&self, param: P) -> Execution<R, S> {
    let result = ReplaySubject::new();
    let execution = result.clone().observe_on(self.inner.scheduler.clone());

    let Some(generation) = self.inner.begin() else {
      tracing::debug!("execute rejected, the command cannot execute right now");
      result.complete();
      return execution;
    };
    self.inner.refresh();

    let outcome = {
      let mut action = self.inner.action.borrow_mut();
      (*action)(param)
    };
    let observer = ExecutionObserver { inner: Rc::downgrade(&self.inner), result, generation };
    match outcome {
      Ok(source) => {
        let subscription = source.actual_subscribe(observer);
        if self.inner.is_running(generation) {
          *self.inner.execution.borrow_mut() = Some(subscription);
        }
      }
      Err(err) => observer.error(err),
    }
    execution
  }

  /// Whether the command currently accepts `execute`, deduplicated.
  pub fn can_execute(&self) -> StateStream<S> {
    DistinctUntilChanged(self.inner.can_execute.clone()).observe_on(self.inner.scheduler.clone())
  }

  /// Whether an execution is in flight, deduplicated.
  pub fn is_executing(&self) -> StateStream<S> {
    DistinctUntilChanged(self.inner.is_executing.clone()).observe_on(self.inner.scheduler.clone())
  }

  /// Every error the command ran into. Never completes.
  pub fn thrown_exceptions(&self) -> HotStream<Exception, S> {
    self
      .inner
      .thrown_exceptions
      .clone()
      .observe_on(self.inner.scheduler.clone())
  }

  /// Every value produced by any execution.
  pub fn results(&self) -> HotStream<R, S> {
    self
      .inner
      .results
      .clone()
      .observe_on(self.inner.scheduler.clone())
  }
}

impl<P, R, S> Command<P, R, S> {
  /// Stops listening to the CanExecute source and to a running execution,
  /// then completes `can_execute`, `is_executing` and `results`. Later
  /// `execute` calls are rejected. Idempotent.
  pub fn dispose(&self) { self.inner.dispose() }

  pub fn is_disposed(&self) -> bool { self.inner.gate.borrow().disposed }

  /// Whether a CanExecute source failure has latched the command off.
  pub fn is_latched_off(&self) -> bool { self.inner.gate.borrow().latched_off }
}

// ============================================================================
// Internals
// ============================================================================

#[derive(Default)]
struct Gate {
  /// What the CanExecute source last said; `true` when there is no source.
  source: bool,
  in_flight: bool,
  latched_off: bool,
  disposed: bool,
  generation: u64,
}

impl Gate {
  fn can_execute(&self) -> bool {
    self.source && !self.in_flight && !self.latched_off && !self.disposed
  }
}

struct CommandInner<P, R, S> {
  action: RefCell<Action<P, R>>,
  scheduler: S,
  gate: RefCell<Gate>,
  can_execute: BehaviorSubject<bool, Infallible>,
  is_executing: BehaviorSubject<bool, Infallible>,
  thrown_exceptions: Subject<Exception, Infallible>,
  results: Subject<R, Infallible>,
  source_subscription: RefCell<Option<BoxedSubscription>>,
  execution: RefCell<Option<BoxedSubscription>>,
  /// A `refresh` is publishing; nested calls only mark the state stale.
  refreshing: Cell<bool>,
  stale: Cell<bool>,
}

impl<P, R, S> CommandInner<P, R, S> {
  /// Marks an execution as started, returning its generation, or `None`
  /// when the gate is closed.
  fn begin(&self) -> Option<u64> {
    let mut gate = self.gate.borrow_mut();
    if !gate.can_execute() {
      return None;
    }
    gate.in_flight = true;
    gate.generation += 1;
    Some(gate.generation)
  }

  fn is_running(&self, generation: u64) -> bool {
    let gate = self.gate.borrow();
    gate.in_flight && gate.generation == generation
  }

  /// Pushes the current gate state into the state cells.
  ///
  /// A subscriber reacting to the push may change the gate (by calling
  /// `execute`, for instance). The nested call is folded into the running
  /// one, which publishes again until the cells hold the latest state.
  fn refresh(&self) {
    if self.refreshing.replace(true) {
      self.stale.set(true);
      return;
    }
    loop {
      self.stale.set(false);
      let (enabled, executing) = {
        let gate = self.gate.borrow();
        if gate.disposed {
          break;
        }
        (gate.can_execute(), gate.in_flight)
      };
      self.can_execute.clone().next(enabled);
      self.is_executing.clone().next(executing);
      if !self.stale.get() {
        break;
      }
    }
    self.refreshing.set(false);
  }

  fn on_source(&self, allowed: bool) {
    {
      let mut gate = self.gate.borrow_mut();
      if gate.latched_off || gate.disposed {
        return;
      }
      gate.source = allowed;
    }
    self.refresh();
  }

  fn latch_off(&self, err: Exception) {
    {
      let mut gate = self.gate.borrow_mut();
      if gate.latched_off || gate.disposed {
        return;
      }
      gate.latched_off = true;
    }
    tracing::warn!(error = %err, "can-execute source failed, command latched off");
    self.refresh();
    self.thrown_exceptions.clone().next(err);
  }

  fn finish(&self, generation: u64) {
    if !self.is_running(generation) {
      return;
    }
    self.gate.borrow_mut().in_flight = false;
    let finished = self.execution.borrow_mut().take();
    drop(finished);
    self.refresh();
  }

  fn dispose(&self) {
    {
      let mut gate = self.gate.borrow_mut();
      if gate.disposed {
        return;
      }
      gate.disposed = true;
    }
    let source = self.source_subscription.borrow_mut().take();
    if let Some(source) = source {
      source.unsubscribe();
    }
    let execution = self.execution.borrow_mut().take();
    if let Some(execution) = execution {
      execution.unsubscribe();
    }
    tracing::debug!("command disposed");

    self.can_execute.clone().next(false);
    self.can_execute.clone().complete();
    self.is_executing.clone().next(false);
    self.is_executing.clone().complete();
    self.results.close();
  }
}

impl<P, R, S> Drop for CommandInner<P, R, S> {
  fn drop(&mut self) { self.dispose() }
}

/// Forwards one execution's outcome to its result stream and to the
/// command's shared streams.
struct ExecutionObserver<P, R, S> {
  inner: Weak<CommandInner<P, R, S>>,
  result: ReplaySubject<R, Exception>,
  generation: u64,
}

impl<P, R, S> Observer<R, Exception> for ExecutionObserver<P, R, S>
where
  R: Clone + 'static,
{
  fn next(&mut self, value: R) {
    if let Some(inner) = self.inner.upgrade() {
      if !inner.gate.borrow().disposed {
        inner.results.clone().next(value.clone());
      }
    }
    self.result.next(value);
  }

  fn error(self, err: Exception) {
    if let Some(inner) = self.inner.upgrade() {
      tracing::debug!(error = %err, "command execution failed");
      inner.thrown_exceptions.clone().next(err.clone());
      inner.finish(self.generation);
    }
    self.result.error(err);
  }

  fn complete(self) {
    if let Some(inner) = self.inner.upgrade() {
      inner.finish(self.generation);
    }
    self.result.complete();
  }

  fn is_closed(&self) -> bool { self.result.is_terminated() }
}
