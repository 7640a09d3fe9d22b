//! IntoFuture operator implementation
//!
//! Converts an observable into a future resolving with its single value.
//!
//! ## Behavior
//!
//! - **Single value**: the future resolves with `Ok(Ok(value))`
//! - **Error from observable**: the future resolves with `Ok(Err(error))`
//! - **Empty observable**: the future resolves with
//!   `Err(IntoFutureError::Empty)`
//! - **Multiple values**: the future resolves with
//!   `Err(IntoFutureError::MultipleValues)`
//!
//! ## Examples
//!
//! ```rust
//! use rxlite::prelude::*;
//!
//! let value = futures::executor::block_on(observable::of::<_, ()>(42).into_future());
//! assert_eq!(value, Ok(Ok(42)));
//! ```

use std::{
  cell::RefCell,
  future::Future,
  pin::Pin,
  rc::Rc,
  task::{Context, Poll, Waker},
};

pub use crate::error::IntoFutureError;
use crate::observer::Observer;

/// The result type for `into_future()`.
///
/// - `Ok(Ok(value))` - Observable emitted exactly one value
/// - `Ok(Err(error))` - Observable emitted an error
/// - `Err(IntoFutureError::Empty)` - Observable completed without emitting
/// - `Err(IntoFutureError::MultipleValues)` - Observable emitted more than one
///   value
pub type IntoFutureResult<T, E> = Result<Result<T, E>, IntoFutureError>;

// ============================================================================
// Internal State
// ============================================================================

enum State<Item, Err> {
  Empty,
  HasValue(Item),
  MultipleValues,
  Error(Err),
}

struct SharedState<Item, Err> {
  state: State<Item, Err>,
  waker: Option<Waker>,
  completed: bool,
}

// ============================================================================
// ObservableFuture
// ============================================================================

/// A future that resolves with the value emitted by an observable.
///
/// Works for synchronous and asynchronous observables alike: the observer
/// stores the outcome in shared state and wakes the task once the stream
/// terminates.
pub struct ObservableFuture<Item, Err> {
  shared: Rc<RefCell<SharedState<Item, Err>>>,
}

impl<Item, Err> Future for ObservableFuture<Item, Err> {
  type Output = IntoFutureResult<Item, Err>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut shared = self.shared.borrow_mut();
    if shared.completed {
      let result = match std::mem::replace(&mut shared.state, State::Empty) {
        State::Empty => Err(IntoFutureError::Empty),
        State::HasValue(v) => Ok(Ok(v)),
        State::MultipleValues => Err(IntoFutureError::MultipleValues),
        State::Error(e) => Ok(Err(e)),
      };
      Poll::Ready(result)
    } else {
      shared.waker = Some(cx.waker().clone());
      Poll::Pending
    }
  }
}

// ============================================================================
// IntoFutureObserver
// ============================================================================

pub struct IntoFutureObserver<Item, Err> {
  shared: Rc<RefCell<SharedState<Item, Err>>>,
}

impl<Item, Err> IntoFutureObserver<Item, Err> {
  fn wake(&self) {
    let waker = self.shared.borrow_mut().waker.take();
    if let Some(waker) = waker {
      waker.wake();
    }
  }
}

impl<Item, Err> Observer<Item, Err> for IntoFutureObserver<Item, Err> {
  fn next(&mut self, value: Item) {
    let mut shared = self.shared.borrow_mut();
    match &shared.state {
      State::Empty => shared.state = State::HasValue(value),
      State::HasValue(_) => {
        shared.state = State::MultipleValues;
        shared.completed = true;
        drop(shared);
        self.wake();
      }
      State::MultipleValues | State::Error(_) => {}
    }
  }

  fn error(self, err: Err) {
    {
      let mut shared = self.shared.borrow_mut();
      if shared.completed {
        return;
      }
      shared.state = State::Error(err);
      shared.completed = true;
    }
    self.wake();
  }

  fn complete(self) {
    self.shared.borrow_mut().completed = true;
    self.wake();
  }

  fn is_closed(&self) -> bool { self.shared.borrow().completed }
}

/// Creates the future, handing its observer to `subscribe_fn`.
pub(crate) fn observable_into_future<T, E, F>(subscribe_fn: F) -> ObservableFuture<T, E>
where
  F: FnOnce(IntoFutureObserver<T, E>),
{
  let shared =
    Rc::new(RefCell::new(SharedState { state: State::Empty, waker: None, completed: false }));
  subscribe_fn(IntoFutureObserver { shared: shared.clone() });
  ObservableFuture { shared }
}
