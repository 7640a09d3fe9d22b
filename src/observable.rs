//! The `Observable` trait and its factories.
//!
//! An observable is an immutable description of how to produce a stream.
//! Nothing happens until it is subscribed; subscribing twice yields two
//! independent sessions unless the observable wraps a subject.
//!
//! All operators are provided methods on [`Observable`], so a chain reads
//! left to right:
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxlite::prelude::*;
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let c_seen = seen.clone();
//! observable::from_iter::<_, ()>(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(move |v| c_seen.borrow_mut().push(v));
//! assert_eq!(*seen.borrow(), vec![0, 4, 8, 12, 16]);
//! ```

mod boxed;
mod combine_latest_all;
mod create;
mod from_iter;
mod of;

pub use boxed::*;
pub use combine_latest_all::*;
pub use create::*;
pub use from_iter::*;
pub use of::*;

use crate::{
  error::FirstValueError,
  observer::{FnObserver, Observer},
  ops::{
    catch_error::CatchError,
    combine_latest::CombineLatest,
    distinct_until_changed::DistinctUntilChanged,
    filter::{Filter, TryFilter},
    first::first_now,
    into_future::{observable_into_future, ObservableFuture},
    map::{Map, TryMap},
    map_err::MapErr,
    merge::Merge,
    observe_on::ObserveOn,
  },
  scheduler::Scheduler,
  subscriber::{Subscriber, SubscriberHandle},
  subscription::{Subscription, SubscriptionWrapper},
};

/// What every `subscribe*` entry point returns: the subscriber's own handle
/// paired with the subscription the source handed back.
pub type SubscribeHandle<U> = SubscriptionWrapper<(SubscriberHandle, U)>;

/// A push-based producer of values that terminates with completion or error.
pub trait Observable: Sized {
  type Item: 'static;
  type Err: 'static;
  type Unsub: Subscription + 'static;

  /// Connects `observer` to the source.
  ///
  /// Operators call this directly with their own observers. User code goes
  /// through the `subscribe*` methods, which wrap the observer in a
  /// [`Subscriber`] first.
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + 'static;

  // ==========================================================================
  // Entry points
  // ==========================================================================

  /// Subscribes any observer. Re-entrant notifications are queued and
  /// delivered in push order, and closing the returned handle stops delivery
  /// immediately.
  fn subscribe_with<O>(self, observer: O) -> SubscribeHandle<Self::Unsub>
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    let subscriber = Subscriber::new(observer);
    let handle = subscriber.handle();
    let unsub = self.actual_subscribe(subscriber);
    SubscriptionWrapper((handle, unsub))
  }

  /// Subscribes to values only. An error is not handed to the caller; it is
  /// logged at `debug` level and the subscription ends.
  fn subscribe<N>(self, next: N) -> SubscribeHandle<Self::Unsub>
  where
    N: FnMut(Self::Item) + 'static,
  {
    self.subscribe_with(FnObserver { next, error: swallow_error::<Self::Err>, complete: || {} })
  }

  fn subscribe_err<N, E>(self, next: N, error: E) -> SubscribeHandle<Self::Unsub>
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
  {
    self.subscribe_with(FnObserver { next, error, complete: || {} })
  }

  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> SubscribeHandle<Self::Unsub>
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
    C: FnOnce() + 'static,
  {
    self.subscribe_with(FnObserver { next, error, complete })
  }

  // ==========================================================================
  // Operators
  // ==========================================================================

  /// Transforms each value with `f`.
  fn map<B, F>(self, f: F) -> Map<Self, F>
  where
    F: FnMut(Self::Item) -> B + 'static,
  {
    Map { source: self, func: f }
  }

  /// Like [`map`](Observable::map), but an `Err` from `f` terminates the
  /// stream with that error instead of escaping the push call.
  fn try_map<B, F>(self, f: F) -> TryMap<Self, F>
  where
    F: FnMut(Self::Item) -> Result<B, Self::Err> + 'static,
  {
    TryMap { source: self, func: f }
  }

  /// Emits only the values for which `predicate` returns `true`.
  fn filter<F>(self, predicate: F) -> Filter<Self, F>
  where
    F: FnMut(&Self::Item) -> bool + 'static,
  {
    Filter { source: self, predicate }
  }

  /// Like [`filter`](Observable::filter); an `Err` from the predicate
  /// terminates the stream.
  fn try_filter<F>(self, predicate: F) -> TryFilter<Self, F>
  where
    F: FnMut(&Self::Item) -> Result<bool, Self::Err> + 'static,
  {
    TryFilter { source: self, predicate }
  }

  /// Suppresses a value equal to the one emitted just before it.
  fn distinct_until_changed(self) -> DistinctUntilChanged<Self>
  where
    Self::Item: PartialEq + Clone,
  {
    DistinctUntilChanged(self)
  }

  /// Combines the latest values of `self` and `other` every time either
  /// emits, once both have emitted at least once.
  fn combine_latest<S, F, Out>(self, other: S, combiner: F) -> CombineLatest<Self, S, F>
  where
    S: Observable<Err = Self::Err>,
    F: FnMut(Self::Item, S::Item) -> Out + 'static,
    Self::Item: Clone,
    S::Item: Clone,
  {
    CombineLatest { a: self, b: other, combiner }
  }

  /// Interleaves the values of `self` and `other`.
  fn merge<S>(self, other: S) -> Merge<Self, S>
  where
    S: Observable<Item = Self::Item, Err = Self::Err>,
  {
    Merge { a: self, b: other }
  }

  /// On error, hands the error to `handler` and continues with the
  /// observable it returns.
  fn catch_error<F, S>(self, handler: F) -> CatchError<Self, F>
  where
    F: FnOnce(Self::Err) -> S + 'static,
    S: Observable<Item = Self::Item>,
  {
    CatchError { source: self, handler }
  }

  /// Converts the error type.
  fn map_err<F, E>(self, f: F) -> MapErr<Self, F>
  where
    F: FnOnce(Self::Err) -> E + 'static,
    E: 'static,
  {
    MapErr { source: self, func: f }
  }

  /// Delivers every notification through `scheduler`.
  fn observe_on<Sch: Scheduler>(self, scheduler: Sch) -> ObserveOn<Self, Sch> {
    ObserveOn { source: self, scheduler }
  }

  /// Erases the concrete type.
  fn box_it(self) -> BoxedObservable<Self::Item, Self::Err>
  where
    Self: 'static,
  {
    BoxedObservable::new(self)
  }

  /// Subscribes, captures the first value or the error, then unsubscribes.
  ///
  /// Only what the source delivers synchronously during the call counts:
  /// a source with nothing to say yet yields
  /// [`FirstValueError::NotReady`].
  fn first_now(self) -> Result<Result<Self::Item, Self::Err>, FirstValueError> {
    first_now(self)
  }

  /// A future resolving to the single value (or the error) of this stream.
  fn into_future(self) -> ObservableFuture<Self::Item, Self::Err> {
    observable_into_future(|observer| {
      // The future holds no handle; the subscription ends with the stream.
      let _ = self.actual_subscribe(observer);
    })
  }
}

fn swallow_error<Err>(_: Err) {
  tracing::debug!(
    err_type = std::any::type_name::<Err>(),
    "error reached a subscriber without an error handler"
  );
}
