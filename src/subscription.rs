//! Subscription handles.
//!
//! A subscription is the control handle returned by `subscribe`; it owns the
//! sole right to stop delivery. Handles are cheap to clone where shared
//! state is involved, and `unsubscribe` is idempotent: closing an already
//! closed handle (or a clone of one) does nothing.

mod boxed;
mod multi;
mod tuple;

pub use boxed::*;
pub use multi::*;

/// Subscription returned from `Observable::actual_subscribe` to allow
/// unsubscribing.
pub trait Subscription {
  /// Stops delivery before the stream has finished (i.e. before `complete`
  /// or `error` is observed).
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;
}

/// Sources that finish synchronously hand back `()`: there is nothing left
/// to cancel.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<U: Subscription> Subscription for Option<U> {
  fn unsubscribe(self) {
    if let Some(u) = self {
      u.unsubscribe()
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Subscription::is_closed) }
}

/// Runs a teardown closure on unsubscribe.
pub struct ClosureSubscription<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> ClosureSubscription<F> {
  pub fn new(teardown: F) -> Self { Self(Some(teardown)) }
}

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  fn unsubscribe(mut self) {
    if let Some(teardown) = self.0.take() {
      teardown()
    }
  }

  fn is_closed(&self) -> bool { self.0.is_none() }
}

/// Wrapper around a subscription which provides the
/// `unsubscribe_when_dropped()` method.
pub struct SubscriptionWrapper<T: Subscription>(pub(crate) T);

impl<T: Subscription> SubscriptionWrapper<T> {
  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<T> { SubscriptionGuard::new(self.0) }

  /// Consumes this wrapper and returns the underlying subscription.
  pub fn into_inner(self) -> T { self.0 }
}

impl<T: Subscription> Subscription for SubscriptionWrapper<T> {
  #[inline]
  fn unsubscribe(self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(Some(subscription)) }

  /// Whether the guarded subscription is already closed.
  pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(s) = self.0.take() {
      s.unsubscribe()
    }
  }
}
