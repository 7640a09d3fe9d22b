use super::Subscription;

/// Helper trait for calling unsubscribe on boxed trait objects
///
/// Since `Subscription::unsubscribe(self)` requires `Sized`, we need this
/// workaround trait to enable `Box<dyn Subscription>` to call unsubscribe.
pub trait BoxedSubscriptionInner {
  fn boxed_unsubscribe(self: Box<Self>);
  fn boxed_is_closed(&self) -> bool;
}

impl<T: Subscription> BoxedSubscriptionInner for T {
  #[inline]
  fn boxed_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn boxed_is_closed(&self) -> bool { self.is_closed() }
}

/// A type-erased subscription.
///
/// This allows storing heterogeneous subscriptions in collections, which is
/// what composite subscriptions and property chains do.
///
/// Subscriptions are control handles, not data views, so the boxed handle is
/// `'static`: it may be stored anywhere and unsubscribed at any later time.
///
/// # Examples
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let sub1 = BoxedSubscription::new(());
/// let sub2 = BoxedSubscription::new(());
///
/// let subs: Vec<BoxedSubscription> = vec![sub1, sub2];
/// for sub in subs {
///   sub.unsubscribe();
/// }
/// ```
pub struct BoxedSubscription(Box<dyn BoxedSubscriptionInner>);

impl BoxedSubscription {
  /// Create a new boxed subscription from any subscription type.
  #[inline]
  pub fn new(subscription: impl Subscription + 'static) -> Self { Self(Box::new(subscription)) }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.boxed_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.boxed_is_closed() }
}

impl std::fmt::Debug for BoxedSubscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BoxedSubscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}
