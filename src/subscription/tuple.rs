use super::Subscription;

/// A pair of subscriptions unsubscribed together.
///
/// Entry points combine the subscriber's own handle with whatever the source
/// returned this way, and `observe_on` pairs the source subscription with the
/// handle that stops pending scheduled deliveries.
impl<U1, U2> Subscription for (U1, U2)
where
  U1: Subscription,
  U2: Subscription,
{
  fn unsubscribe(self) {
    self.0.unsubscribe();
    self.1.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.0.is_closed() && self.1.is_closed() }
}
