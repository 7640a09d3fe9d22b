use std::{
  any::Any,
  cell::RefCell,
  fmt::{Debug, Formatter},
  rc::Rc,
};

use smallvec::SmallVec;

use super::{BoxedSubscription, Subscription};

/// A shared, composite subscription.
///
/// Operators with several upstreams (`combine_latest`, `merge`,
/// `catch_error`) collect every upstream subscription here so one
/// `unsubscribe` tears them all down. Clones share the same state.
///
/// Adding to a composite that is already closed unsubscribes the added
/// subscription immediately; this covers sources that fail synchronously
/// while the remaining sources are still being subscribed.
#[derive(Clone, Default)]
pub struct MultiSubscription(Rc<RefCell<Inner>>);

#[derive(Default)]
struct Inner {
  closed: bool,
  teardown: SmallVec<[BoxedSubscription; 1]>,
}

impl MultiSubscription {
  pub fn add<S: Subscription + 'static>(&self, subscription: S) {
    if self.is_same(&subscription) {
      return;
    }
    let mut inner = self.0.borrow_mut();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.teardown.retain(|v| !v.is_closed());
      inner.teardown.push(BoxedSubscription::new(subscription));
    }
  }

  /// Number of subscriptions currently held.
  pub fn teardown_size(&self) -> usize { self.0.borrow().teardown.len() }

  fn is_same(&self, other: &dyn Any) -> bool {
    other
      .downcast_ref::<Self>()
      .is_some_and(|other| Rc::ptr_eq(&self.0, &other.0))
  }
}

impl Subscription for MultiSubscription {
  fn unsubscribe(self) {
    // Children may call back into this composite while they close.
    let teardown = {
      let mut inner = self.0.borrow_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    for sub in teardown {
      sub.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.borrow().closed }
}

impl Debug for MultiSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.borrow();
    f.debug_struct("MultiSubscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardown.len())
      .finish()
  }
}
