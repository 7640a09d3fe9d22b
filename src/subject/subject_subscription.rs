use std::{cell::RefCell, rc::Weak};

use super::subject_core::SubjectCore;
use crate::{subscriber::SubscriberHandle, subscription::Subscription};

/// Subscription handle for a subject.
///
/// Unsubscribing closes the subscriber at once (nothing else reaches it,
/// even from a broadcast already in progress) and removes it from the
/// subject's list. The handle holds the subject weakly, so it never keeps a
/// dropped subject alive.
pub struct SubjectSubscription<Item, Err> {
  pub(crate) core: Weak<RefCell<SubjectCore<Item, Err>>>,
  pub(crate) id: Option<usize>,
  pub(crate) handle: SubscriberHandle,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    self.handle.unsubscribe();
    let (Some(core), Some(id)) = (self.core.upgrade(), self.id) else {
      return;
    };
    let removed = core.borrow_mut().subscribers.remove(id);
    // Dropped outside the borrow: the observer's drop may touch the subject.
    drop(removed);
  }

  fn is_closed(&self) -> bool { self.handle.is_closed() }
}
