use crate::{
  observable::Observable,
  observer::Observer,
  subscription::{MultiSubscription, Subscription},
};

/// Recovers from a source error.
///
/// The handler receives the error (the side channel: it may log it, push it
/// into a subject, flip a latch) and returns the observable the stream
/// continues with. Downstream never sees the original error.
#[derive(Clone)]
pub struct CatchError<S, F> {
  pub(crate) source: S,
  pub(crate) handler: F,
}

pub struct CatchErrorObserver<O, F> {
  observer: O,
  handler: F,
  subscription: MultiSubscription,
}

impl<S, F, R> Observable for CatchError<S, F>
where
  S: Observable,
  F: FnOnce(S::Err) -> R + 'static,
  R: Observable<Item = S::Item>,
{
  type Item = S::Item;
  type Err = R::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, R::Err> + 'static,
  {
    let subscription = MultiSubscription::default();
    let catcher =
      CatchErrorObserver { observer, handler: self.handler, subscription: subscription.clone() };
    subscription.add(self.source.actual_subscribe(catcher));
    subscription
  }
}

impl<O, F, R, Item, Err> Observer<Item, Err> for CatchErrorObserver<O, F>
where
  O: Observer<Item, R::Err> + 'static,
  F: FnOnce(Err) -> R,
  R: Observable<Item = Item>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    let fallback = (self.handler)(err);
    if self.subscription.is_closed() {
      return;
    }
    self
      .subscription
      .add(fallback.actual_subscribe(self.observer));
  }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn continues_with_the_fallback() {
    let seen = Rc::new(RefCell::new(vec![]));
    let caught = Rc::new(RefCell::new(vec![]));
    let (c_seen, c_caught) = (seen.clone(), caught.clone());

    let source = Subject::<bool, String>::new();
    source
      .clone()
      .catch_error(move |e| {
        c_caught.borrow_mut().push(e);
        observable::of::<_, Infallible>(false)
      })
      .subscribe(move |v| c_seen.borrow_mut().push(v));

    source.clone().next(true);
    source.clone().error("source failed".to_owned());
    assert_eq!(*seen.borrow(), vec![true, false]);
    assert_eq!(*caught.borrow(), vec!["source failed".to_owned()]);
  }

  #[rxlite_macro::test]
  fn unsubscribed_before_error_skips_fallback() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let source = Subject::<i32, ()>::new();
    let subscription = source
      .clone()
      .catch_error(|_| observable::of::<_, ()>(-1))
      .subscribe(move |v| c_seen.borrow_mut().push(v));
    subscription.unsubscribe();
    source.clone().error(());
    assert!(seen.borrow().is_empty());
  }
}
