use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  subscriber::{Publisher, Subscriber},
  subscription::{MultiSubscription, Subscription},
};

/// Combines the latest values of every source in `sources`.
///
/// Emits `combiner(&latest)` each time any source emits, once every source
/// has emitted at least once. The first error from any source terminates the
/// result and disposes the other sources. The result completes only after
/// every source has completed; an empty `sources` completes immediately.
pub fn combine_latest_all<S, F, Out>(sources: Vec<S>, combiner: F) -> CombineLatestAll<S, F>
where
  S: Observable,
  S::Item: Clone,
  F: FnMut(&[S::Item]) -> Out + 'static,
{
  CombineLatestAll { sources, combiner }
}

pub struct CombineLatestAll<S, F> {
  sources: Vec<S>,
  combiner: F,
}

impl<S, F, Out> Observable for CombineLatestAll<S, F>
where
  S: Observable,
  S::Item: Clone,
  F: FnMut(&[S::Item]) -> Out + 'static,
  Out: 'static,
{
  type Item = Out;
  type Err = S::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Out, S::Err> + 'static,
  {
    let subscription = MultiSubscription::default();
    if self.sources.is_empty() {
      observer.complete();
      return subscription;
    }
    let state = Rc::new(CombineAllState {
      observer: Rc::new(Subscriber::new(observer)),
      subscription: subscription.clone(),
      latest: RefCell::new(vec![None; self.sources.len()]),
      combiner: RefCell::new(self.combiner),
      remaining: Cell::new(self.sources.len()),
    });
    for (index, source) in self.sources.into_iter().enumerate() {
      subscription.add(source.actual_subscribe(CombineAllObserver { state: state.clone(), index }));
    }
    subscription
  }
}

struct CombineAllState<Item, F, Out, Err> {
  observer: Rc<dyn Publisher<Out, Err>>,
  subscription: MultiSubscription,
  latest: RefCell<Vec<Option<Item>>>,
  combiner: RefCell<F>,
  remaining: Cell<usize>,
}

struct CombineAllObserver<Item, F, Out, Err> {
  state: Rc<CombineAllState<Item, F, Out, Err>>,
  index: usize,
}

impl<Item, F, Out, Err> Observer<Item, Err> for CombineAllObserver<Item, F, Out, Err>
where
  Item: Clone,
  F: FnMut(&[Item]) -> Out,
{
  fn next(&mut self, value: Item) {
    let snapshot = {
      let mut latest = self.state.latest.borrow_mut();
      latest[self.index] = Some(value);
      latest.iter().cloned().collect::<Option<Vec<_>>>()
    };
    if let Some(values) = snapshot {
      let out = (self.state.combiner.borrow_mut())(&values);
      self.state.observer.publish(Notification::Next(out));
    }
  }

  fn error(self, err: Err) {
    self.state.observer.publish(Notification::Error(err));
    self.state.subscription.clone().unsubscribe();
  }

  fn complete(self) {
    let remaining = self.state.remaining.get() - 1;
    self.state.remaining.set(remaining);
    if remaining == 0 {
      self.state.observer.publish(Notification::Completed);
    }
  }

  fn is_closed(&self) -> bool { self.state.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn waits_for_every_source() {
    let subjects: Vec<_> = (0..3).map(|_| Subject::<i32, ()>::new()).collect();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    observable::combine_latest_all(subjects.clone(), |vs| vs.iter().sum::<i32>())
      .subscribe(move |v| c_seen.borrow_mut().push(v));

    subjects[0].clone().next(1);
    subjects[1].clone().next(2);
    assert!(seen.borrow().is_empty());
    subjects[2].clone().next(3);
    subjects[0].clone().next(10);
    assert_eq!(*seen.borrow(), vec![6, 15]);
  }

  #[rxlite_macro::test]
  fn error_terminates_and_disposes_others() {
    let subjects: Vec<_> = (0..3).map(|_| Subject::<i32, &'static str>::new()).collect();
    let err = Rc::new(RefCell::new(None));
    let c_err = err.clone();
    observable::combine_latest_all(subjects.clone(), |vs| vs.len())
      .subscribe_err(|_| {}, move |e| *c_err.borrow_mut() = Some(e));

    subjects[1].clone().error("bad");
    assert_eq!(*err.borrow(), Some("bad"));
    assert_eq!(subjects[0].subscriber_count(), 0);
    assert_eq!(subjects[2].subscriber_count(), 0);
  }

  #[rxlite_macro::test]
  fn empty_sources_complete_immediately() {
    let completed = Rc::new(RefCell::new(false));
    let c_completed = completed.clone();
    observable::combine_latest_all(Vec::<Subject<i32, ()>>::new(), |vs| vs.len()).subscribe_all(
      |_| {},
      |_| {},
      move || *c_completed.borrow_mut() = true,
    );
    assert!(*completed.borrow());
  }
}
