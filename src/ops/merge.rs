use std::{cell::Cell, rc::Rc};

use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  subscriber::{Publisher, Subscriber},
  subscription::{MultiSubscription, Subscription},
};

/// Combines two observables into one by merging their emissions.
///
/// Completes once both sources completed. The first error terminates the
/// merged stream and disposes the other source.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
///
/// use rxlite::prelude::*;
///
/// let numbers = Subject::<i32, Infallible>::new();
/// let even = numbers.clone().filter(|v| *v % 2 == 0);
/// let odd = numbers.clone().filter(|v| *v % 2 != 0);
///
/// even.merge(odd).subscribe(|v| println!("{v}"));
/// ```
#[derive(Clone)]
pub struct Merge<A, B> {
  pub(crate) a: A,
  pub(crate) b: B,
}

impl<A, B> Observable for Merge<A, B>
where
  A: Observable,
  B: Observable<Item = A::Item, Err = A::Err>,
{
  type Item = A::Item;
  type Err = A::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<A::Item, A::Err> + 'static,
  {
    let subscription = MultiSubscription::default();
    let merge = MergeObserver(Rc::new(MergeState {
      observer: Rc::new(Subscriber::new(observer)),
      subscription: subscription.clone(),
      completed: Cell::new(0),
    }));
    subscription.add(self.a.actual_subscribe(merge.clone()));
    subscription.add(self.b.actual_subscribe(merge));
    subscription
  }
}

struct MergeState<Item, Err> {
  observer: Rc<dyn Publisher<Item, Err>>,
  subscription: MultiSubscription,
  completed: Cell<u8>,
}

pub struct MergeObserver<Item, Err>(Rc<MergeState<Item, Err>>);

impl<Item, Err> Clone for MergeObserver<Item, Err> {
  fn clone(&self) -> Self { MergeObserver(self.0.clone()) }
}

impl<Item, Err> Observer<Item, Err> for MergeObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.0.observer.publish(Notification::Next(value)) }

  fn error(self, err: Err) {
    self.0.observer.publish(Notification::Error(err));
    self.0.subscription.clone().unsubscribe();
  }

  fn complete(self) {
    let completed = self.0.completed.get() + 1;
    self.0.completed.set(completed);
    if completed == 2 {
      self.0.observer.publish(Notification::Completed);
    }
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}
