//! Boxed observable types for type erasure.
//!
//! Command sources and property chains are stored behind these so the
//! owning struct does not carry the whole operator pipeline in its type.

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  subscription::BoxedSubscription,
};

/// Object-safe observable.
pub trait DynObservable<Item, Err> {
  fn dyn_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> BoxedSubscription;
}

impl<S> DynObservable<S::Item, S::Err> for S
where
  S: Observable,
{
  fn dyn_subscribe(self: Box<Self>, observer: BoxedObserver<S::Item, S::Err>) -> BoxedSubscription {
    BoxedSubscription::new((*self).actual_subscribe(observer))
  }
}

/// A type-erased observable.
pub struct BoxedObservable<Item, Err>(Box<dyn DynObservable<Item, Err>>);

impl<Item, Err> BoxedObservable<Item, Err> {
  pub fn new(source: impl Observable<Item = Item, Err = Err> + 'static) -> Self {
    BoxedObservable(Box::new(source))
  }
}

impl<Item: 'static, Err: 'static> Observable for BoxedObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = BoxedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    self.0.dyn_subscribe(Box::new(observer))
  }
}
