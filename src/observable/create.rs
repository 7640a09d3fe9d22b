use std::{marker::PhantomData, rc::Rc};

use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  subscriber::{Publisher, Subscriber},
  subscription::{BoxedSubscription, Subscription},
};

/// Creates an observable from a subscribe function.
///
/// `f` runs once per subscription with an [`Emitter`] for that session. The
/// emitter is a cheap handle and may be stored to push later; the
/// subscription `f` returns runs when the session is unsubscribed.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::create::<i32, (), _, _>(|emitter| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
/// })
/// .subscribe(|v| println!("{v}"));
/// ```
pub fn create<Item, Err, F, U>(f: F) -> Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + 'static,
{
  Create { f, _marker: PhantomData }
}

#[derive(Clone)]
pub struct Create<F, Item, Err> {
  f: F,
  _marker: PhantomData<(Item, Err)>,
}

/// Push handle given to a [`create`] subscribe function.
pub struct Emitter<Item, Err>(Rc<dyn Publisher<Item, Err>>);

impl<Item, Err> Clone for Emitter<Item, Err> {
  fn clone(&self) -> Self { Emitter(self.0.clone()) }
}

impl<Item, Err> Emitter<Item, Err> {
  #[inline]
  pub fn next(&self, value: Item) { self.0.publish(Notification::Next(value)) }

  #[inline]
  pub fn error(&self, err: Err) { self.0.publish(Notification::Error(err)) }

  #[inline]
  pub fn complete(&self) { self.0.publish(Notification::Completed) }

  /// Whether the downstream still accepts notifications.
  #[inline]
  pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<F, Item, Err, U> Observable for Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + 'static,
  Item: 'static,
  Err: 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = (BoxedSubscription, U);

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    let subscriber = Subscriber::new(observer);
    let handle = BoxedSubscription::new(subscriber.handle());
    let teardown = (self.f)(Emitter(Rc::new(subscriber)));
    (handle, teardown)
  }
}
