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

#[derive(Clone)]
pub struct CombineLatest<A, B, F> {
  pub(crate) a: A,
  pub(crate) b: B,
  pub(crate) combiner: F,
}

impl<A, B, F, Out> Observable for CombineLatest<A, B, F>
where
  A: Observable,
  B: Observable<Err = A::Err>,
  F: FnMut(A::Item, B::Item) -> Out + 'static,
  A::Item: Clone,
  B::Item: Clone,
  Out: 'static,
{
  type Item = Out;
  type Err = A::Err;
  type Unsub = MultiSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Out, A::Err> + 'static,
  {
    let subscription = MultiSubscription::default();
    let state = Rc::new(CombineLatestState {
      observer: Rc::new(Subscriber::new(observer)),
      subscription: subscription.clone(),
      latest: RefCell::new((None, None)),
      combiner: RefCell::new(self.combiner),
      completed: Cell::new(0),
    });
    subscription.add(self.a.actual_subscribe(AObserver(state.clone())));
    subscription.add(self.b.actual_subscribe(BObserver(state)));
    subscription
  }
}

enum CombineItem<A, B> {
  ItemA(A),
  ItemB(B),
}

struct CombineLatestState<A, B, F, Out, Err> {
  observer: Rc<dyn Publisher<Out, Err>>,
  subscription: MultiSubscription,
  latest: RefCell<(Option<A>, Option<B>)>,
  combiner: RefCell<F>,
  completed: Cell<u8>,
}

impl<A, B, F, Out, Err> CombineLatestState<A, B, F, Out, Err>
where
  F: FnMut(A, B) -> Out,
  A: Clone,
  B: Clone,
{
  fn next(&self, value: CombineItem<A, B>) {
    let pair = {
      let mut latest = self.latest.borrow_mut();
      match value {
        CombineItem::ItemA(v) => latest.0 = Some(v),
        CombineItem::ItemB(v) => latest.1 = Some(v),
      }
      match &*latest {
        (Some(a), Some(b)) => Some((a.clone(), b.clone())),
        _ => None,
      }
    };
    if let Some((a, b)) = pair {
      let out = (self.combiner.borrow_mut())(a, b);
      self.observer.publish(Notification::Next(out));
    }
  }

  fn error(&self, err: Err) {
    self.observer.publish(Notification::Error(err));
    self.subscription.clone().unsubscribe();
  }

  fn complete(&self) {
    let completed = self.completed.get() + 1;
    self.completed.set(completed);
    if completed == 2 {
      self.observer.publish(Notification::Completed);
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

struct AObserver<St>(Rc<St>);

struct BObserver<St>(Rc<St>);

impl<A, B, F, Out, Err> Observer<A, Err> for AObserver<CombineLatestState<A, B, F, Out, Err>>
where
  F: FnMut(A, B) -> Out,
  A: Clone,
  B: Clone,
{
  fn next(&mut self, value: A) { self.0.next(CombineItem::ItemA(value)) }

  fn error(self, err: Err) { self.0.error(err) }

  fn complete(self) { self.0.complete() }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<A, B, F, Out, Err> Observer<B, Err> for BObserver<CombineLatestState<A, B, F, Out, Err>>
where
  F: FnMut(A, B) -> Out,
  A: Clone,
  B: Clone,
{
  fn next(&mut self, value: B) { self.0.next(CombineItem::ItemB(value)) }

  fn error(self, err: Err) { self.0.error(err) }

  fn complete(self) { self.0.complete() }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}
