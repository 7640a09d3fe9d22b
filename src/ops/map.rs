use crate::{observable::Observable, observer::Observer};

#[derive(Clone)]
pub struct Map<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

pub struct MapObserver<O, F> {
  observer: O,
  func: F,
}

impl<S, F, B> Observable for Map<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> B + 'static,
  B: 'static,
{
  type Item = B;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<B, S::Err> + 'static,
  {
    self
      .source
      .actual_subscribe(MapObserver { observer, func: self.func })
  }
}

impl<O, F, Item, B, Err> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> B,
{
  fn next(&mut self, value: Item) { self.observer.next((self.func)(value)) }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// `map` with a fallible projection. The first `Err` is delivered as the
/// stream's error and the observer is dropped, so later upstream values are
/// ignored.
#[derive(Clone)]
pub struct TryMap<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

pub struct TryMapObserver<O, F> {
  observer: Option<O>,
  func: F,
}

impl<S, F, B> Observable for TryMap<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> Result<B, S::Err> + 'static,
  B: 'static,
{
  type Item = B;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<B, S::Err> + 'static,
  {
    self
      .source
      .actual_subscribe(TryMapObserver { observer: Some(observer), func: self.func })
  }
}

impl<O, F, Item, B, Err> Observer<Item, Err> for TryMapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_closed() {
      return;
    }
    match (self.func)(value) {
      Ok(v) => self.observer.next(v),
      Err(err) => self.observer.take().error(err),
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
