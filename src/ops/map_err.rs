use crate::{observable::Observable, observer::Observer};

#[derive(Clone)]
pub struct MapErr<S, F> {
  pub source: S,
  pub func: F,
}

pub struct MapErrObserver<O, F> {
  observer: O,
  func: F,
}

impl<O, F, Item, Err, OutErr> Observer<Item, Err> for MapErrObserver<O, F>
where
  O: Observer<Item, OutErr>,
  F: FnOnce(Err) -> OutErr,
{
  fn next(&mut self, value: Item) { self.observer.next(value); }

  fn error(self, err: Err) {
    let out_err = (self.func)(err);
    self.observer.error(out_err);
  }

  fn complete(self) { self.observer.complete(); }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, OutErr> Observable for MapErr<S, F>
where
  S: Observable,
  F: FnOnce(S::Err) -> OutErr + 'static,
  OutErr: 'static,
{
  type Item = S::Item;
  type Err = OutErr;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, OutErr> + 'static,
  {
    let MapErr { source, func } = self;
    source.actual_subscribe(MapErrObserver { observer, func })
  }
}
