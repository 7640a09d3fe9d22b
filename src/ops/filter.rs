use crate::{observable::Observable, observer::Observer};

/// Emits only those items from an observable that pass a predicate test.
///
/// # Example
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let coll = Rc::new(RefCell::new(vec![]));
/// let c_coll = coll.clone();
///
/// observable::from_iter::<_, ()>(0..10)
///   .filter(|v| *v % 2 == 0)
///   .subscribe(move |v| c_coll.borrow_mut().push(v));
///
/// // only even numbers received.
/// assert_eq!(*coll.borrow(), vec![0, 2, 4, 6, 8]);
/// ```
#[derive(Clone)]
pub struct Filter<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

pub struct FilterObserver<O, F> {
  observer: O,
  predicate: F,
}

impl<S, F> Observable for Filter<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) -> bool + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    self
      .source
      .actual_subscribe(FilterObserver { observer, predicate: self.predicate })
  }
}

impl<O, F, Item, Err> Observer<Item, Err> for FilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.predicate)(&value) {
      self.observer.next(value)
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// `filter` with a fallible predicate; an `Err` terminates the stream.
#[derive(Clone)]
pub struct TryFilter<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

pub struct TryFilterObserver<O, F> {
  observer: Option<O>,
  predicate: F,
}

impl<S, F> Observable for TryFilter<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) -> Result<bool, S::Err> + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    self.source.actual_subscribe(TryFilterObserver {
      observer: Some(observer),
      predicate: self.predicate,
    })
  }
}

impl<O, F, Item, Err> Observer<Item, Err> for TryFilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> Result<bool, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_closed() {
      return;
    }
    match (self.predicate)(&value) {
      Ok(true) => self.observer.next(value),
      Ok(false) => {}
      Err(err) => self.observer.take().error(err),
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn filter_keeps_completion() {
    let completed = Rc::new(RefCell::new(false));
    let c_completed = completed.clone();
    observable::from_iter::<_, ()>(0..5)
      .filter(|v| *v > 10)
      .subscribe_all(|_| panic!("nothing passes"), |_| {}, move || *c_completed.borrow_mut() = true);
    assert!(*completed.borrow());
  }

  #[rxlite_macro::test]
  fn try_filter_error_stops_the_stream() {
    let seen = Rc::new(RefCell::new(vec![]));
    let err = Rc::new(RefCell::new(None));
    let (c_seen, c_err) = (seen.clone(), err.clone());
    observable::from_iter(vec![1, 2, -1, 4])
      .try_filter(|v| if *v < 0 { Err("negative") } else { Ok(v % 2 == 0) })
      .subscribe_err(move |v| c_seen.borrow_mut().push(v), move |e| *c_err.borrow_mut() = Some(e));
    assert_eq!(*seen.borrow(), vec![2]);
    assert_eq!(*err.borrow(), Some("negative"));
  }
}
