//! DistinctUntilChanged operator.
//!
//! Command gates and property chains pass through this so subscribers see a
//! boolean or a leaf value only when it actually changes.

use crate::{observable::Observable, observer::Observer};

/// Emits items only if they are different from the previous item.
#[derive(Clone)]
pub struct DistinctUntilChanged<S>(pub S);

impl<S> Observable for DistinctUntilChanged<S>
where
  S: Observable,
  S::Item: PartialEq + Clone,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    self
      .0
      .actual_subscribe(DistinctUntilChangedObserver::new(observer))
  }
}

/// DistinctUntilChangedObserver wrapper for filtering consecutive duplicates
pub struct DistinctUntilChangedObserver<O, Item> {
  observer: O,
  last: Option<Item>,
}

impl<O, Item> DistinctUntilChangedObserver<O, Item> {
  pub fn new(observer: O) -> Self { Self { observer, last: None } }
}

impl<O, Item, Err> Observer<Item, Err> for DistinctUntilChangedObserver<O, Item>
where
  O: Observer<Item, Err>,
  Item: PartialEq + Clone,
{
  fn next(&mut self, value: Item) {
    if self.last.as_ref() != Some(&value) {
      self.last = Some(value.clone());
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.observer.error(err); }

  fn complete(self) { self.observer.complete(); }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn smoke() {
    let x = Rc::new(RefCell::new(vec![]));
    let x_c = x.clone();
    observable::from_iter::<_, ()>(vec![1, 1, 2, 2, 3, 1])
      .distinct_until_changed()
      .subscribe(move |v| x_c.borrow_mut().push(v));
    assert_eq!(*x.borrow(), vec![1, 2, 3, 1]);
  }

  #[rxlite_macro::test]
  fn options_and_strings() {
    let x = Rc::new(RefCell::new(vec![]));
    let x_c = x.clone();
    observable::from_iter::<_, ()>(vec![None, None, Some("a".to_owned()), Some("a".to_owned())])
      .distinct_until_changed()
      .subscribe(move |v| x_c.borrow_mut().push(v));
    assert_eq!(*x.borrow(), vec![None, Some("a".to_owned())]);
  }
}
