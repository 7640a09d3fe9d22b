use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use crate::{
  error::FirstValueError, observable::Observable, observer::Observer, subscription::Subscription,
};

struct FirstObserver<Item, Err> {
  slot: Rc<RefCell<Option<Result<Item, Err>>>>,
  completed: Rc<Cell<bool>>,
}

impl<Item, Err> Observer<Item, Err> for FirstObserver<Item, Err> {
  fn next(&mut self, value: Item) {
    let mut slot = self.slot.borrow_mut();
    if slot.is_none() {
      *slot = Some(Ok(value));
    }
  }

  fn error(self, err: Err) {
    let mut slot = self.slot.borrow_mut();
    if slot.is_none() {
      *slot = Some(Err(err));
    }
  }

  fn complete(self) { self.completed.set(true) }

  fn is_closed(&self) -> bool { self.slot.borrow().is_some() }
}

pub(crate) fn first_now<S: Observable>(
  source: S,
) -> Result<Result<S::Item, S::Err>, FirstValueError> {
  let slot = Rc::new(RefCell::new(None));
  let completed = Rc::new(Cell::new(false));
  source
    .subscribe_with(FirstObserver { slot: slot.clone(), completed: completed.clone() })
    .unsubscribe();
  let first = slot.borrow_mut().take();
  match first {
    Some(first) => Ok(first),
    None if completed.get() => Err(FirstValueError::Empty),
    None => Err(FirstValueError::NotReady),
  }
}

#[cfg(test)]
mod tests {
  use std::convert::Infallible;

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn samples_a_behavior_subject() {
    let cell = BehaviorSubject::<_, Infallible>::new(3);
    assert_eq!(cell.clone().first_now(), Ok(Ok(3)));
    cell.clone().next(4);
    assert_eq!(cell.clone().first_now(), Ok(Ok(4)));
    assert_eq!(cell.subscriber_count(), 0);
  }

  #[rxlite_macro::test]
  fn not_ready_and_empty() {
    let subject = Subject::<i32, ()>::new();
    assert_eq!(subject.clone().first_now(), Err(FirstValueError::NotReady));
    assert_eq!(observable::empty::<i32, ()>().first_now(), Err(FirstValueError::Empty));
  }

  #[rxlite_macro::test]
  fn captures_the_error() {
    assert_eq!(observable::throw_err::<i32, _>("boom").first_now(), Ok(Err("boom")));
  }
}
