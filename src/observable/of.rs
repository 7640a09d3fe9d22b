use std::marker::PhantomData;

use crate::{observable::Observable, observer::Observer};

/// Creates an observable producing a single value.
///
/// Completes immediately after emitting the value given. Never emits an
/// error; the error type is left for the caller (or inference) to pick.
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use rxlite::prelude::*;
///
/// observable::of::<_, Infallible>(123).subscribe(|v| println!("{v}"));
/// ```
pub fn of<Item, Err>(v: Item) -> Of<Item, Err> { Of(v, PhantomData) }

#[derive(Clone)]
pub struct Of<Item, Err>(Item, PhantomData<Err>);

impl<Item: 'static, Err: 'static> Observable for Of<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    observer.next(self.0);
    observer.complete();
  }
}

/// Creates an observable that produces no values and completes immediately.
pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(PhantomData) }

pub struct Empty<Item, Err>(PhantomData<(Item, Err)>);

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { Empty(PhantomData) }
}

impl<Item: 'static, Err: 'static> Observable for Empty<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    observer.complete();
  }
}

/// Creates an observable that never emits anything and never terminates.
pub fn never<Item, Err>() -> Never<Item, Err> { Never(PhantomData) }

pub struct Never<Item, Err>(PhantomData<(Item, Err)>);

impl<Item, Err> Clone for Never<Item, Err> {
  fn clone(&self) -> Self { Never(PhantomData) }
}

impl<Item: 'static, Err: 'static> Observable for Never<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, _observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
  }
}

/// Creates an observable that emits no items and terminates with `err`.
pub fn throw_err<Item, Err>(err: Err) -> ThrowErr<Item, Err> { ThrowErr(err, PhantomData) }

#[derive(Clone)]
pub struct ThrowErr<Item, Err>(Err, PhantomData<Item>);

impl<Item: 'static, Err: 'static> Observable for ThrowErr<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    observer.error(self.0);
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn of_emits_once_then_completes() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    observable::of::<_, ()>(7).subscribe_all(
      move |v| l1.borrow_mut().push(format!("{v}")),
      |_| {},
      move || l2.borrow_mut().push("done".to_owned()),
    );
    assert_eq!(*log.borrow(), vec!["7", "done"]);
  }

  #[rxlite_macro::test]
  fn empty_and_never() {
    let completed = Rc::new(RefCell::new(0));
    let c = completed.clone();
    observable::empty::<i32, ()>().subscribe_all(|_| {}, |_| {}, move || *c.borrow_mut() += 1);
    let c = completed.clone();
    observable::never::<i32, ()>().subscribe_all(|_| {}, |_| {}, move || *c.borrow_mut() += 1);
    assert_eq!(*completed.borrow(), 1);
  }

  #[rxlite_macro::test]
  fn throw_err_delivers_error() {
    let err = Rc::new(RefCell::new(None));
    let c_err = err.clone();
    observable::throw_err::<i32, _>("boom")
      .subscribe_err(|_| {}, move |e| *c_err.borrow_mut() = Some(e));
    assert_eq!(*err.borrow(), Some("boom"));
  }

  #[rxlite_macro::test]
  fn throw_err_without_handler_is_swallowed() {
    observable::throw_err::<i32, _>("ignored").subscribe(|_| {});
  }
}
