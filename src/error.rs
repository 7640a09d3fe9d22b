//! Error types.
//!
//! Streams stay generic over their error type. The command engine and its
//! result streams use [`Exception`]; the synchronous extraction helpers
//! report their own failures with small `thiserror` enums.

use std::{
  fmt::{Debug, Display, Formatter},
  rc::Rc,
};

use thiserror::Error;

/// A cheaply clonable error with identity.
///
/// Every clone points at the same underlying [`anyhow::Error`], so the
/// instance an action failed with can be recognised wherever it surfaces
/// (see [`ptr_eq`](Exception::ptr_eq)): on `thrown_exceptions`, on the
/// `execute` stream, or out of an awaited future.
///
/// Any `std::error::Error + Send + Sync + 'static` converts into an
/// `Exception` with `?` or `.into()`, `Infallible` included.
#[derive(Clone)]
pub struct Exception(Rc<anyhow::Error>);

impl Exception {
  pub fn new<E>(error: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Exception(Rc::new(anyhow::Error::new(error)))
  }

  /// An exception carrying just a message.
  pub fn msg<M>(message: M) -> Self
  where
    M: Display + Debug + Send + Sync + 'static,
  {
    Exception(Rc::new(anyhow::Error::msg(message)))
  }

  pub fn from_anyhow(error: anyhow::Error) -> Self { Exception(Rc::new(error)) }

  /// The top-level message, unmodified.
  pub fn message(&self) -> String { self.0.to_string() }

  /// Whether both handles refer to the same error instance.
  pub fn ptr_eq(&self, other: &Exception) -> bool { Rc::ptr_eq(&self.0, &other.0) }

  pub fn downcast_ref<E>(&self) -> Option<&E>
  where
    E: Display + Debug + Send + Sync + 'static,
  {
    self.0.downcast_ref::<E>()
  }

  pub fn as_anyhow(&self) -> &anyhow::Error { &self.0 }
}

impl<E> From<E> for Exception
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn from(error: E) -> Self { Exception::new(error) }
}

/// Identity comparison, same as [`ptr_eq`](Exception::ptr_eq).
impl PartialEq for Exception {
  fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl Display for Exception {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Display::fmt(&*self.0, f) }
}

impl Debug for Exception {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(&*self.0, f) }
}

/// Why [`first_now`](crate::observable::Observable::first_now) produced no
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FirstValueError {
  /// The source did not emit synchronously during the call.
  #[error("the observable has not emitted a value yet")]
  NotReady,
  /// The source completed without emitting.
  #[error("the observable completed without a value")]
  Empty,
}

/// Errors that can prevent an observable future from resolving to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntoFutureError {
  /// The observable had no values.
  #[error("the observable has no values")]
  Empty,
  /// The observable emitted more than one value.
  #[error("the observable emitted more than one value")]
  MultipleValues,
}
