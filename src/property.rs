//! Property-change observation ("WhenAny").
//!
//! Types announce changes through [`NotifyPropertyChanged`]. A
//! [`PropertyChain`] follows a path of properties from a root object and
//! emits the leaf whenever anything along the path changes, re-binding its
//! subscriptions when an intermediate object is swapped out. The `when_any*`
//! functions derive values from one or more chains, typically a `bool` fed to
//! a [`Command`](crate::command::Command) as its CanExecute source.

mod chain;
mod notify;
mod when_any;

pub use chain::{ChainBuilder, ChainSubscription, ChainValues, ObservedChange, PropertyChain};
pub use notify::{NotifyPropertyChanged, PropertyChangedCallback, PropertyChangedNotifier};
pub use when_any::*;
