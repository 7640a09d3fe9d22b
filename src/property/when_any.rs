//! Derived values over one or more property chains.

use super::chain::{ChainValues, ObservedChange, PropertyChain};
use crate::{
  observable::{combine_latest_all, CombineLatestAll, Observable},
  ops::{combine_latest::CombineLatest, map::Map},
  scheduler::Scheduler,
};

/// Projects every change of `chain` through `f`.
pub fn when_any<V, S, F, Out>(chain: PropertyChain<V, S>, f: F) -> Map<PropertyChain<V, S>, F>
where
  V: 'static,
  S: Scheduler,
  F: FnMut(ObservedChange<V>) -> Out + 'static,
{
  chain.map(f)
}

/// Projects every leaf value of `chain` through `f`.
pub fn when_any_value<V, S, F, Out>(chain: PropertyChain<V, S>, f: F) -> Map<ChainValues<V, S>, F>
where
  V: 'static,
  S: Scheduler,
  F: FnMut(Option<V>) -> Out + 'static,
{
  chain.values().map(f)
}

/// Combines the latest changes of two chains.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// #[derive(Default)]
/// struct Form {
///   first: RefCell<String>,
///   second: RefCell<String>,
///   changed: PropertyChangedNotifier,
/// }
///
/// impl NotifyPropertyChanged for Form {
///   fn subscribe_property_changes(&self, callback: PropertyChangedCallback) -> BoxedSubscription {
///     self.changed.subscribe_property_changes(callback)
///   }
/// }
///
/// let form = Rc::new(Form::default());
/// let filled = when_any2(
///   ChainBuilder::new(form.clone()).value("first", |f: &Form| f.first.borrow().clone()),
///   ChainBuilder::new(form.clone()).value("second", |f: &Form| f.second.borrow().clone()),
///   |a, b| a.value.is_some_and(|v| !v.is_empty()) && b.value.is_some_and(|v| !v.is_empty()),
/// );
/// let command = CommandBuilder::new(|_: ()| Ok(())).can_execute(filled).build();
/// assert_eq!(command.can_execute().first_now(), Ok(Ok(false)));
///
/// form.changed.set_if_changed(&form.first, "a".to_owned(), "first");
/// form.changed.set_if_changed(&form.second, "b".to_owned(), "second");
/// assert_eq!(command.can_execute().first_now(), Ok(Ok(true)));
/// ```
pub fn when_any2<A, B, S, F, Out>(
  a: PropertyChain<A, S>, b: PropertyChain<B, S>, f: F,
) -> CombineLatest<PropertyChain<A, S>, PropertyChain<B, S>, F>
where
  A: Clone + 'static,
  B: Clone + 'static,
  S: Scheduler,
  F: FnMut(ObservedChange<A>, ObservedChange<B>) -> Out + 'static,
{
  a.combine_latest(b, f)
}

/// Combines the latest leaf values of two chains.
pub fn when_any_value2<A, B, S, F, Out>(
  a: PropertyChain<A, S>, b: PropertyChain<B, S>, f: F,
) -> CombineLatest<ChainValues<A, S>, ChainValues<B, S>, F>
where
  A: Clone + 'static,
  B: Clone + 'static,
  S: Scheduler,
  F: FnMut(Option<A>, Option<B>) -> Out + 'static,
{
  a.values().combine_latest(b.values(), f)
}

/// Combines the latest changes of any number of chains over the same value
/// type.
pub fn when_any_all<V, S, F, Out>(
  chains: Vec<PropertyChain<V, S>>, f: F,
) -> CombineLatestAll<PropertyChain<V, S>, F>
where
  V: Clone + 'static,
  S: Scheduler,
  F: FnMut(&[ObservedChange<V>]) -> Out + 'static,
{
  combine_latest_all(chains, f)
}
