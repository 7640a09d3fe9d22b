//! Observing a path of properties across changing intermediate objects.
//!
//! A chain `root → a → b → leaf` keeps exactly one change subscription per
//! hop, each bound to the object currently sitting at that hop. When an
//! intermediate property is replaced by a different object (compared with
//! [`Rc::ptr_eq`]) every subscription below it is torn down and rebuilt on
//! the new object, then the leaf is re-read and emitted.

use std::{
  any::Any,
  cell::{Cell, RefCell},
  convert::Infallible,
  marker::PhantomData,
  rc::{Rc, Weak},
};

use super::notify::NotifyPropertyChanged;
use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  ops::{map::Map, observe_on::ObserveOn},
  scheduler::{ImmediateScheduler, Scheduler},
  subscriber::{Publisher, Subscriber, SubscriberHandle},
  subscription::{BoxedSubscription, Subscription},
};

type Object = Rc<dyn Any>;
type WatchFn = Box<dyn Fn(&Object, Box<dyn FnMut(&str)>) -> Option<BoxedSubscription>>;
type ReadFn = Box<dyn Fn(&Object) -> Option<Object>>;
type LeafFn<V> = Box<dyn Fn(&Object) -> Option<V>>;

/// One emission of a property chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedChange<V> {
  /// Dotted path of the observed properties, e.g. `"address.city"`.
  pub path: Rc<str>,
  /// The leaf value, or `None` when an intermediate object is missing.
  pub value: Option<V>,
}

impl<V> ObservedChange<V> {
  pub fn into_value(self) -> Option<V> { self.value }
}

// ============================================================================
// Builder
// ============================================================================

/// One hop: the object at this level, the property read from it and how to
/// watch it for changes.
struct Level {
  property: String,
  watch: WatchFn,
  /// Reads the next object; `None` on the last level, where the leaf is read.
  read: Option<ReadFn>,
}

fn watch_fn<T: NotifyPropertyChanged + 'static>() -> WatchFn {
  Box::new(|object, callback| {
    object
      .downcast_ref::<T>()
      .map(|object| object.subscribe_property_changes(callback))
  })
}

/// Builds a [`PropertyChain`] one property at a time.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// #[derive(Default)]
/// struct Address {
///   city: RefCell<String>,
///   changed: PropertyChangedNotifier,
/// }
///
/// #[derive(Default)]
/// struct Person {
///   address: RefCell<Option<Rc<Address>>>,
///   changed: PropertyChangedNotifier,
/// }
///
/// impl NotifyPropertyChanged for Address {
///   fn subscribe_property_changes(&self, callback: PropertyChangedCallback) -> BoxedSubscription {
///     self.changed.subscribe_property_changes(callback)
///   }
/// }
///
/// impl NotifyPropertyChanged for Person {
///   fn subscribe_property_changes(&self, callback: PropertyChangedCallback) -> BoxedSubscription {
///     self.changed.subscribe_property_changes(callback)
///   }
/// }
///
/// let person = Rc::new(Person::default());
/// let cities = Rc::new(RefCell::new(vec![]));
/// let c_cities = cities.clone();
/// ChainBuilder::new(person.clone())
///   .then("address", |p: &Person| p.address.borrow().clone())
///   .value("city", |a: &Address| a.city.borrow().clone())
///   .values()
///   .subscribe(move |city| c_cities.borrow_mut().push(city));
///
/// let address = Rc::new(Address::default());
/// address.changed.set_if_changed(&address.city, "Oslo".to_owned(), "city");
/// person.changed.set(&person.address, Some(address.clone()), "address");
/// address.changed.set_if_changed(&address.city, "Bergen".to_owned(), "city");
///
/// assert_eq!(
///   *cities.borrow(),
///   vec![None, Some("Oslo".to_owned()), Some("Bergen".to_owned())]
/// );
/// ```
pub struct ChainBuilder<T> {
  root: Object,
  levels: Vec<Level>,
  path: Vec<String>,
  watch: WatchFn,
  _tail: PhantomData<fn(&T)>,
}

impl<T: NotifyPropertyChanged + 'static> ChainBuilder<T> {
  pub fn new(root: Rc<T>) -> Self {
    ChainBuilder {
      root,
      levels: vec![],
      path: vec![],
      watch: watch_fn::<T>(),
      _tail: PhantomData,
    }
  }

  /// Steps into the object held by property `name`.
  pub fn then<U, G>(mut self, name: &str, getter: G) -> ChainBuilder<U>
  where
    U: NotifyPropertyChanged + 'static,
    G: Fn(&T) -> Option<Rc<U>> + 'static,
  {
    let read: ReadFn = Box::new(move |object| {
      let next = getter(object.downcast_ref::<T>()?)?;
      Some(next as Object)
    });
    self.levels.push(Level { property: name.to_owned(), watch: self.watch, read: Some(read) });
    self.path.push(name.to_owned());
    ChainBuilder {
      root: self.root,
      levels: self.levels,
      path: self.path,
      watch: watch_fn::<U>(),
      _tail: PhantomData,
    }
  }

  /// Ends the chain at property `name`.
  pub fn value<V, G>(mut self, name: &str, getter: G) -> PropertyChain<V>
  where
    G: Fn(&T) -> V + 'static,
  {
    self.levels.push(Level { property: name.to_owned(), watch: self.watch, read: None });
    self.path.push(name.to_owned());
    let leaf: LeafFn<V> = Box::new(move |object| object.downcast_ref::<T>().map(&getter));
    PropertyChain {
      root: self.root,
      shape: Rc::new(Shape { levels: self.levels, leaf, path: Rc::from(self.path.join(".")) }),
      scheduler: ImmediateScheduler,
    }
  }
}

// ============================================================================
// PropertyChain
// ============================================================================

struct Shape<V> {
  levels: Vec<Level>,
  leaf: LeafFn<V>,
  path: Rc<str>,
}

/// An observable of [`ObservedChange`]s for one property path.
///
/// Subscribing emits the current leaf straight away, then again on every
/// relevant change along the path. The stream never fails or completes on
/// its own. Emissions are delivered through the chain's scheduler.
pub struct PropertyChain<V, S = ImmediateScheduler> {
  root: Object,
  shape: Rc<Shape<V>>,
  scheduler: S,
}

impl<V, S: Clone> Clone for PropertyChain<V, S> {
  fn clone(&self) -> Self {
    Self { root: self.root.clone(), shape: self.shape.clone(), scheduler: self.scheduler.clone() }
  }
}

/// A chain reduced to its leaf values.
pub type ChainValues<V, S> = Map<PropertyChain<V, S>, fn(ObservedChange<V>) -> Option<V>>;

impl<V, S> PropertyChain<V, S> {
  pub fn with_scheduler<S2: Scheduler>(self, scheduler: S2) -> PropertyChain<V, S2> {
    PropertyChain { root: self.root, shape: self.shape, scheduler }
  }

  /// Dotted path of the observed properties.
  pub fn path(&self) -> &str { &self.shape.path }
}

impl<V: 'static, S: Scheduler> PropertyChain<V, S> {
  /// Just the leaf values, `None` meaning unreachable.
  pub fn values(self) -> ChainValues<V, S> {
    self.map(ObservedChange::into_value as fn(ObservedChange<V>) -> Option<V>)
  }
}

impl<V: 'static, S: Scheduler> Observable for PropertyChain<V, S> {
  type Item = ObservedChange<V>;
  type Err = Infallible;
  type Unsub = (SubscriberHandle, ChainSubscription<V>);

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<ObservedChange<V>, Infallible> + 'static,
  {
    ObserveOn { source: ChainSource { root: self.root, shape: self.shape }, scheduler: self.scheduler }
      .actual_subscribe(observer)
  }
}

/// The chain without its scheduler.
struct ChainSource<V> {
  root: Object,
  shape: Rc<Shape<V>>,
}

impl<V: 'static> Observable for ChainSource<V> {
  type Item = ObservedChange<V>;
  type Err = Infallible;
  type Unsub = ChainSubscription<V>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<ObservedChange<V>, Infallible> + 'static,
  {
    let depth = self.shape.levels.len();
    let observer = Subscriber::new(observer);
    let state = Rc::new(ChainState {
      shape: self.shape,
      handle: observer.handle(),
      observer: Rc::new(observer),
      objects: RefCell::new(vec![None; depth]),
      watches: RefCell::new((0..depth).map(|_| None).collect()),
      closed: Cell::new(false),
    });
    state.rebuild_from(0, Some(self.root));
    state.emit();
    ChainSubscription(state)
  }
}

// ============================================================================
// Runtime state
// ============================================================================

struct ChainState<V> {
  shape: Rc<Shape<V>>,
  observer: Rc<dyn Publisher<ObservedChange<V>, Infallible>>,
  handle: SubscriberHandle,
  /// The object currently sitting at each level.
  objects: RefCell<Vec<Option<Object>>>,
  /// The change subscription on each level's object.
  watches: RefCell<Vec<Option<BoxedSubscription>>>,
  closed: Cell<bool>,
}

impl<V: 'static> ChainState<V> {
  /// Drops the watches from `from` down and re-creates them, starting with
  /// `object` at level `from`.
  fn rebuild_from(self: &Rc<Self>, from: usize, mut object: Option<Object>) {
    let stale: Vec<_> = self.watches.borrow_mut()[from..]
      .iter_mut()
      .filter_map(Option::take)
      .collect();
    stale.into_iter().for_each(Subscription::unsubscribe);

    for (index, level) in self.shape.levels.iter().enumerate().skip(from) {
      self.objects.borrow_mut()[index] = object.clone();
      let Some(current) = object.take() else {
        continue;
      };
      let watch = (level.watch)(&current, self.on_change(index));
      if let Some(watch) = watch {
        if self.closed.get() {
          watch.unsubscribe();
        } else {
          let replaced = self.watches.borrow_mut()[index].replace(watch);
          if let Some(replaced) = replaced {
            replaced.unsubscribe();
          }
        }
      }
      object = level.read.as_ref().and_then(|read| read(&current));
    }
  }

  fn on_change(self: &Rc<Self>, index: usize) -> Box<dyn FnMut(&str)> {
    let state: Weak<Self> = Rc::downgrade(self);
    Box::new(move |name| {
      if let Some(state) = state.upgrade() {
        state.property_changed(index, name);
      }
    })
  }

  fn property_changed(self: &Rc<Self>, index: usize, name: &str) {
    if self.closed.get() || self.shape.levels[index].property != name {
      return;
    }
    let level = &self.shape.levels[index];
    if let Some(read) = &level.read {
      let current = self.objects.borrow()[index].clone();
      let next = current.as_ref().and_then(read);
      let previous = self.objects.borrow()[index + 1].clone();
      let same = match (&next, &previous) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
      };
      if !same {
        tracing::trace!(path = %self.shape.path, level = index + 1, "property chain rebuilt");
        self.rebuild_from(index + 1, next);
      }
    }
    self.emit();
  }

  fn emit(&self) {
    if self.closed.get() {
      return;
    }
    let leaf = self.objects.borrow().last().cloned().flatten();
    let value = leaf.as_ref().and_then(|object| (self.shape.leaf)(object));
    let change = ObservedChange { path: self.shape.path.clone(), value };
    self.observer.publish(Notification::Next(change));
  }

  fn close(&self) {
    if self.closed.replace(true) {
      return;
    }
    self.handle.clone().unsubscribe();
    let watches: Vec<_> = self
      .watches
      .borrow_mut()
      .iter_mut()
      .filter_map(Option::take)
      .collect();
    watches.into_iter().for_each(Subscription::unsubscribe);
    self.objects.borrow_mut().iter_mut().for_each(|o| *o = None);
  }
}

/// Subscription of a property chain: releases every change subscription
/// along the path.
pub struct ChainSubscription<V>(Rc<ChainState<V>>);

impl<V: 'static> Subscription for ChainSubscription<V> {
  fn unsubscribe(self) { self.0.close() }

  fn is_closed(&self) -> bool { self.0.closed.get() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[derive(Default)]
  struct Leaf {
    text: RefCell<String>,
    changed: PropertyChangedNotifier,
  }

  #[derive(Default)]
  struct Root {
    child: RefCell<Option<Rc<Leaf>>>,
    changed: PropertyChangedNotifier,
  }

  impl NotifyPropertyChanged for Leaf {
    fn subscribe_property_changes(&self, callback: PropertyChangedCallback) -> BoxedSubscription {
      self.changed.subscribe_property_changes(callback)
    }
  }

  impl NotifyPropertyChanged for Root {
    fn subscribe_property_changes(&self, callback: PropertyChangedCallback) -> BoxedSubscription {
      self.changed.subscribe_property_changes(callback)
    }
  }

  fn leaf(text: &str) -> Rc<Leaf> {
    let leaf = Rc::new(Leaf::default());
    *leaf.text.borrow_mut() = text.to_owned();
    leaf
  }

  fn chain(root: &Rc<Root>) -> PropertyChain<String> {
    ChainBuilder::new(root.clone())
      .then("child", |r: &Root| r.child.borrow().clone())
      .value("text", |l: &Leaf| l.text.borrow().clone())
  }

  fn record(root: &Rc<Root>) -> (Rc<RefCell<Vec<Option<String>>>>, impl Subscription) {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let sub = chain(root)
      .values()
      .subscribe(move |v| c_seen.borrow_mut().push(v));
    (seen, sub)
  }

  #[rxlite_macro::test]
  fn emits_current_value_on_subscribe() {
    let root = Rc::new(Root::default());
    *root.child.borrow_mut() = Some(leaf("a"));
    let (seen, _sub) = record(&root);
    assert_eq!(*seen.borrow(), vec![Some("a".to_owned())]);
  }

  #[rxlite_macro::test]
  fn replacing_an_intermediate_moves_the_watch() {
    let root = Rc::new(Root::default());
    let first = leaf("a");
    *root.child.borrow_mut() = Some(first.clone());
    let (seen, _sub) = record(&root);
    assert_eq!(first.changed.listener_count(), 1);

    let second = leaf("b");
    root
      .changed
      .set(&root.child, Some(second.clone()), "child");
    assert_eq!(first.changed.listener_count(), 0);
    assert_eq!(second.changed.listener_count(), 1);

    first
      .changed
      .set_if_changed(&first.text, "stale".to_owned(), "text");
    second
      .changed
      .set_if_changed(&second.text, "c".to_owned(), "text");
    assert_eq!(
      *seen.borrow(),
      vec![Some("a".to_owned()), Some("b".to_owned()), Some("c".to_owned())]
    );
  }

  #[rxlite_macro::test]
  fn missing_intermediate_is_unreachable() {
    let root = Rc::new(Root::default());
    let (seen, _sub) = record(&root);
    root.changed.set(&root.child, Some(leaf("x")), "child");
    root.changed.set(&root.child, None, "child");
    assert_eq!(*seen.borrow(), vec![None, Some("x".to_owned()), None]);
  }

  #[rxlite_macro::test]
  fn other_property_names_are_ignored() {
    let root = Rc::new(Root::default());
    *root.child.borrow_mut() = Some(leaf("a"));
    let (seen, _sub) = record(&root);
    root.changed.raise("unrelated");
    assert_eq!(seen.borrow().len(), 1);
  }

  #[rxlite_macro::test]
  fn unsubscribe_releases_every_watch() {
    let root = Rc::new(Root::default());
    let child = leaf("a");
    *root.child.borrow_mut() = Some(child.clone());
    let (_, sub) = record(&root);
    assert_eq!(root.changed.listener_count(), 1);
    sub.unsubscribe();
    assert_eq!(root.changed.listener_count(), 0);
    assert_eq!(child.changed.listener_count(), 0);
  }

  #[rxlite_macro::test]
  fn path_and_scheduler() {
    let root = Rc::new(Root::default());
    let scheduler = TestScheduler::new();
    let observed = chain(&root).with_scheduler(scheduler.clone());
    assert_eq!(observed.path(), "child.text");

    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    observed.subscribe(move |c| c_seen.borrow_mut().push(c));
    assert!(seen.borrow().is_empty());
    scheduler.flush();
    assert_eq!(
      *seen.borrow(),
      vec![ObservedChange { path: Rc::from("child.text"), value: None }]
    );
  }
}
