use std::{cell::RefCell, convert::Infallible, rc::Rc};

use crate::{
  observable::Observable,
  observer::Observer,
  subject::Subject,
  subscription::BoxedSubscription,
};

/// Callback handed to [`NotifyPropertyChanged::subscribe_property_changes`].
/// It receives the name of the property that changed.
pub type PropertyChangedCallback = Box<dyn FnMut(&str)>;

/// A type that announces changes to its properties by name.
///
/// Property names are plain strings; a chain step only reacts to the name it
/// was declared with.
pub trait NotifyPropertyChanged {
  fn subscribe_property_changes(&self, callback: PropertyChangedCallback) -> BoxedSubscription;
}

/// Ready-made change notification, meant to be embedded in a view model.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// #[derive(Default)]
/// struct Person {
///   name: RefCell<String>,
///   changed: PropertyChangedNotifier,
/// }
///
/// impl NotifyPropertyChanged for Person {
///   fn subscribe_property_changes(&self, callback: PropertyChangedCallback) -> BoxedSubscription {
///     self.changed.subscribe_property_changes(callback)
///   }
/// }
///
/// let person = Person::default();
/// let names = Rc::new(RefCell::new(vec![]));
/// let c_names = names.clone();
/// let _sub = person
///   .subscribe_property_changes(Box::new(move |name| c_names.borrow_mut().push(name.to_owned())));
///
/// assert!(person.changed.set_if_changed(&person.name, "Ada".to_owned(), "name"));
/// assert!(!person.changed.set_if_changed(&person.name, "Ada".to_owned(), "name"));
/// assert_eq!(*names.borrow(), vec!["name"]);
/// ```
#[derive(Clone, Default)]
pub struct PropertyChangedNotifier {
  changes: Subject<Rc<str>, Infallible>,
}

impl PropertyChangedNotifier {
  pub fn new() -> Self { Self::default() }

  /// Announces that `name` changed.
  pub fn raise(&self, name: &str) {
    tracing::trace!(property = name, "property changed");
    self.changes.clone().next(Rc::from(name));
  }

  /// Stores `value` in `field` and raises `name`, unless the field already
  /// holds an equal value. Returns whether anything changed.
  pub fn set_if_changed<T: PartialEq>(&self, field: &RefCell<T>, value: T, name: &str) -> bool {
    if *field.borrow() == value {
      return false;
    }
    let previous = field.replace(value);
    drop(previous);
    self.raise(name);
    true
  }

  /// Stores `value` in `field` and raises `name` unconditionally, for values
  /// that cannot be compared.
  pub fn set<T>(&self, field: &RefCell<T>, value: T, name: &str) {
    let previous = field.replace(value);
    drop(previous);
    self.raise(name);
  }

  /// Number of current listeners.
  pub fn listener_count(&self) -> usize { self.changes.subscriber_count() }
}

impl NotifyPropertyChanged for PropertyChangedNotifier {
  fn subscribe_property_changes(&self, mut callback: PropertyChangedCallback) -> BoxedSubscription {
    let subscription = self
      .changes
      .clone()
      .subscribe(move |name: Rc<str>| callback(&name));
    BoxedSubscription::new(subscription)
  }
}
