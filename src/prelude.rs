//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Command engine
pub use crate::command::{Command, CommandBuilder, Execution, HotStream, StateStream};
// Errors
pub use crate::error::{Exception, FirstValueError, IntoFutureError};
pub use crate::notification::Notification;
// Core traits and factories
pub use crate::observable::{
  self, BoxedObservable, DynObservable, Observable, SubscribeHandle,
};
pub use crate::observer::{BoxedObserver, FnObserver, Observer};
// Operators
pub use crate::ops::into_future::{IntoFutureResult, ObservableFuture};
// Property chains
pub use crate::property::{
  when_any, when_any2, when_any_all, when_any_value, when_any_value2, ChainBuilder,
  NotifyPropertyChanged, ObservedChange, PropertyChain, PropertyChangedCallback,
  PropertyChangedNotifier,
};
// Schedulers
pub use crate::scheduler::{
  Duration, ImmediateScheduler, Recorded, Scheduler, TaskHandle, TaskState, TestObserver,
  TestScheduler,
};
// Subjects
pub use crate::subject::{BehaviorSubject, ReplaySubject, Subject, SubjectSubscription};
pub use crate::subscriber::{Publisher, Subscriber, SubscriberHandle};
// Subscriptions
pub use crate::subscription::{
  BoxedSubscription, ClosureSubscription, MultiSubscription, Subscription, SubscriptionGuard,
  SubscriptionWrapper,
};
