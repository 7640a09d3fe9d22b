//! Hot multicast sources.
//!
//! [`Subject`] fans every push out to its current subscribers,
//! [`BehaviorSubject`] additionally remembers the last value and
//! [`ReplaySubject`] buffers values for late subscribers.
//!
//! Pushes walk a snapshot of the subscriber list taken at call time, and each
//! subscriber is a [`Subscriber`](crate::subscriber::Subscriber) cell, so
//! callbacks are free to subscribe, unsubscribe or push back into the same
//! subject.

mod behavior_subject;
mod replay_subject;
mod subject_core;
mod subject_subscription;
mod subscribers;

pub use behavior_subject::BehaviorSubject;
pub use replay_subject::ReplaySubject;
pub use subject_core::Subject;
pub use subject_subscription::SubjectSubscription;
