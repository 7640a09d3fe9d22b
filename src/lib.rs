//! # rxlite: a small reactive runtime
//!
//! A push-based observable engine plus two primitives built on it: the gated,
//! single-flight [`Command`] and property-chain observation
//! ([`PropertyChain`] and the `when_any*` functions).
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxlite::prelude::*;
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let c_seen = seen.clone();
//! let command = Command::create(|v: i32| Ok(v * 10));
//! command
//!   .results()
//!   .filter(|v| *v > 10)
//!   .subscribe(move |v| c_seen.borrow_mut().push(v));
//!
//! command.execute(1);
//! command.execute(2);
//! assert_eq!(*seen.borrow(), vec![20]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | The core trait; every operator is a provided method |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to stop an active subscription |
//! | [`Subject`] / [`BehaviorSubject`] / [`ReplaySubject`] | Hot multicast sources |
//! | [`Scheduler`] | Runs work now or later; [`TestScheduler`] for virtual time |
//!
//! Everything is single-threaded (`Rc`/`RefCell`). Callbacks may subscribe,
//! unsubscribe or push re-entrantly: every subscriber queues notifications
//! that arrive while it is busy and delivers them in push order.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription

pub mod command;
pub mod error;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod property;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;
