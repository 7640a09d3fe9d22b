//! Operators, one per file. They are reached through the provided methods of
//! [`Observable`](crate::observable::Observable).

pub mod catch_error;
pub mod combine_latest;
pub mod distinct_until_changed;
pub mod filter;
pub mod first;
pub mod into_future;
pub mod map;
pub mod map_err;
pub mod merge;
pub mod observe_on;
