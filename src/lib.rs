//! # rxkit: reactive streams for Rust
//!
//! Observables describe sequences of values over time, observers consume
//! them and subscriptions cancel them. Subjects and relays bridge imperative
//! code into streams, and every timed operator runs on an injected
//! [`Executor`](executor::Executor).
//!
//! ```rust
//! use rxkit::prelude::*;
//!
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(|v| println!("value: {}", v));
//! ```
//!
//! ## Feature flags
//!
//! - **`futures-scheduler`** (default): [`ThreadPoolExecutor`](executor::ThreadPoolExecutor)
//!   on top of the `futures` thread pool.
//! - **`timer`** (default): delayed tasks for the thread pool executor.
//! - **`tokio-scheduler`**: [`TokioExecutor`](executor::TokioExecutor).
#[cfg(test)]
#[macro_use]
extern crate bencher;

pub mod error;
pub mod executor;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod subject;
pub mod subscription;
pub mod type_hint;

pub use prelude::*;
