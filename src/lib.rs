//! # rxlite: a push-based Observable stream primitive
//!
//! A producer emits a sequence of values, an error, or a completion signal
//! to a consumer registered via `subscribe`, with deterministic,
//! at-most-once termination and exactly-once resource cleanup.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxlite::prelude::*;
//!
//! observable::from_iter::<_, String>(0..10)
//!   .filter(|v, _| v % 2 == 0)
//!   .map(|v, _| v * 2)
//!   .subscribe(|v| println!("Value: {}", v));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Reusable descriptor of how to produce a stream |
//! | [`Observer`] | Consumes `next`, `error` and `complete` events |
//! | [`Subscription`] | Handle to cancel an active registration |
//! | [`SubscriptionObserver`] | Producer-facing capability for pushing events |
//! | [`Source`] | Tagged union of everything `observable::from` accepts |
//!
//! Delivery is synchronous on a single logical thread. Panics in consumer
//! callbacks are contained and reported after the current turn; panics in
//! producer-side functions (subscriber, projection, predicate, accumulator,
//! selector) become `error` notifications. Set `RXLITE_NO_TRAP=1` to let
//! panics unwind natively for debugging.
//!
//! The classic `on_next`/`on_error`/`on_completed` observer shape is
//! supported through [`ClassicObservable`], with cancellation via
//! [`Disposable`]; conversions in either direction share the underlying
//! producer.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`SubscriptionObserver`]: subscription::SubscriptionObserver
//! [`Source`]: observable::Source
//! [`ClassicObservable`]: classic::ClassicObservable
//! [`Disposable`]: classic::Disposable

pub mod classic;
pub mod context;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod promise;
pub mod rc;
pub mod subscription;
pub mod trap;

// Re-export the prelude module
pub use prelude::*;
