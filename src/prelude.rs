//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Classic interop surface
pub use crate::classic::{
  ClassicCallbackObserver, ClassicCleanup, ClassicObservable, ClassicObserver, ClassicSource,
  ClassicSubscriptionObserver, Disposable, Dispose,
};
// Containment configuration
pub use crate::context::Context;
// Creation/Factories (as a module: `observable::of(..)`)
pub use crate::observable;
// Core observable type and source adaptation
pub use crate::observable::{IntoObservable, Observable, Source};
// Observer trait and callback record
pub use crate::observer::{CallbackObserver, Observer};
// Reified notifications
pub use crate::ops::materialize::Notification;
// Promise-like sources
pub use crate::promise::{Deferred, Thenable};
// Subscription machinery
pub use crate::subscription::{
  Cleanup, Subscription, SubscriptionGuard, SubscriptionLike, SubscriptionObserver,
};
// Panic containment
pub use crate::trap::{CaughtPanic, TrapMode};
