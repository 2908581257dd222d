//! Observable: a reusable description of how to produce a stream of values.
//!
//! An observable owns exactly one subscriber function. Subscribing invokes it
//! with a fresh [`SubscriptionObserver`]; the producer then pushes any number
//! of `next` notifications and at most one terminal `error`/`complete`,
//! synchronously or later. Each subscribe call is an independent invocation;
//! observables are immutable after construction and cheap to clone.

use std::rc::Rc;

use crate::{
  context::Context,
  observer::{CallbackObserver, Observer},
  subscription::{Cleanup, SubscriberFn, Subscription, SubscriptionObserver},
  trap::CaughtPanic,
};

mod defer;
mod from;
mod from_iter;
mod of;
mod trivial;

pub use defer::*;
pub use from::*;
pub use from_iter::*;
pub use of::*;
pub use trivial::*;

pub struct Observable<Item, Err> {
  subscriber: Rc<SubscriberFn<Item, Err>>,
  ctx: Context,
}

impl<Item, Err> Clone for Observable<Item, Err> {
  #[inline]
  fn clone(&self) -> Self {
    Observable { subscriber: self.subscriber.clone(), ctx: self.ctx.clone() }
  }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  /// Wraps a subscriber function under the default [`Context`].
  ///
  /// The subscriber is handed a [`SubscriptionObserver`] to push
  /// notifications through and returns its teardown as a [`Cleanup`].
  ///
  /// ```
  /// use rxlite::prelude::*;
  ///
  /// let numbers: Observable<i32, String> = Observable::new(|observer| {
  ///   observer.next(1);
  ///   observer.next(2);
  ///   observer.complete();
  ///   Cleanup::None
  /// });
  /// numbers.subscribe(|v| println!("{v}"));
  /// ```
  pub fn new(subscriber: impl Fn(SubscriptionObserver<Item, Err>) -> Cleanup + 'static) -> Self {
    Self::new_in(Context::default(), subscriber)
  }

  /// Wraps a subscriber function under an explicit containment context.
  pub fn new_in(
    ctx: Context,
    subscriber: impl Fn(SubscriptionObserver<Item, Err>) -> Cleanup + 'static,
  ) -> Self {
    Observable { subscriber: Rc::new(subscriber), ctx }
  }

  pub(crate) fn from_parts(ctx: Context, subscriber: Rc<SubscriberFn<Item, Err>>) -> Self {
    Observable { subscriber, ctx }
  }

  pub(crate) fn parts(&self) -> (&Context, &Rc<SubscriberFn<Item, Err>>) {
    (&self.ctx, &self.subscriber)
  }

  pub fn context(&self) -> &Context { &self.ctx }

  /// Applies one operator function, enabling left-to-right composition of
  /// free-standing operators: `source.pipe(a).pipe(b)`. With nothing to
  /// apply, the source itself already is the composition of zero operators.
  pub fn pipe<R>(self, op: impl FnOnce(Self) -> R) -> R { op(self) }
}

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Subscribes with a bare `next` callback.
  pub fn subscribe(&self, next: impl FnMut(Item) + 'static) -> Subscription<Item, Err> {
    self.subscribe_observer(CallbackObserver::new().on_next(next))
  }

  /// Subscribes with `next` and `error` callbacks.
  pub fn subscribe_err(
    &self,
    next: impl FnMut(Item) + 'static,
    error: impl FnOnce(Err) + 'static,
  ) -> Subscription<Item, Err> {
    self.subscribe_observer(CallbackObserver::new().on_next(next).on_error(error))
  }

  /// Subscribes with `next` and `complete` callbacks.
  pub fn subscribe_complete(
    &self,
    next: impl FnMut(Item) + 'static,
    complete: impl FnOnce() + 'static,
  ) -> Subscription<Item, Err> {
    self.subscribe_observer(CallbackObserver::new().on_next(next).on_complete(complete))
  }

  /// Subscribes with `next`, `error` and `complete` callbacks.
  pub fn subscribe_all(
    &self,
    next: impl FnMut(Item) + 'static,
    error: impl FnOnce(Err) + 'static,
    complete: impl FnOnce() + 'static,
  ) -> Subscription<Item, Err> {
    self.subscribe_observer(
      CallbackObserver::new().on_next(next).on_error(error).on_complete(complete),
    )
  }

  /// Subscribes a full observer record.
  pub fn subscribe_observer(
    &self,
    observer: impl Observer<Item, Err> + 'static,
  ) -> Subscription<Item, Err> {
    Subscription::new(self.ctx.clone(), &self.subscriber, Box::new(observer))
  }
}
