//! Observer: the consumer side of a stream.
//!
//! An observer is a record of optional callbacks. The trait ships no-op
//! defaults for every method, so implementors override only what they care
//! about, the same shape as a partial observer record.

use crate::subscription::Subscription;

/// Consumer of `next`, `error` and `complete` notifications.
///
/// `start` fires during subscribe, before any value is produced, handing the
/// consumer its [`Subscription`] so it can cancel immediately, even from
/// within `start` itself.
///
/// Terminal notifications (`error`, `complete`) are delivered at most once;
/// the owning subscription enforces this, so implementations need no
/// double-delivery guards of their own.
pub trait Observer<Item, Err> {
  fn start(&mut self, _subscription: &Subscription<Item, Err>) {}

  fn next(&mut self, _value: Item) {}

  fn error(&mut self, _err: Err) {}

  fn complete(&mut self) {}
}

/// Boxed observer handed to a subscription.
pub type BoxedObserver<Item, Err> = Box<dyn Observer<Item, Err>>;

impl<Item, Err, T> Observer<Item, Err> for Box<T>
where
  T: Observer<Item, Err> + ?Sized,
{
  #[inline]
  fn start(&mut self, subscription: &Subscription<Item, Err>) { (**self).start(subscription) }

  #[inline]
  fn next(&mut self, value: Item) { (**self).next(value) }

  #[inline]
  fn error(&mut self, err: Err) { (**self).error(err) }

  #[inline]
  fn complete(&mut self) { (**self).complete() }
}

/// Observer assembled from individual closures.
///
/// ```
/// use rxlite::prelude::*;
///
/// let observer = CallbackObserver::new()
///   .on_next(|v: i32| println!("{v}"))
///   .on_complete(|| println!("done"));
/// observable::of::<_, String>(1).subscribe_observer(observer);
/// ```
pub struct CallbackObserver<Item, Err> {
  start: Option<Box<dyn FnOnce(&Subscription<Item, Err>)>>,
  next: Option<Box<dyn FnMut(Item)>>,
  error: Option<Box<dyn FnOnce(Err)>>,
  complete: Option<Box<dyn FnOnce()>>,
}

impl<Item, Err> CallbackObserver<Item, Err> {
  pub fn new() -> Self {
    CallbackObserver { start: None, next: None, error: None, complete: None }
  }

  pub fn on_start(mut self, f: impl FnOnce(&Subscription<Item, Err>) + 'static) -> Self {
    self.start = Some(Box::new(f));
    self
  }

  pub fn on_next(mut self, f: impl FnMut(Item) + 'static) -> Self {
    self.next = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnOnce(Err) + 'static) -> Self {
    self.error = Some(Box::new(f));
    self
  }

  pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
    self.complete = Some(Box::new(f));
    self
  }
}

impl<Item, Err> Default for CallbackObserver<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Observer<Item, Err> for CallbackObserver<Item, Err> {
  fn start(&mut self, subscription: &Subscription<Item, Err>) {
    if let Some(f) = self.start.take() {
      f(subscription);
    }
  }

  fn next(&mut self, value: Item) {
    if let Some(f) = self.next.as_mut() {
      f(value);
    }
  }

  fn error(&mut self, err: Err) {
    if let Some(f) = self.error.take() {
      f(err);
    }
  }

  fn complete(&mut self) {
    if let Some(f) = self.complete.take() {
      f();
    }
  }
}
