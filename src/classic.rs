//! Classic observer surface: `on_next`/`on_error`/`on_completed` consumers
//! cancelled through a disposable handle.
//!
//! Interop layer for codebases written against the older observer shape. A
//! [`ClassicObservable`] wraps the same subscriber function a modern
//! [`Observable`] does, so converting between the two shares the producer
//! outright instead of stacking adapters; only the consumer-facing surface
//! differs.

use std::rc::Rc;

use crate::{
  context::Context,
  observable::{IntoObservable, Observable},
  observer::{CallbackObserver, Observer},
  subscription::{Cleanup, SubscriberFn, Subscription, SubscriptionObserver},
  trap::CaughtPanic,
};

/// Consumer with the classic callback names. All methods default to no-ops,
/// mirroring a partial observer record.
pub trait ClassicObserver<Item, Err> {
  fn on_next(&mut self, _value: Item) {}

  fn on_error(&mut self, _err: Err) {}

  fn on_completed(&mut self) {}
}

impl<Item, Err, T> ClassicObserver<Item, Err> for Box<T>
where
  T: ClassicObserver<Item, Err> + ?Sized,
{
  #[inline]
  fn on_next(&mut self, value: Item) { (**self).on_next(value) }

  #[inline]
  fn on_error(&mut self, err: Err) { (**self).on_error(err) }

  #[inline]
  fn on_completed(&mut self) { (**self).on_completed() }
}

/// Classic observer assembled from individual closures.
pub struct ClassicCallbackObserver<Item, Err> {
  on_next: Option<Box<dyn FnMut(Item)>>,
  on_error: Option<Box<dyn FnOnce(Err)>>,
  on_completed: Option<Box<dyn FnOnce()>>,
}

impl<Item, Err> ClassicCallbackObserver<Item, Err> {
  pub fn new() -> Self {
    ClassicCallbackObserver { on_next: None, on_error: None, on_completed: None }
  }

  pub fn on_next(mut self, f: impl FnMut(Item) + 'static) -> Self {
    self.on_next = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnOnce(Err) + 'static) -> Self {
    self.on_error = Some(Box::new(f));
    self
  }

  pub fn on_completed(mut self, f: impl FnOnce() + 'static) -> Self {
    self.on_completed = Some(Box::new(f));
    self
  }
}

impl<Item, Err> Default for ClassicCallbackObserver<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> ClassicObserver<Item, Err> for ClassicCallbackObserver<Item, Err> {
  fn on_next(&mut self, value: Item) {
    if let Some(f) = self.on_next.as_mut() {
      f(value);
    }
  }

  fn on_error(&mut self, err: Err) {
    if let Some(f) = self.on_error.take() {
      f(err);
    }
  }

  fn on_completed(&mut self) {
    if let Some(f) = self.on_completed.take() {
      f();
    }
  }
}

/// Cancellation in the classic vocabulary.
pub trait Dispose {
  fn dispose(&mut self);

  fn is_disposed(&self) -> bool;
}

/// Classic cancellation handle over a modern [`Subscription`]: `dispose`
/// delegates to `unsubscribe`, `is_disposed` to `is_closed`.
pub struct Disposable<Item, Err>(Subscription<Item, Err>);

impl<Item, Err> Disposable<Item, Err> {
  pub fn dispose(&self) { self.0.unsubscribe() }

  pub fn is_disposed(&self) -> bool { self.0.is_closed() }
}

impl<Item, Err> Clone for Disposable<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Disposable(self.0.clone()) }
}

impl<Item, Err> Dispose for Disposable<Item, Err> {
  #[inline]
  fn dispose(&mut self) { Disposable::dispose(self) }

  #[inline]
  fn is_disposed(&self) -> bool { Disposable::is_disposed(self) }
}

/// Teardown returned by a classic subscriber function.
pub enum ClassicCleanup {
  None,
  Func(Box<dyn FnOnce()>),
  Disposable(Box<dyn Dispose>),
}

/// Producer-facing capability object in classic vocabulary, handed to
/// [`ClassicObservable::create`] subscriber functions.
pub struct ClassicSubscriptionObserver<Item, Err>(SubscriptionObserver<Item, Err>);

impl<Item, Err> ClassicSubscriptionObserver<Item, Err> {
  pub(crate) fn new(observer: SubscriptionObserver<Item, Err>) -> Self {
    ClassicSubscriptionObserver(observer)
  }

  pub fn on_next(&self, value: Item) { self.0.next(value) }

  pub fn on_error(&self, err: Err) { self.0.error(err) }

  pub fn on_completed(&self) { self.0.complete() }

  pub fn is_stopped(&self) -> bool { self.0.is_closed() }
}

impl<Item, Err> Clone for ClassicSubscriptionObserver<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { ClassicSubscriptionObserver(self.0.clone()) }
}

impl<Item, Err> ClassicObserver<Item, Err> for ClassicSubscriptionObserver<Item, Err> {
  fn on_next(&mut self, value: Item) { ClassicSubscriptionObserver::on_next(self, value) }

  fn on_error(&mut self, err: Err) { ClassicSubscriptionObserver::on_error(self, err) }

  fn on_completed(&mut self) { ClassicSubscriptionObserver::on_completed(self) }
}

/// Modern view over a classic observer record.
pub(crate) struct ModernFromClassic<O>(pub(crate) O);

impl<Item, Err, O> Observer<Item, Err> for ModernFromClassic<O>
where
  O: ClassicObserver<Item, Err>,
{
  fn next(&mut self, value: Item) { self.0.on_next(value) }

  fn error(&mut self, err: Err) { self.0.on_error(err) }

  fn complete(&mut self) { self.0.on_completed() }
}

/// Duck-typed fallback contract for foreign classic observables: anything
/// that accepts a classic observer and returns a disposable.
pub trait ClassicSource<Item, Err> {
  fn subscribe_classic(&self, observer: Box<dyn ClassicObserver<Item, Err>>) -> Box<dyn Dispose>;
}

/// An observable whose consumer surface speaks the classic vocabulary.
pub struct ClassicObservable<Item, Err> {
  subscriber: Rc<SubscriberFn<Item, Err>>,
  ctx: Context,
}

impl<Item, Err> Clone for ClassicObservable<Item, Err> {
  #[inline]
  fn clone(&self) -> Self {
    ClassicObservable { subscriber: self.subscriber.clone(), ctx: self.ctx.clone() }
  }
}

impl<Item: 'static, Err: 'static> ClassicObservable<Item, Err> {
  /// Wraps a modern-style subscriber function behind a classic surface.
  pub fn new(
    subscriber: impl Fn(SubscriptionObserver<Item, Err>) -> Cleanup + 'static,
  ) -> Self {
    Self::new_in(Context::default(), subscriber)
  }

  pub fn new_in(
    ctx: Context,
    subscriber: impl Fn(SubscriptionObserver<Item, Err>) -> Cleanup + 'static,
  ) -> Self {
    ClassicObservable { subscriber: Rc::new(subscriber), ctx }
  }

  pub(crate) fn from_parts(ctx: Context, subscriber: Rc<SubscriberFn<Item, Err>>) -> Self {
    ClassicObservable { subscriber, ctx }
  }

  /// Wraps a classic-style subscriber function: it receives an `on_*`-shaped
  /// emitter and may return its teardown as a [`ClassicCleanup`], whose
  /// `dispose` becomes the subscription's cleanup.
  pub fn create(
    subscriber: impl Fn(ClassicSubscriptionObserver<Item, Err>) -> ClassicCleanup + 'static,
  ) -> Self {
    Self::new(move |observer| {
      match subscriber(ClassicSubscriptionObserver::new(observer)) {
        ClassicCleanup::None => Cleanup::None,
        ClassicCleanup::Func(f) => Cleanup::Func(f),
        ClassicCleanup::Disposable(d) => {
          let mut d = d;
          Cleanup::from_fn(move || d.dispose())
        }
      }
    })
  }
}

impl<Item: 'static, Err: From<CaughtPanic> + 'static> ClassicObservable<Item, Err> {
  /// Subscribes with a bare `on_next` callback.
  pub fn subscribe(&self, on_next: impl FnMut(Item) + 'static) -> Disposable<Item, Err> {
    self.subscribe_modern(CallbackObserver::new().on_next(on_next))
  }

  /// Subscribes with `on_next`, `on_error` and `on_completed` callbacks.
  pub fn subscribe_all(
    &self,
    on_next: impl FnMut(Item) + 'static,
    on_error: impl FnOnce(Err) + 'static,
    on_completed: impl FnOnce() + 'static,
  ) -> Disposable<Item, Err> {
    self.subscribe_modern(
      CallbackObserver::new().on_next(on_next).on_error(on_error).on_complete(on_completed),
    )
  }

  /// Subscribes a classic observer record.
  pub fn subscribe_observer(
    &self,
    observer: impl ClassicObserver<Item, Err> + 'static,
  ) -> Disposable<Item, Err> {
    self.subscribe_modern(ModernFromClassic(observer))
  }

  fn subscribe_modern(&self, observer: impl Observer<Item, Err> + 'static) -> Disposable<Item, Err> {
    Disposable(Subscription::new(self.ctx.clone(), &self.subscriber, Box::new(observer)))
  }
}

/// The adaptation capability: a classic observable is adaptable to the
/// modern shape by sharing its subscriber function outright.
impl<Item: 'static, Err: 'static> IntoObservable<Item, Err> for ClassicObservable<Item, Err> {
  fn into_observable(self) -> Observable<Item, Err> {
    Observable::from_parts(self.ctx, self.subscriber)
  }
}

impl<Item: 'static, Err: From<CaughtPanic> + 'static> ClassicSource<Item, Err>
  for ClassicObservable<Item, Err>
{
  fn subscribe_classic(&self, observer: Box<dyn ClassicObserver<Item, Err>>) -> Box<dyn Dispose> {
    Box::new(self.subscribe_observer(observer))
  }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  /// The reverse adaptation: expose this observable behind the classic
  /// consumer surface, sharing the subscriber function.
  pub fn into_classic(self) -> ClassicObservable<Item, Err> {
    let (ctx, subscriber) = {
      let (ctx, subscriber) = self.parts();
      (ctx.clone(), subscriber.clone())
    };
    ClassicObservable::from_parts(ctx, subscriber)
  }
}

#[cfg(test)]
mod test {
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  use crate::prelude::*;

  fn one_two_three() -> ClassicObservable<i32, String> {
    ClassicObservable::new(|observer| {
      observer.next(1);
      observer.next(2);
      observer.next(3);
      observer.complete();
      Cleanup::None
    })
  }

  #[test]
  fn subscribe_with_callbacks() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(Cell::new(false));
    let (s, c) = (seen.clone(), completed.clone());

    let disposable = one_two_three().subscribe_all(
      move |v| s.borrow_mut().push(v),
      |_| panic!("no error expected"),
      move || c.set(true),
    );

    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    assert!(completed.get());
    assert!(disposable.is_disposed());
  }

  #[test]
  fn subscribe_with_partial_observer() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    one_two_three()
      .subscribe_observer(ClassicCallbackObserver::new().on_next(move |v| s.borrow_mut().push(v)));
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
  }

  #[test]
  fn empty_partial_observer_ignores_everything() {
    one_two_three().subscribe_observer(ClassicCallbackObserver::new());
  }

  #[test]
  fn create_translates_classic_teardown() {
    let disposed = Rc::new(Cell::new(false));
    let d = disposed.clone();
    let emitters: Rc<RefCell<Vec<ClassicSubscriptionObserver<i32, String>>>> =
      Rc::new(RefCell::new(Vec::new()));
    let e = emitters.clone();

    let inner: ClassicObservable<i32, String> = ClassicObservable::new(move |_observer| {
      let d = d.clone();
      Cleanup::from_fn(move || d.set(true))
    });
    let source: ClassicObservable<i32, String> = ClassicObservable::create(move |observer| {
      e.borrow_mut().push(observer.clone());
      ClassicCleanup::Disposable(Box::new(inner.subscribe(|_| {})))
    });

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let disposable = source.subscribe(move |v| s.borrow_mut().push(v));

    emitters.borrow()[0].on_next(7);
    assert_eq!(*seen.borrow(), vec![7]);
    assert!(!disposable.is_disposed());

    disposable.dispose();
    assert!(disposable.is_disposed());
    assert!(disposed.get(), "disposing the outer handle reaches the inner teardown");

    emitters.borrow()[0].on_next(8);
    assert_eq!(*seen.borrow(), vec![7], "closed subscription drops deliveries");
  }

  #[test]
  fn round_trip_preserves_emissions_and_cancellation() {
    let cleaned = Rc::new(Cell::new(false));
    let c = cleaned.clone();
    let classic: ClassicObservable<i32, String> = ClassicObservable::new(move |observer| {
      observer.next(10);
      observer.next(20);
      let c = c.clone();
      Cleanup::from_fn(move || c.set(true))
    });

    // classic -> modern -> classic: same producer all the way through.
    let modern = classic.into_observable();
    let round_tripped = modern.into_classic();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let disposable = round_tripped.subscribe(move |v| s.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec![10, 20]);

    disposable.dispose();
    assert!(cleaned.get());
    assert!(disposable.is_disposed());
  }
}
