//! Subscription: the live registration of one observer against one
//! observable invocation.
//!
//! The state machine has two consumer-visible states, open and closed, and
//! the transition is one-way. Closing happens exactly once, no matter whether
//! the producer terminated the stream (`error`/`complete`) or the consumer
//! cancelled it (`unsubscribe`), and the producer-supplied cleanup resource
//! runs exactly once on that transition.
//!
//! Re-entrancy discipline: no `RefCell` borrow is held while user code runs.
//! The observer is checked out of its slot for the duration of a `next`
//! delivery, and terminal transitions take the cleanup out of its slot before
//! invoking it, so re-entrant calls from inside any callback observe a
//! coherent state and double-runs are impossible.

use std::{
  fmt::{Debug, Formatter},
  mem,
  rc::Rc,
};

use crate::{
  context::{Context, Turn},
  observer::{BoxedObserver, Observer},
  rc::{MutRc, RcDeref, RcDerefMut},
  trap::CaughtPanic,
};

/// Anything that can be cancelled and queried for liveness.
pub trait SubscriptionLike {
  /// Deregisters the stream before it has delivered all of its events.
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;
}

impl<T: SubscriptionLike + ?Sized> SubscriptionLike for Box<T> {
  #[inline]
  fn unsubscribe(&mut self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

impl Debug for Box<dyn SubscriptionLike> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Box<dyn SubscriptionLike>")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// The resource a subscriber function hands back for teardown.
///
/// Invalid shapes are unrepresentable: the only inhabitants are "nothing", a
/// one-shot procedure, and a cancellation handle. The handle variant is
/// validated by construction, so a malformed teardown object cannot reach
/// invocation time.
pub enum Cleanup {
  None,
  Func(Box<dyn FnOnce()>),
  Handle(Box<dyn SubscriptionLike>),
}

impl Cleanup {
  pub fn from_fn(f: impl FnOnce() + 'static) -> Self { Cleanup::Func(Box::new(f)) }

  pub fn handle(s: impl SubscriptionLike + 'static) -> Self { Cleanup::Handle(Box::new(s)) }

  pub(crate) fn run(self) {
    match self {
      Cleanup::None => {}
      Cleanup::Func(f) => f(),
      Cleanup::Handle(mut s) => s.unsubscribe(),
    }
  }
}

impl Default for Cleanup {
  fn default() -> Self { Cleanup::None }
}

impl<Item: 'static, Err: 'static> From<Subscription<Item, Err>> for Cleanup {
  fn from(s: Subscription<Item, Err>) -> Self { Cleanup::Handle(Box::new(s)) }
}

/// Subscriber function: the producer. Invoked once per subscribe with the
/// capability object for pushing notifications; returns the teardown.
pub(crate) type SubscriberFn<Item, Err> = dyn Fn(SubscriptionObserver<Item, Err>) -> Cleanup;

/// Observer slot doubling as the lifecycle state.
///
/// `Loaned` marks an open subscription whose observer is checked out for an
/// in-flight `next` delivery; consumer-visible `closed` is `Closed` only.
enum ObserverSlot<Item, Err> {
  Open(BoxedObserver<Item, Err>),
  Loaned,
  Closed,
}

struct SubState<Item, Err> {
  slot: ObserverSlot<Item, Err>,
  cleanup: Cleanup,
  ctx: Context,
}

type StateHandle<Item, Err> = MutRc<SubState<Item, Err>>;

fn state_ctx<Item, Err>(state: &StateHandle<Item, Err>) -> Context {
  state.rc_deref().ctx.clone()
}

fn checkout<Item, Err>(state: &StateHandle<Item, Err>) -> Option<BoxedObserver<Item, Err>> {
  let mut s = state.rc_deref_mut();
  match mem::replace(&mut s.slot, ObserverSlot::Loaned) {
    ObserverSlot::Open(observer) => Some(observer),
    other => {
      s.slot = other;
      None
    }
  }
}

fn restore<Item, Err>(state: &StateHandle<Item, Err>, observer: BoxedObserver<Item, Err>) {
  let mut s = state.rc_deref_mut();
  if matches!(s.slot, ObserverSlot::Loaned) {
    s.slot = ObserverSlot::Open(observer);
  }
  // Closed while loaned: dropping the observer here ends its life; the
  // subscription already ran its cleanup.
}

/// Closes the subscription and runs the cleanup once. No-op when closed.
fn close_and_cleanup<Item, Err>(state: &StateHandle<Item, Err>) {
  let ctx = state_ctx(state);
  let _turn = Turn::enter();
  let (retired, cleanup) = {
    let mut s = state.rc_deref_mut();
    if matches!(s.slot, ObserverSlot::Closed) {
      return;
    }
    let retired = mem::replace(&mut s.slot, ObserverSlot::Closed);
    (retired, mem::take(&mut s.cleanup))
  };
  // The retired observer may own user values; drop it outside the borrow.
  drop(retired);
  ctx.trap(|| cleanup.run());
}

/// Cancellation handle returned by subscribe. Clonable; all clones refer to
/// the same registration.
pub struct Subscription<Item, Err>(StateHandle<Item, Err>);

impl<Item, Err> Clone for Subscription<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Subscription(self.0.clone()) }
}

impl<Item, Err> Subscription<Item, Err> {
  /// Constructs the subscription per the lifecycle contract:
  ///
  /// 1. notify `start` (the consumer may cancel re-entrantly; then the
  ///    subscriber function is never invoked),
  /// 2. invoke the subscriber function under the result-producing policy,
  ///    turning a capture into a synchronous `error` notification,
  /// 3. store the returned cleanup,
  /// 4. run it immediately if the stream already terminated during step 2.
  pub(crate) fn new(
    ctx: Context,
    subscriber: &Rc<SubscriberFn<Item, Err>>,
    observer: BoxedObserver<Item, Err>,
  ) -> Self
  where
    Err: From<CaughtPanic>,
  {
    let _turn = Turn::enter();
    let state = MutRc::own(SubState {
      slot: ObserverSlot::Open(observer),
      cleanup: Cleanup::None,
      ctx: ctx.clone(),
    });
    let subscription = Subscription(state.clone());

    if let Some(mut observer) = checkout(&state) {
      ctx.trap(|| observer.start(&subscription));
      restore(&state, observer);
    }
    if subscription.is_closed() {
      return subscription;
    }

    let producer_observer = SubscriptionObserver(state.clone());
    match ctx.trap_result(|| subscriber(producer_observer.clone())) {
      Err(captured) => producer_observer.error(Err::from(captured)),
      Ok(cleanup) => {
        let run_now = {
          let mut s = state.rc_deref_mut();
          if matches!(s.slot, ObserverSlot::Closed) {
            Some(cleanup)
          } else {
            s.cleanup = cleanup;
            None
          }
        };
        if let Some(cleanup) = run_now {
          ctx.trap(|| cleanup.run());
        }
      }
    }
    subscription
  }

  /// Cancels the registration and runs the cleanup. Idempotent; safe to call
  /// from within any callback, including re-entrantly from `next`.
  pub fn unsubscribe(&self) { close_and_cleanup(&self.0) }

  pub fn is_closed(&self) -> bool {
    matches!(self.0.rc_deref().slot, ObserverSlot::Closed)
  }

  /// Activates RAII behavior: `unsubscribe` runs as soon as the returned
  /// guard goes out of scope.
  ///
  /// **Attention:** if you don't assign the return value to a variable, the
  /// subscription is cancelled immediately, which is probably not what you
  /// want.
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Item, Err> {
    SubscriptionGuard(self)
  }
}

impl<Item, Err> SubscriptionLike for Subscription<Item, Err> {
  #[inline]
  fn unsubscribe(&mut self) { Subscription::unsubscribe(self) }

  #[inline]
  fn is_closed(&self) -> bool { Subscription::is_closed(self) }
}

impl<Item, Err> Debug for Subscription<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// An RAII "scoped subscription": when the guard is dropped, the underlying
/// subscription is unsubscribed.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<Item, Err>(Subscription<Item, Err>);

impl<Item, Err> SubscriptionGuard<Item, Err> {
  pub fn new(subscription: Subscription<Item, Err>) -> Self { SubscriptionGuard(subscription) }
}

impl<Item, Err> Drop for SubscriptionGuard<Item, Err> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

/// Producer-facing capability object: the restricted view of a subscription
/// a subscriber function pushes notifications through.
///
/// Clonable so producers may stash it for later (e.g. promise handlers); it
/// does not own the observer: once the subscription closes, every clone
/// turns into a no-op.
pub struct SubscriptionObserver<Item, Err>(StateHandle<Item, Err>);

impl<Item, Err> Clone for SubscriptionObserver<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { SubscriptionObserver(self.0.clone()) }
}

impl<Item, Err> SubscriptionObserver<Item, Err> {
  /// Delivers a value. No-op once closed. A panicking consumer callback is
  /// contained and reported after the turn; delivery of later values
  /// continues.
  pub fn next(&self, value: Item) {
    let ctx = state_ctx(&self.0);
    let _turn = Turn::enter();
    let Some(mut observer) = checkout(&self.0) else { return };
    ctx.trap(|| observer.next(value));
    restore(&self.0, observer);
  }

  /// Terminates the stream with an error. The slot closes *before* the
  /// callback runs, so re-delivery is impossible even if the callback
  /// re-enters; callback and cleanup are two independently contained calls.
  pub fn error(&self, err: Err) {
    let ctx = state_ctx(&self.0);
    let _turn = Turn::enter();
    let (retired, cleanup) = {
      let mut s = self.0.rc_deref_mut();
      if matches!(s.slot, ObserverSlot::Closed) {
        return;
      }
      let retired = mem::replace(&mut s.slot, ObserverSlot::Closed);
      (retired, mem::take(&mut s.cleanup))
    };
    if let ObserverSlot::Open(mut observer) = retired {
      ctx.trap(|| observer.error(err));
    }
    ctx.trap(|| cleanup.run());
  }

  /// Terminates the stream successfully. Symmetric to [`Self::error`].
  pub fn complete(&self) {
    let ctx = state_ctx(&self.0);
    let _turn = Turn::enter();
    let (retired, cleanup) = {
      let mut s = self.0.rc_deref_mut();
      if matches!(s.slot, ObserverSlot::Closed) {
        return;
      }
      let retired = mem::replace(&mut s.slot, ObserverSlot::Closed);
      (retired, mem::take(&mut s.cleanup))
    };
    if let ObserverSlot::Open(mut observer) = retired {
      ctx.trap(|| observer.complete());
    }
    ctx.trap(|| cleanup.run());
  }

  pub fn is_closed(&self) -> bool {
    matches!(self.0.rc_deref().slot, ObserverSlot::Closed)
  }

  pub(crate) fn ctx(&self) -> Context { state_ctx(&self.0) }
}

/// A subscription observer is itself an observer, so operators can subscribe
/// it directly to an upstream source and relay notifications one-to-one.
impl<Item, Err> Observer<Item, Err> for SubscriptionObserver<Item, Err> {
  fn next(&mut self, value: Item) { SubscriptionObserver::next(self, value) }

  fn error(&mut self, err: Err) { SubscriptionObserver::error(self, err) }

  fn complete(&mut self) { SubscriptionObserver::complete(self) }
}

impl<Item, Err> Debug for SubscriptionObserver<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubscriptionObserver")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}
