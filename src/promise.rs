//! Promise-like emission sources.
//!
//! A promise-like value settles exactly once, either fulfilled with a value
//! or rejected with an error, and hands the outcome to handlers registered
//! through [`Thenable::then`]. Settlement may happen before or after handler
//! registration; both orders deliver each handler pair at most once.

use std::mem;

use crate::rc::{MutRc, RcDeref, RcDerefMut};

type FulfilledFn<Item> = Box<dyn FnOnce(Item)>;
type RejectedFn<Err> = Box<dyn FnOnce(Err)>;

/// The promise-like contract: register one fulfillment and one rejection
/// handler. Exactly one of them runs, exactly once per registration.
pub trait Thenable<Item, Err> {
  fn then(&self, on_fulfilled: FulfilledFn<Item>, on_rejected: RejectedFn<Err>);
}

/// An already-settled promise: `Ok` is fulfillment, `Err` is rejection.
impl<Item: Clone, Err: Clone> Thenable<Item, Err> for Result<Item, Err> {
  fn then(&self, on_fulfilled: FulfilledFn<Item>, on_rejected: RejectedFn<Err>) {
    match self {
      Ok(v) => on_fulfilled(v.clone()),
      Err(e) => on_rejected(e.clone()),
    }
  }
}

enum DeferredState<Item, Err> {
  Pending(Vec<(FulfilledFn<Item>, RejectedFn<Err>)>),
  Fulfilled(Item),
  Rejected(Err),
}

/// A single-assignment promise cell.
///
/// Handlers registered while pending are held until [`Deferred::resolve`] or
/// [`Deferred::reject`]; handlers registered after settlement run
/// immediately. Settlement attempts after the first are ignored.
///
/// ```
/// use rxlite::prelude::*;
///
/// let deferred: Deferred<i32, String> = Deferred::new();
/// let source = observable::from(deferred.clone());
/// let sub = source.subscribe(|v| println!("{v}"));
/// deferred.resolve(42); // prints 42, then the stream completes
/// # assert!(sub.is_closed());
/// ```
pub struct Deferred<Item, Err>(MutRc<DeferredState<Item, Err>>);

impl<Item, Err> Clone for Deferred<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Deferred(self.0.clone()) }
}

impl<Item: Clone, Err: Clone> Deferred<Item, Err> {
  pub fn new() -> Self { Deferred(MutRc::own(DeferredState::Pending(Vec::new()))) }

  /// Settles with a value, running every pending fulfillment handler.
  /// Ignored if already settled.
  pub fn resolve(&self, value: Item) {
    let handlers = {
      let mut state = self.0.rc_deref_mut();
      match &mut *state {
        DeferredState::Pending(handlers) => {
          let handlers = mem::take(handlers);
          *state = DeferredState::Fulfilled(value.clone());
          handlers
        }
        _ => return,
      }
    };
    for (on_fulfilled, _) in handlers {
      on_fulfilled(value.clone());
    }
  }

  /// Settles with an error, running every pending rejection handler.
  /// Ignored if already settled.
  pub fn reject(&self, err: Err) {
    let handlers = {
      let mut state = self.0.rc_deref_mut();
      match &mut *state {
        DeferredState::Pending(handlers) => {
          let handlers = mem::take(handlers);
          *state = DeferredState::Rejected(err.clone());
          handlers
        }
        _ => return,
      }
    };
    for (_, on_rejected) in handlers {
      on_rejected(err.clone());
    }
  }

  pub fn is_settled(&self) -> bool {
    !matches!(&*self.0.rc_deref(), DeferredState::Pending(_))
  }
}

impl<Item: Clone, Err: Clone> Default for Deferred<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item: Clone, Err: Clone> Thenable<Item, Err> for Deferred<Item, Err> {
  fn then(&self, on_fulfilled: FulfilledFn<Item>, on_rejected: RejectedFn<Err>) {
    let settled = {
      let mut state = self.0.rc_deref_mut();
      match &mut *state {
        DeferredState::Pending(handlers) => {
          handlers.push((on_fulfilled, on_rejected));
          return;
        }
        DeferredState::Fulfilled(v) => Ok(v.clone()),
        DeferredState::Rejected(e) => Err(e.clone()),
      }
    };
    // Run outside the borrow; the handler may register further handlers.
    match settled {
      Ok(v) => on_fulfilled(v),
      Err(e) => on_rejected(e),
    }
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  #[test]
  fn late_settlement_runs_held_handlers() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    let deferred: Deferred<i32, String> = Deferred::new();
    deferred.then(
      Box::new(move |v| l.borrow_mut().push(format!("ok {v}"))),
      Box::new(|_| panic!("not rejected")),
    );
    assert!(log.borrow().is_empty());

    deferred.resolve(5);
    assert_eq!(*log.borrow(), vec!["ok 5"]);
  }

  #[test]
  fn settlement_is_first_writer_wins() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    let deferred: Deferred<i32, String> = Deferred::new();
    deferred.then(
      Box::new(move |v| l.borrow_mut().push(format!("ok {v}"))),
      Box::new(|_| panic!("not rejected")),
    );

    deferred.resolve(1);
    deferred.reject("too late".to_owned());
    deferred.resolve(2);
    assert_eq!(*log.borrow(), vec!["ok 1"]);
    assert!(deferred.is_settled());
  }

  #[test]
  fn handlers_after_settlement_run_immediately() {
    let deferred: Deferred<i32, String> = Deferred::new();
    deferred.reject("nope".to_owned());

    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    deferred.then(
      Box::new(|_| panic!("not fulfilled")),
      Box::new(move |e| l.borrow_mut().push(e)),
    );
    assert_eq!(*log.borrow(), vec!["nope"]);
  }

  #[test]
  fn settled_result_is_thenable() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    let r: Result<i32, String> = Ok(9);
    r.then(Box::new(move |v| l.borrow_mut().push(v)), Box::new(|_| {}));
    assert_eq!(*log.borrow(), vec![9]);
  }
}
