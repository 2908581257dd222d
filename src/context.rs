//! Delivery context: the containment configuration threaded through every
//! observable and subscription, plus the turn-scoped reporting of unhandled
//! captures.
//!
//! Two containment forms exist:
//!
//! - [`Context::trap`] (fire-and-forget) wraps calls whose result nobody
//!   consumes: `start`/`next` delivery to the consumer and cleanup execution.
//!   A captured panic is queued and reported once the outermost synchronous
//!   turn ends, so one faulty consumer callback cannot abort producer logic
//!   or sibling callbacks delivered in the same turn.
//! - [`Context::trap_result`] (result-producing) wraps calls whose return
//!   value matters: subscriber functions, projections, predicates,
//!   accumulators, selectors. The capture is handed back to the caller, which
//!   surfaces it synchronously as an `error` notification on the nearest
//!   enclosing subscription.
//!
//! The `RXLITE_NO_TRAP` environment variable (any value other than `0`)
//! switches the default context to [`TrapMode::Propagate`], letting panics
//! unwind natively for debugging. It is read once per process.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

use once_cell::sync::Lazy;

use crate::trap::{catch, CaughtPanic, TrapMode};

static NO_TRAP: Lazy<bool> =
  Lazy::new(|| std::env::var_os("RXLITE_NO_TRAP").is_some_and(|v| v != "0"));

type UnhandledHook = Rc<dyn Fn(CaughtPanic)>;

thread_local! {
  static TURN_DEPTH: Cell<usize> = const { Cell::new(0) };
  static PENDING: RefCell<Vec<(Option<UnhandledHook>, CaughtPanic)>> =
    const { RefCell::new(Vec::new()) };
}

/// Containment configuration for one pipeline.
///
/// A context is fixed at construction and cloned into every observable and
/// subscription derived from it; operators propagate their source's context.
#[derive(Clone)]
pub struct Context {
  mode: TrapMode,
  hook: Option<UnhandledHook>,
}

impl Default for Context {
  fn default() -> Self {
    Context::new(if *NO_TRAP { TrapMode::Propagate } else { TrapMode::Contain })
  }
}

impl Context {
  pub fn new(mode: TrapMode) -> Self { Context { mode, hook: None } }

  /// Installs a sink for unhandled captures reported at the end of a turn.
  ///
  /// Without a hook, unhandled captures are logged through `tracing::error!`.
  pub fn with_unhandled_hook(mut self, hook: impl Fn(CaughtPanic) + 'static) -> Self {
    self.hook = Some(Rc::new(hook));
    self
  }

  pub fn mode(&self) -> TrapMode { self.mode }

  /// Fire-and-forget containment: a capture is queued for end-of-turn
  /// reporting and the caller continues as if the callback had returned.
  pub(crate) fn trap(&self, f: impl FnOnce()) {
    match self.mode {
      TrapMode::Propagate => f(),
      TrapMode::Contain => {
        if let Err(p) = catch(f) {
          PENDING.with(|pending| pending.borrow_mut().push((self.hook.clone(), p)));
        }
      }
    }
  }

  /// Result-producing containment: the capture is returned to the caller.
  pub(crate) fn trap_result<R>(&self, f: impl FnOnce() -> R) -> Result<R, CaughtPanic> {
    match self.mode {
      TrapMode::Propagate => Ok(f()),
      TrapMode::Contain => catch(f),
    }
  }
}

/// RAII token for one entry into the library from user code.
///
/// Every public entry point (subscribe, unsubscribe, `next`/`error`/
/// `complete` delivery, dispose) opens a turn. Captures queued by
/// [`Context::trap`] are reported only when the outermost turn ends, i.e.
/// strictly after the current synchronous delivery has run to completion.
pub(crate) struct Turn;

impl Turn {
  pub(crate) fn enter() -> Turn {
    TURN_DEPTH.with(|d| d.set(d.get() + 1));
    Turn
  }
}

impl Drop for Turn {
  fn drop(&mut self) {
    let depth = TURN_DEPTH.with(|d| {
      let n = d.get() - 1;
      d.set(n);
      n
    });
    if depth == 0 && !std::thread::panicking() {
      flush_unhandled();
    }
  }
}

fn flush_unhandled() {
  // A hook may itself subscribe or deliver, queueing more captures; loop
  // until the queue stays empty.
  loop {
    let batch: Vec<_> = PENDING.with(|p| p.borrow_mut().drain(..).collect());
    if batch.is_empty() {
      break;
    }
    for (hook, panic) in batch {
      match hook {
        Some(hook) => {
          if catch(|| hook(panic)).is_err() {
            tracing::error!("unhandled-capture hook panicked");
          }
        }
        None => tracing::error!("unhandled panic in observer callback: {panic}"),
      }
    }
  }
}
