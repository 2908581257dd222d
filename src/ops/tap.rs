use std::rc::Rc;

use crate::{prelude::*, trap::CaughtPanic};

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Invokes a side-effect callback per value, forwarding every notification
  /// unchanged. A panicking callback replaces the forwarded value with an
  /// `error` notification.
  pub fn tap<F>(self, on_next: F) -> Observable<Item, Err>
  where
    F: Fn(&Item) + 'static,
  {
    self.tap_with(TapCallbacks { on_next: Some(Rc::new(on_next)), on_error: None, on_complete: None })
  }

  /// Invokes a side-effect callback when the source errors, then forwards
  /// the original error. A panicking callback forwards the capture instead.
  pub fn tap_error<F>(self, on_error: F) -> Observable<Item, Err>
  where
    F: Fn(&Err) + 'static,
  {
    self.tap_with(TapCallbacks { on_next: None, on_error: Some(Rc::new(on_error)), on_complete: None })
  }

  /// Invokes a side-effect callback on completion before forwarding it. A
  /// panicking callback replaces the completion with an `error`.
  pub fn tap_complete<F>(self, on_complete: F) -> Observable<Item, Err>
  where
    F: Fn() + 'static,
  {
    self.tap_with(TapCallbacks { on_next: None, on_error: None, on_complete: Some(Rc::new(on_complete)) })
  }

  fn tap_with(self, callbacks: TapCallbacks<Item, Err>) -> Observable<Item, Err> {
    Observable::new_in(self.context().clone(), move |observer| {
      let source_sub = self.subscribe_observer(TapObserver {
        observer,
        callbacks: callbacks.clone(),
      });
      Cleanup::from(source_sub)
    })
  }
}

struct TapCallbacks<Item, Err> {
  on_next: Option<Rc<dyn Fn(&Item)>>,
  on_error: Option<Rc<dyn Fn(&Err)>>,
  on_complete: Option<Rc<dyn Fn()>>,
}

impl<Item, Err> Clone for TapCallbacks<Item, Err> {
  fn clone(&self) -> Self {
    TapCallbacks {
      on_next: self.on_next.clone(),
      on_error: self.on_error.clone(),
      on_complete: self.on_complete.clone(),
    }
  }
}

struct TapObserver<Item, Err> {
  observer: SubscriptionObserver<Item, Err>,
  callbacks: TapCallbacks<Item, Err>,
}

impl<Item, Err> Observer<Item, Err> for TapObserver<Item, Err>
where
  Err: From<CaughtPanic>,
{
  fn next(&mut self, value: Item) {
    if let Some(on_next) = &self.callbacks.on_next {
      let ctx = self.observer.ctx();
      if let Err(captured) = ctx.trap_result(|| on_next(&value)) {
        self.observer.error(Err::from(captured));
        return;
      }
    }
    self.observer.next(value);
  }

  fn error(&mut self, err: Err) {
    if let Some(on_error) = &self.callbacks.on_error {
      let ctx = self.observer.ctx();
      if let Err(captured) = ctx.trap_result(|| on_error(&err)) {
        self.observer.error(Err::from(captured));
        return;
      }
    }
    self.observer.error(err);
  }

  fn complete(&mut self) {
    if let Some(on_complete) = &self.callbacks.on_complete {
      let ctx = self.observer.ctx();
      if let Err(captured) = ctx.trap_result(|| on_complete()) {
        self.observer.error(Err::from(captured));
        return;
      }
    }
    self.observer.complete();
  }
}
