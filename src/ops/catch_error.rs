use std::rc::Rc;

use crate::{
  prelude::*,
  rc::{MutRc, RcDerefMut},
  trap::CaughtPanic,
};

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Continues a failed stream with a replacement source.
  ///
  /// On source error the selector receives the error and the failed source
  /// (enabling retry-style recovery), its result is adapted like
  /// [`observable::from`](crate::observable::from) and subscribed in place of
  /// the source. A panicking selector terminates downstream with the capture
  /// instead.
  ///
  /// ```
  /// use rxlite::prelude::*;
  ///
  /// observable::throw::<i32, String>("oops".to_owned())
  ///   .catch_error(|_, _| observable::of(1))
  ///   .subscribe(|v| assert_eq!(v, 1));
  /// ```
  pub fn catch_error<S, F>(self, selector: F) -> Observable<Item, Err>
  where
    S: Into<Source<Item, Err>>,
    F: Fn(Err, &Observable<Item, Err>) -> S + 'static,
  {
    let selector: Rc<dyn Fn(Err, &Observable<Item, Err>) -> Source<Item, Err>> =
      Rc::new(move |err, source| selector(err, source).into());
    Observable::new_in(self.context().clone(), move |observer| {
      // Tracks whichever subscription is live: the source's first, the
      // replacement's after recovery.
      let current: MutRc<Option<Subscription<Item, Err>>> = MutRc::own(None);
      let catcher = CatchObserver {
        observer,
        selector: selector.clone(),
        source: self.clone(),
        current: current.clone(),
      };
      self.subscribe_observer(catcher);
      Cleanup::from_fn(move || {
        if let Some(sub) = current.rc_deref_mut().take() {
          sub.unsubscribe();
        }
      })
    })
  }
}

struct CatchObserver<Item, Err> {
  observer: SubscriptionObserver<Item, Err>,
  selector: Rc<dyn Fn(Err, &Observable<Item, Err>) -> Source<Item, Err>>,
  source: Observable<Item, Err>,
  current: MutRc<Option<Subscription<Item, Err>>>,
}

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observer<Item, Err>
  for CatchObserver<Item, Err>
{
  fn start(&mut self, subscription: &Subscription<Item, Err>) {
    *self.current.rc_deref_mut() = Some(subscription.clone());
  }

  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(&mut self, err: Err) {
    let ctx = self.observer.ctx();
    let replacement = match ctx.trap_result(|| (self.selector)(err, &self.source)) {
      Ok(source) => source.into_observable_in(&ctx),
      Err(captured) => {
        self.observer.error(Err::from(captured));
        return;
      }
    };
    let sub = replacement.subscribe_observer(self.observer.clone());
    *self.current.rc_deref_mut() = Some(sub);
  }

  fn complete(&mut self) { self.observer.complete() }
}
