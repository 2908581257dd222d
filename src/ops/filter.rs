use std::rc::Rc;

use crate::{prelude::*, trap::CaughtPanic};

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Emits only those values for which the predicate (given the value and
  /// its ordinal) returns true.
  ///
  /// A panicking predicate terminates the downstream stream with the
  /// captured error.
  ///
  /// ```
  /// use rxlite::prelude::*;
  ///
  /// observable::from_iter::<_, String>(0..10)
  ///   .filter(|v, _| v % 2 == 0)
  ///   .subscribe(|v| println!("{},", v));
  /// ```
  pub fn filter<F>(self, predicate: F) -> Observable<Item, Err>
  where
    F: Fn(&Item, usize) -> bool + 'static,
  {
    let predicate = Rc::new(predicate);
    Observable::new_in(self.context().clone(), move |observer| {
      let source_sub = self.subscribe_observer(FilterObserver {
        observer,
        predicate: predicate.clone(),
        index: 0,
      });
      Cleanup::from(source_sub)
    })
  }
}

struct FilterObserver<Item, Err> {
  observer: SubscriptionObserver<Item, Err>,
  predicate: Rc<dyn Fn(&Item, usize) -> bool>,
  index: usize,
}

impl<Item, Err> Observer<Item, Err> for FilterObserver<Item, Err>
where
  Err: From<CaughtPanic>,
{
  fn next(&mut self, value: Item) {
    let i = self.index;
    self.index += 1;
    let ctx = self.observer.ctx();
    match ctx.trap_result(|| (self.predicate)(&value, i)) {
      Ok(true) => self.observer.next(value),
      Ok(false) => {}
      Err(captured) => self.observer.error(Err::from(captured)),
    }
  }

  fn error(&mut self, err: Err) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }
}
