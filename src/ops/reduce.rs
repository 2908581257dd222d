use std::rc::Rc;

use crate::{prelude::*, trap::CaughtPanic};

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Folds the stream without a seed: the first value becomes the initial
  /// accumulation and is not passed through the accumulator. Emits the final
  /// accumulation on source completion (only if at least one value was
  /// seen), then completes.
  ///
  /// A panicking accumulator terminates the downstream stream with the
  /// captured error.
  pub fn reduce<F>(self, accumulator: F) -> Observable<Item, Err>
  where
    F: Fn(Item, Item, usize) -> Item + 'static,
  {
    let accumulator = Rc::new(accumulator);
    Observable::new_in(self.context().clone(), move |observer| {
      let source_sub = self.subscribe_observer(FoldObserver {
        observer,
        accumulator: accumulator.clone(),
        acc: None,
        index: 0,
      });
      Cleanup::from(source_sub)
    })
  }

  /// Folds the stream from an explicit seed. Always emits the accumulation
  /// on source completion, even for an empty source.
  pub fn reduce_initial<Acc, F>(self, initial: Acc, accumulator: F) -> Observable<Acc, Err>
  where
    Acc: Clone + 'static,
    F: Fn(Acc, Item, usize) -> Acc + 'static,
  {
    let accumulator = Rc::new(accumulator);
    Observable::new_in(self.context().clone(), move |observer| {
      let source_sub = self.subscribe_observer(FoldSeededObserver {
        observer,
        accumulator: accumulator.clone(),
        acc: Some(initial.clone()),
        index: 0,
      });
      Cleanup::from(source_sub)
    })
  }
}

struct FoldObserver<Item, Err> {
  observer: SubscriptionObserver<Item, Err>,
  accumulator: Rc<dyn Fn(Item, Item, usize) -> Item>,
  acc: Option<Item>,
  index: usize,
}

impl<Item, Err> Observer<Item, Err> for FoldObserver<Item, Err>
where
  Err: From<CaughtPanic>,
{
  fn next(&mut self, value: Item) {
    let Some(acc) = self.acc.take() else {
      // First value seeds the fold and skips the accumulator.
      self.acc = Some(value);
      self.index = 1;
      return;
    };
    let i = self.index;
    self.index += 1;
    let ctx = self.observer.ctx();
    match ctx.trap_result(|| (self.accumulator)(acc, value, i)) {
      Ok(folded) => self.acc = Some(folded),
      Err(captured) => self.observer.error(Err::from(captured)),
    }
  }

  fn error(&mut self, err: Err) { self.observer.error(err) }

  fn complete(&mut self) {
    if let Some(acc) = self.acc.take() {
      self.observer.next(acc);
    }
    self.observer.complete()
  }
}

struct FoldSeededObserver<Item, Acc, Err> {
  observer: SubscriptionObserver<Acc, Err>,
  accumulator: Rc<dyn Fn(Acc, Item, usize) -> Acc>,
  acc: Option<Acc>,
  index: usize,
}

impl<Item, Acc, Err> Observer<Item, Err> for FoldSeededObserver<Item, Acc, Err>
where
  Err: From<CaughtPanic>,
{
  fn next(&mut self, value: Item) {
    // Empty after a failed fold; the stream is already terminated then.
    let Some(acc) = self.acc.take() else { return };
    let i = self.index;
    self.index += 1;
    let ctx = self.observer.ctx();
    match ctx.trap_result(|| (self.accumulator)(acc, value, i)) {
      Ok(folded) => self.acc = Some(folded),
      Err(captured) => self.observer.error(Err::from(captured)),
    }
  }

  fn error(&mut self, err: Err) { self.observer.error(err) }

  fn complete(&mut self) {
    if let Some(acc) = self.acc.take() {
      self.observer.next(acc);
    }
    self.observer.complete()
  }
}
