use crate::{prelude::*, trap::CaughtPanic};

/// A notification reified as a value.
///
/// `materialize` turns the three delivery channels into `Next`/`Error`/
/// `Complete` values on the `next` channel; `dematerialize` plays them back.
/// There is no "unrecognized" shape; the enum is closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Reifies every notification as a [`Notification`] value. Terminal
  /// notifications are represented and then the materialized stream itself
  /// completes; it never errors.
  pub fn materialize(self) -> Observable<Notification<Item, Err>, Err> {
    Observable::new_in(self.context().clone(), move |observer| {
      let source_sub = self.subscribe_observer(MaterializeObserver { observer });
      Cleanup::from(source_sub)
    })
  }
}

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Notification<Item, Err>, Err> {
  /// Plays reified notifications back into real ones, the inverse of
  /// [`Observable::materialize`]. Values after a reified terminal are
  /// dropped by the at-most-once rule.
  pub fn dematerialize(self) -> Observable<Item, Err> {
    Observable::new_in(self.context().clone(), move |observer| {
      let source_sub = self.subscribe_observer(DematerializeObserver { observer });
      Cleanup::from(source_sub)
    })
  }
}

struct MaterializeObserver<Item, Err> {
  observer: SubscriptionObserver<Notification<Item, Err>, Err>,
}

impl<Item, Err> Observer<Item, Err> for MaterializeObserver<Item, Err> {
  fn next(&mut self, value: Item) { self.observer.next(Notification::Next(value)) }

  fn error(&mut self, err: Err) {
    self.observer.next(Notification::Error(err));
    self.observer.complete();
  }

  fn complete(&mut self) {
    self.observer.next(Notification::Complete);
    self.observer.complete();
  }
}

struct DematerializeObserver<Item, Err> {
  observer: SubscriptionObserver<Item, Err>,
}

impl<Item, Err> Observer<Notification<Item, Err>, Err> for DematerializeObserver<Item, Err> {
  fn next(&mut self, note: Notification<Item, Err>) {
    match note {
      Notification::Next(v) => self.observer.next(v),
      Notification::Error(e) => self.observer.error(e),
      Notification::Complete => self.observer.complete(),
    }
  }

  fn error(&mut self, err: Err) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }
}
