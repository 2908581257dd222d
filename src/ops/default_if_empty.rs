use crate::{prelude::*, trap::CaughtPanic};

impl<Item: Clone + 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Emits the given default value on completion if the source completed
  /// without emitting anything; otherwise passes the stream through
  /// unchanged.
  pub fn default_if_empty(self, default_value: Item) -> Observable<Item, Err> {
    Observable::new_in(self.context().clone(), move |observer| {
      let source_sub = self.subscribe_observer(DefaultIfEmptyObserver {
        observer,
        is_empty: true,
        default_value: default_value.clone(),
      });
      Cleanup::from(source_sub)
    })
  }
}

struct DefaultIfEmptyObserver<Item, Err> {
  observer: SubscriptionObserver<Item, Err>,
  is_empty: bool,
  default_value: Item,
}

impl<Item: Clone, Err> Observer<Item, Err> for DefaultIfEmptyObserver<Item, Err> {
  fn next(&mut self, value: Item) {
    self.is_empty = false;
    self.observer.next(value);
  }

  fn error(&mut self, err: Err) { self.observer.error(err) }

  fn complete(&mut self) {
    if self.is_empty {
      self.observer.next(self.default_value.clone());
    }
    self.observer.complete()
  }
}

#[cfg(test)]
mod test {
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  use crate::prelude::*;

  #[test]
  fn non_empty_source_passes_through() {
    let value = Rc::new(Cell::new(0));
    let completed = Rc::new(Cell::new(false));
    let (v, c) = (value.clone(), completed.clone());

    observable::of::<_, String>(10)
      .default_if_empty(5)
      .subscribe_complete(move |x| v.set(x), move || c.set(true));

    assert_eq!(value.get(), 10);
    assert!(completed.get());
  }

  #[test]
  fn empty_source_yields_the_default() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());

    observable::empty::<i32, String>()
      .default_if_empty(1)
      .subscribe_complete(
        move |v| n.borrow_mut().push(format!("next {v}")),
        move || c.borrow_mut().push("complete".to_owned()),
      );

    assert_eq!(*log.borrow(), vec!["next 1", "complete"]);
  }

  #[test]
  fn falsy_looking_values_still_suppress_the_default() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let n = log.clone();

    observable::of::<_, String>(0)
      .default_if_empty(1)
      .subscribe(move |v| n.borrow_mut().push(v));

    assert_eq!(*log.borrow(), vec![0]);
  }

  #[test]
  fn errors_pass_through_without_default() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let hits = Rc::new(Cell::new(0));
    let (e, h) = (errors.clone(), hits.clone());

    observable::throw::<i32, String>("bad".to_owned())
      .default_if_empty(1)
      .subscribe_err(move |_| h.set(h.get() + 1), move |err| e.borrow_mut().push(err));

    assert_eq!(hits.get(), 0);
    assert_eq!(*errors.borrow(), vec!["bad".to_owned()]);
  }
}
