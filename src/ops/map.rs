use std::rc::Rc;

use crate::{prelude::*, trap::CaughtPanic};

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Creates a new stream which calls a closure on each element (with its
  /// ordinal) and uses its return as the value.
  ///
  /// A panicking projection terminates the downstream stream with the
  /// captured error.
  ///
  /// ```
  /// use rxlite::prelude::*;
  ///
  /// observable::from_iter::<_, String>(0..3)
  ///   .map(|v, _| v * 2)
  ///   .subscribe(|v| println!("{},", v));
  /// ```
  pub fn map<R, F>(self, project: F) -> Observable<R, Err>
  where
    R: 'static,
    F: Fn(Item, usize) -> R + 'static,
  {
    let project = Rc::new(project);
    Observable::new_in(self.context().clone(), move |observer| {
      let source_sub = self.subscribe_observer(MapObserver {
        observer,
        project: project.clone(),
        index: 0,
      });
      Cleanup::from(source_sub)
    })
  }
}

struct MapObserver<Item, R, Err> {
  observer: SubscriptionObserver<R, Err>,
  project: Rc<dyn Fn(Item, usize) -> R>,
  index: usize,
}

impl<Item, R, Err> Observer<Item, Err> for MapObserver<Item, R, Err>
where
  Err: From<CaughtPanic>,
{
  fn next(&mut self, value: Item) {
    let i = self.index;
    self.index += 1;
    let ctx = self.observer.ctx();
    match ctx.trap_result(|| (self.project)(value, i)) {
      Ok(mapped) => self.observer.next(mapped),
      Err(captured) => self.observer.error(Err::from(captured)),
    }
  }

  fn error(&mut self, err: Err) { self.observer.error(err) }

  fn complete(&mut self) { self.observer.complete() }
}

#[cfg(test)]
mod test {
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  use crate::prelude::*;

  #[test]
  fn primitive_type() {
    let sum = Rc::new(Cell::new(0));
    let s = sum.clone();
    observable::from_iter::<_, String>(100..101)
      .map(|v, _| v * 2)
      .subscribe(move |v| s.set(s.get() + v));
    assert_eq!(sum.get(), 200);
  }

  #[test]
  fn map_types_mixed() {
    let sum = Rc::new(Cell::new(0));
    let s = sum.clone();
    observable::from_iter::<_, String>(vec!['a', 'b', 'c'])
      .map(|_, _| 1)
      .subscribe(move |v| s.set(s.get() + v));
    assert_eq!(sum.get(), 3);
  }

  #[test]
  fn projection_receives_the_ordinal() {
    let pairs = Rc::new(RefCell::new(Vec::new()));
    let p = pairs.clone();
    observable::from_iter::<_, String>(vec![10, 20, 30])
      .map(|v, i| (v, i))
      .subscribe(move |pair| p.borrow_mut().push(pair));
    assert_eq!(*pairs.borrow(), vec![(10, 0), (20, 1), (30, 2)]);
  }

  #[test]
  fn projection_panic_terminates_with_error() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (n, e) = (log.clone(), log.clone());
    observable::from_iter::<_, String>(0..10)
      .map(|v, _| if v == 2 { panic!("bad value {v}") } else { v })
      .subscribe_err(
        move |v| n.borrow_mut().push(format!("next {v}")),
        move |err: String| e.borrow_mut().push(format!("error {err}")),
      );

    assert_eq!(*log.borrow(), vec!["next 0", "next 1", "error bad value 2"]);
  }
}
