use crate::{prelude::*, trap::CaughtPanic};

impl<Item: Clone + 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Collects every value into a `Vec` emitted once on source completion.
  ///
  /// A fold with an appending accumulator over an initially empty vector.
  ///
  /// ```
  /// use rxlite::prelude::*;
  ///
  /// observable::from_iter::<_, String>(0..3)
  ///   .to_vec()
  ///   .subscribe(|all| assert_eq!(all, vec![0, 1, 2]));
  /// ```
  pub fn to_vec(self) -> Observable<Vec<Item>, Err> {
    self.reduce_initial(Vec::new(), |mut all, item, _| {
      all.push(item);
      all
    })
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn collects_in_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    observable::from_iter::<_, String>(vec![3, 1, 2])
      .to_vec()
      .subscribe(move |all| s.borrow_mut().push(all));
    assert_eq!(*seen.borrow(), vec![vec![3, 1, 2]]);
  }

  #[test]
  fn empty_source_yields_empty_vec() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    observable::empty::<i32, String>().to_vec().subscribe(move |all| s.borrow_mut().push(all));
    assert_eq!(*seen.borrow(), vec![Vec::<i32>::new()]);
  }
}
