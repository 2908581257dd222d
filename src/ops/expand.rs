use std::rc::Rc;

use crate::{
  ops::flatten::{flatten, outer_next, CoreHandle, EmitOuterFn, ProjectFn, ReenterFn, SelectFn},
  prelude::*,
  trap::CaughtPanic,
};

impl<Item: Clone + 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Recursively expands the stream: every value, source or expanded, is
  /// emitted downstream at projection time, and each inner emission is fed
  /// back in as a new outer value, until a projection yields an empty
  /// source.
  ///
  /// Concurrency is unbounded; recursion is synchronous and bounded only by
  /// the projections eventually drying up.
  ///
  /// ```
  /// use rxlite::prelude::*;
  ///
  /// // 1, 2, 4, 8: doubling until past 5.
  /// observable::of::<_, String>(1)
  ///   .expand(|v, _| {
  ///     if *v < 5 {
  ///       observable::of(v * 2)
  ///     } else {
  ///       observable::empty()
  ///     }
  ///   })
  ///   .subscribe(|v| println!("{},", v));
  /// ```
  pub fn expand<S, F>(self, project: F) -> Observable<Item, Err>
  where
    S: Into<Source<Item, Err>>,
    F: Fn(&Item, usize) -> S + 'static,
  {
    let project: ProjectFn<Item, Item, Err> = Rc::new(move |v, i| project(v, i).into());
    let selector: SelectFn<Item, Item, Item> = Rc::new(|_, inner, _, _| inner);
    let emit_outer: EmitOuterFn<Item, Item, Err> =
      Rc::new(|destination, value: &Item| destination.next(value.clone()));
    let reenter: ReenterFn<Item, Item, Item, Err> =
      Rc::new(|core: &CoreHandle<Item, Item, Item, Err>, value: Item| outer_next(core, value));
    flatten(self, project, selector, Some(emit_outer), Some(reenter), usize::MAX)
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn recursively_expands_values() {
    let projected = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let (p, s) = (projected.clone(), seen.clone());

    observable::from_iter::<_, String>(vec![10, 11])
      .expand(move |v, i| {
        p.borrow_mut().push((*v, i));
        if *v < 100 {
          observable::of(*v * 10 + i as i32)
        } else {
          observable::empty()
        }
      })
      .subscribe(move |v| s.borrow_mut().push(v));

    // Each value surfaces downstream when projected; expansion results are
    // re-projected with a shared, monotonically increasing ordinal.
    assert_eq!(*projected.borrow(), vec![(10, 0), (100, 1), (11, 2), (112, 3)]);
    assert_eq!(*seen.borrow(), vec![10, 100, 11, 112]);
  }

  #[test]
  fn expansion_completes_once_projections_dry_up() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());

    observable::of::<_, String>(1)
      .expand(|v, _| {
        if *v < 5 {
          observable::of(*v * 2)
        } else {
          observable::empty()
        }
      })
      .subscribe_complete(
        move |v| n.borrow_mut().push(format!("next {v}")),
        move || c.borrow_mut().push("complete".to_owned()),
      );

    assert_eq!(*log.borrow(), vec!["next 1", "next 2", "next 4", "next 8", "complete"]);
  }

  #[test]
  fn projection_panic_terminates_the_expansion() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let e = errors.clone();
    observable::of::<_, String>(1)
      .expand(|v, _| -> Observable<i32, String> {
        if *v >= 4 {
          panic!("expansion overflow")
        } else {
          observable::of(*v * 2)
        }
      })
      .subscribe_err(|_| {}, move |err| e.borrow_mut().push(err));

    assert_eq!(*errors.borrow(), vec!["expansion overflow".to_owned()]);
  }
}
