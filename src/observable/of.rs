use crate::prelude::*;

/// Creates an observable producing multiple values.
///
/// Completes immediately after emitting the values given. Never emits an
/// error.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
/// use rxlite::of_sequence;
///
/// let seq: Observable<i32, String> = of_sequence!(1, 2, 3);
/// seq.subscribe(|v| println!("{},", v));
///
/// // print log:
/// // 1
/// // 2
/// // 3
/// ```
#[macro_export]
macro_rules! of_sequence {
  ( $( $item:expr ),* ) => {
    $crate::observable::from_iter(vec![$($item),*])
  };
}

/// Creates an observable producing a single value.
///
/// Completes immediately after emitting the value given. Never emits an
/// error.
///
/// # Arguments
///
/// * `v` - A value to emit.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::of::<_, String>(123).subscribe(|v| println!("{},", v));
/// ```
pub fn of<Item, Err>(v: Item) -> Observable<Item, Err>
where
  Item: Clone + 'static,
  Err: 'static,
{
  Observable::new(move |observer| {
    observer.next(v.clone());
    observer.complete();
    Cleanup::None
  })
}

/// Creates an observable that emits the value or the error from a [`Result`]
/// given.
///
/// Completes immediately after.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::of_result::<_, String>(Ok(1234)).subscribe(|v| println!("{},", v));
///
/// observable::of_result(Err("An error".to_owned()))
///   .subscribe_err(|_: i32| {}, |e| println!("Error:  {},", e));
/// ```
pub fn of_result<Item, Err>(r: Result<Item, Err>) -> Observable<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  Observable::new(move |observer| {
    match &r {
      Ok(v) => observer.next(v.clone()),
      Err(e) => observer.error(e.clone()),
    }
    observer.complete();
    Cleanup::None
  })
}

/// Creates an observable that potentially emits a single value from an
/// [`Option`].
///
/// Emits the value if it is there and completes immediately after; completes
/// immediately when the option is empty. Never emits an error.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::of_option::<_, String>(Some(1234)).subscribe(|v| println!("{},", v));
/// ```
pub fn of_option<Item, Err>(o: Option<Item>) -> Observable<Item, Err>
where
  Item: Clone + 'static,
  Err: 'static,
{
  Observable::new(move |observer| {
    if let Some(v) = &o {
      observer.next(v.clone());
    }
    observer.complete();
    Cleanup::None
  })
}

#[cfg(test)]
mod test {
  use std::{cell::Cell, rc::Rc};

  use bencher::{benchmark_group, Bencher};

  use crate::prelude::*;

  #[test]
  fn of() {
    let value = Rc::new(Cell::new(0));
    let completed = Rc::new(Cell::new(false));
    let (v, c) = (value.clone(), completed.clone());
    observable::of::<_, String>(100)
      .subscribe_complete(move |x| v.set(x), move || c.set(true));

    assert_eq!(value.get(), 100);
    assert!(completed.get());
  }

  #[test]
  fn of_option() {
    let value = Rc::new(Cell::new(0));
    let completed = Rc::new(Cell::new(false));
    let (v, c) = (value.clone(), completed.clone());
    observable::of_option::<_, String>(Some(123))
      .subscribe_complete(move |x| v.set(x), move || c.set(true));
    assert_eq!(value.get(), 123);
    assert!(completed.get());

    let value = Rc::new(Cell::new(0));
    let completed = Rc::new(Cell::new(false));
    let (v, c) = (value.clone(), completed.clone());
    observable::of_option::<_, String>(None)
      .subscribe_complete(move |x| v.set(x), move || c.set(true));
    assert_eq!(value.get(), 0);
    assert!(completed.get());
  }

  #[test]
  fn of_result() {
    let value = Rc::new(Cell::new(0));
    let v = value.clone();
    let r: Result<i32, String> = Ok(123);
    observable::of_result(r).subscribe(move |x| v.set(x));
    assert_eq!(value.get(), 123);

    let error_reported = Rc::new(Cell::new(false));
    let e = error_reported.clone();
    let r: Result<i32, String> = Err("error".to_owned());
    observable::of_result(r).subscribe_err(|_| {}, move |_| e.set(true));
    assert!(error_reported.get());
  }

  #[test]
  fn of_macros() {
    let sum = Rc::new(Cell::new(0));
    let s = sum.clone();
    let seq: Observable<i32, String> = of_sequence!(1, 2, 3);
    seq.subscribe(move |v| s.set(s.get() + v));

    assert_eq!(sum.get(), 6);
  }

  #[test]
  fn bench() { do_bench(); }

  benchmark_group!(do_bench, bench_of);

  fn bench_of(b: &mut Bencher) {
    b.iter(|| {
      observable::of::<_, String>(100).subscribe(|_| {});
    });
  }
}
