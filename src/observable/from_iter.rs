use crate::prelude::*;

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error.
/// Stops pulling elements as soon as the subscription closes, so
/// unsubscribing mid-iteration abandons the rest of the sequence.
///
/// # Arguments
///
/// * `iter` - An iterator to get all the values from.
///
/// # Examples
///
/// A simple example for a range:
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::from_iter::<_, String>(0..10).subscribe(|v| println!("{},", v));
/// ```
///
/// Or with a vector:
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::from_iter::<_, String>(vec![0, 1, 2, 3]).subscribe(|v| println!("{},", v));
/// ```
pub fn from_iter<Iter, Err>(iter: Iter) -> Observable<Iter::Item, Err>
where
  Iter: IntoIterator + Clone + 'static,
  Iter::Item: 'static,
  Err: 'static,
{
  Observable::new(move |observer| {
    emit_iter(&observer, iter.clone().into_iter());
    Cleanup::None
  })
}

/// Drives one iteration pass, honoring mid-iteration unsubscription.
pub(crate) fn emit_iter<Item, Err>(
  observer: &SubscriptionObserver<Item, Err>,
  mut iter: impl Iterator<Item = Item>,
) {
  loop {
    if observer.is_closed() {
      return;
    }
    match iter.next() {
      Some(v) => observer.next(v),
      None => break,
    }
  }
  observer.complete();
}

/// Creates an observable producing the same value repeated N times.
///
/// Completes immediately after emitting N values. Never emits an error.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::repeat::<_, String>(123, 3).subscribe(|v| println!("{},", v));
///
/// // print log:
/// // 123
/// // 123
/// // 123
/// ```
pub fn repeat<Item, Err>(v: Item, n: usize) -> Observable<Item, Err>
where
  Item: Clone + 'static,
  Err: 'static,
{
  from_iter(std::iter::repeat(v).take(n))
}
