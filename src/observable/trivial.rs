use crate::prelude::*;

/// Creates an observable that produces no values.
///
/// Completes immediately. Never emits an error.
///
/// # Examples
/// ```
/// use rxlite::prelude::*;
///
/// observable::empty::<i32, String>().subscribe(|v| println!("{},", v));
///
/// // Result: nothing printed
/// ```
pub fn empty<Item, Err>() -> Observable<Item, Err>
where
  Item: 'static,
  Err: 'static,
{
  Observable::new(|observer| {
    observer.complete();
    Cleanup::None
  })
}

/// Creates an observable that emits no items and terminates with an error.
///
/// # Arguments
///
/// * `e` - An error to emit and terminate with.
pub fn throw<Item, Err>(e: Err) -> Observable<Item, Err>
where
  Item: 'static,
  Err: Clone + 'static,
{
  Observable::new(move |observer| {
    observer.error(e.clone());
    Cleanup::None
  })
}

/// Creates an observable that never emits anything and never terminates.
///
/// Its subscriptions stay open until unsubscribed.
pub fn never<Item, Err>() -> Observable<Item, Err>
where
  Item: 'static,
  Err: 'static,
{
  Observable::new(|_observer| Cleanup::None)
}
