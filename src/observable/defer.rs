use crate::{prelude::*, trap::CaughtPanic};

/// Creates an observable that defers to another source supplied by a
/// factory, run once at each subscription.
///
/// The factory's result is adapted like [`observable::from`](super::from); a
/// panicking factory becomes an `error` notification on the subscription
/// being constructed.
///
/// ```rust
/// # use rxlite::prelude::*;
///
/// observable::defer(|| {
///   println!("Hi!");
///   observable::of::<_, String>("Hello!")
/// })
/// .subscribe(move |v| {
///   println!("{}", v);
/// });
/// // Prints: Hi!\nHello!\n
/// ```
pub fn defer<F, S, Item, Err>(factory: F) -> Observable<Item, Err>
where
  F: Fn() -> S + 'static,
  S: Into<Source<Item, Err>>,
  Item: 'static,
  Err: From<CaughtPanic> + 'static,
{
  Observable::new(move |observer| {
    // Runs under the enclosing subscription's result-producing policy, so a
    // factory panic surfaces as an `error` notification, not an unwind.
    let source: Source<Item, Err> = factory().into();
    let ctx = observer.ctx();
    Cleanup::from(source.into_observable_in(&ctx).subscribe_observer(observer))
  })
}
