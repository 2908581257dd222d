use std::rc::Rc;

use crate::{
  classic::{ClassicSource, ClassicSubscriptionObserver},
  context::Context,
  observable::{from_iter::emit_iter, Observable},
  prelude::{ClassicObservable, Cleanup, Deferred, Thenable},
};

/// The adaptation capability: the well-known hook by which any type declares
/// itself convertible to the modern [`Observable`] shape.
///
/// Foreign observable implementations implement this to interoperate without
/// coupling; the conversion is expected to be cheap and, for types that
/// already wrap a compatible subscriber function, to share it rather than
/// stack another adapter.
pub trait IntoObservable<Item, Err> {
  fn into_observable(self) -> Observable<Item, Err>;
}

impl<Item: 'static, Err: 'static> IntoObservable<Item, Err> for Observable<Item, Err> {
  #[inline]
  fn into_observable(self) -> Observable<Item, Err> { self }
}

/// Everything [`from`] accepts, as an explicit tagged union.
///
/// The duck typing of dynamic observable libraries becomes a closed set of
/// shapes probed in a fixed precedence order at construction: adaptation
/// capability first, then iterables, then classic observables, then
/// promise-likes. A shape outside this set is unrepresentable.
pub enum Source<Item, Err> {
  /// Anything carrying the adaptation capability, already adapted.
  Observable(Observable<Item, Err>),
  /// A replayable iterable; the factory yields one fresh pass per subscribe.
  Iter(Rc<dyn Fn() -> Box<dyn Iterator<Item = Item>>>),
  /// A foreign classic observable, adapted through an observer shim.
  Classic(Rc<dyn ClassicSource<Item, Err>>),
  /// A promise-like value settling exactly once.
  Promise(Rc<dyn Thenable<Item, Err>>),
}

impl<Item: 'static, Err: 'static> Source<Item, Err> {
  pub fn observable(o: impl IntoObservable<Item, Err>) -> Self {
    Source::Observable(o.into_observable())
  }

  pub fn iter<Iter>(iter: Iter) -> Self
  where
    Iter: IntoIterator<Item = Item> + Clone + 'static,
    Iter::IntoIter: 'static,
  {
    Source::Iter(Rc::new(move || Box::new(iter.clone().into_iter())))
  }

  pub fn classic(c: impl ClassicSource<Item, Err> + 'static) -> Self {
    Source::Classic(Rc::new(c))
  }

  pub fn promise(p: impl Thenable<Item, Err> + 'static) -> Self {
    Source::Promise(Rc::new(p))
  }

  pub(crate) fn into_observable_in(self, ctx: &Context) -> Observable<Item, Err> {
    match self {
      // Identity short-circuit: the adapted observable is returned as-is,
      // keeping its own subscriber function and context.
      Source::Observable(o) => o,
      Source::Iter(fresh) => Observable::new_in(ctx.clone(), move |observer| {
        emit_iter(&observer, fresh());
        Cleanup::None
      }),
      Source::Classic(classic) => Observable::new_in(ctx.clone(), move |observer| {
        let mut disposable =
          classic.subscribe_classic(Box::new(ClassicSubscriptionObserver::new(observer)));
        Cleanup::from_fn(move || disposable.dispose())
      }),
      Source::Promise(promise) => Observable::new_in(ctx.clone(), move |observer| {
        let rejected = observer.clone();
        promise.then(
          Box::new(move |v| {
            observer.next(v);
            observer.complete();
          }),
          Box::new(move |e| rejected.error(e)),
        );
        Cleanup::None
      }),
    }
  }
}

impl<Item: 'static, Err: 'static> From<Observable<Item, Err>> for Source<Item, Err> {
  fn from(o: Observable<Item, Err>) -> Self { Source::Observable(o) }
}

/// A classic observable converts through its adaptation capability (the
/// shared subscriber function), not through the observer-shim fallback.
impl<Item: 'static, Err: 'static> From<ClassicObservable<Item, Err>> for Source<Item, Err> {
  fn from(c: ClassicObservable<Item, Err>) -> Self { Source::observable(c) }
}

impl<Item: Clone + 'static, Err: 'static> From<Vec<Item>> for Source<Item, Err> {
  fn from(values: Vec<Item>) -> Self { Source::iter(values) }
}

impl<Item: Clone + 'static, Err: Clone + 'static> From<Deferred<Item, Err>> for Source<Item, Err> {
  fn from(d: Deferred<Item, Err>) -> Self { Source::promise(d) }
}

/// Adapts any supported source shape into an observable.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
///
/// observable::from::<i32, String>(vec![1, 2, 3]).subscribe(|v| println!("{},", v));
/// ```
pub fn from<Item, Err>(source: impl Into<Source<Item, Err>>) -> Observable<Item, Err>
where
  Item: 'static,
  Err: 'static,
{
  source.into().into_observable_in(&Context::default())
}
