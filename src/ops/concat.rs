use crate::{prelude::*, trap::CaughtPanic};

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Appends further sources, subscribed strictly in order: each one only
  /// after the previous completed. An error from any source terminates the
  /// whole sequence.
  ///
  /// Flattening the list `[self, others...]` one at a time.
  ///
  /// ```
  /// use rxlite::prelude::*;
  ///
  /// observable::from_iter::<_, String>(0..2)
  ///   .concat(vec![observable::from_iter(2..4)])
  ///   .subscribe(|v| println!("{},", v));
  /// ```
  pub fn concat(self, others: impl IntoIterator<Item = Observable<Item, Err>>) -> Observable<Item, Err> {
    let mut sources = vec![self];
    sources.extend(others);
    crate::observable::from_iter(sources).concat_all()
  }
}
