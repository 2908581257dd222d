//! The inner/outer subscription coordinator behind the flattening operators.
//!
//! One algorithm parametrizes `merge_map`, `merge_map_with`, `merge_all`,
//! `concat_map`, `concat_all` and `expand`: each outer value is projected to
//! an inner source and subscribed while a concurrency slot is free, or
//! buffered FIFO otherwise. Downstream completion fires exactly when the
//! outer source has completed, no inner subscription is active and the
//! buffer is empty. An error from either side, or from a panicking user
//! function, terminates everything; cancelling the result cascades into the
//! outer subscription and every active inner.
//!
//! `expand` reuses the same coordinator with two hooks: `emit_outer`
//! re-emits each outer value downstream at projection time, and `reenter`
//! feeds inner emissions back in as new outer values (its inner type equals
//! its outer type). The buffer and the concurrency limit are the sole
//! re-entrancy guard against unbounded synchronous recursion.

use std::{collections::VecDeque, rc::Rc};

use smallvec::SmallVec;

use crate::{
  context::Context,
  prelude::*,
  rc::{MutRc, RcDeref, RcDerefMut},
  trap::CaughtPanic,
};

pub(crate) type ProjectFn<T, I, Err> = Rc<dyn Fn(&T, usize) -> Source<I, Err>>;
pub(crate) type SelectFn<T, I, R> = Rc<dyn Fn(&T, I, usize, usize) -> R>;
pub(crate) type EmitOuterFn<T, R, Err> = Rc<dyn Fn(&SubscriptionObserver<R, Err>, &T)>;
pub(crate) type CoreHandle<T, I, R, Err> = MutRc<Option<FlattenCore<T, I, R, Err>>>;
pub(crate) type ReenterFn<T, I, R, Err> = Rc<dyn Fn(&CoreHandle<T, I, R, Err>, R)>;

/// Shared coordinator state; `None` once terminated or cancelled.
pub(crate) struct FlattenCore<T, I, R, Err> {
  destination: SubscriptionObserver<R, Err>,
  project: ProjectFn<T, I, Err>,
  selector: SelectFn<T, I, R>,
  emit_outer: Option<EmitOuterFn<T, R, Err>>,
  reenter: Option<ReenterFn<T, I, R, Err>>,
  ctx: Context,
  concurrent: usize,
  buffer: VecDeque<T>,
  inners: SmallVec<[InnerEntry<I, Err>; 1]>,
  outer_sub: Option<Subscription<T, Err>>,
  next_id: u64,
  index: usize,
  active: usize,
  outer_completed: bool,
}

struct InnerEntry<I, Err> {
  id: u64,
  sub: Option<Subscription<I, Err>>,
}

pub(crate) fn flatten<T, I, R, Err>(
  source: Observable<T, Err>,
  project: ProjectFn<T, I, Err>,
  selector: SelectFn<T, I, R>,
  emit_outer: Option<EmitOuterFn<T, R, Err>>,
  reenter: Option<ReenterFn<T, I, R, Err>>,
  concurrent: usize,
) -> Observable<R, Err>
where
  T: 'static,
  I: 'static,
  R: 'static,
  Err: From<CaughtPanic> + 'static,
{
  assert!(concurrent > 0, "concurrency limit must be positive");
  let ctx = source.context().clone();
  let subscriber_ctx = ctx.clone();
  Observable::new_in(ctx, move |observer| {
    let core: CoreHandle<T, I, R, Err> = MutRc::own(Some(FlattenCore {
      destination: observer,
      project: project.clone(),
      selector: selector.clone(),
      emit_outer: emit_outer.clone(),
      reenter: reenter.clone(),
      ctx: subscriber_ctx.clone(),
      concurrent,
      buffer: VecDeque::new(),
      inners: SmallVec::new(),
      outer_sub: None,
      next_id: 0,
      index: 0,
      active: 0,
      outer_completed: false,
    }));
    let outer = source.subscribe_observer(OuterObserver { core: core.clone() });
    if core.rc_deref().is_none() {
      // Terminated while the outer source was still subscribing.
      outer.unsubscribe();
    }
    let cleanup_core = core.clone();
    Cleanup::from_fn(move || cancel(&cleanup_core))
  })
}

struct OuterObserver<T, I, R, Err> {
  core: CoreHandle<T, I, R, Err>,
}

impl<T, I, R, Err> Observer<T, Err> for OuterObserver<T, I, R, Err>
where
  T: 'static,
  I: 'static,
  R: 'static,
  Err: From<CaughtPanic> + 'static,
{
  fn start(&mut self, subscription: &Subscription<T, Err>) {
    if let Some(data) = self.core.rc_deref_mut().as_mut() {
      data.outer_sub = Some(subscription.clone());
    }
  }

  fn next(&mut self, value: T) { outer_next(&self.core, value) }

  fn error(&mut self, err: Err) { fail(&self.core, err) }

  fn complete(&mut self) { outer_complete(&self.core) }
}

struct InnerObserver<T, I, R, Err> {
  core: CoreHandle<T, I, R, Err>,
  id: u64,
  outer_value: T,
  outer_index: usize,
  inner_index: usize,
}

impl<T, I, R, Err> Observer<I, Err> for InnerObserver<T, I, R, Err>
where
  T: 'static,
  I: 'static,
  R: 'static,
  Err: From<CaughtPanic> + 'static,
{
  fn start(&mut self, subscription: &Subscription<I, Err>) {
    if let Some(data) = self.core.rc_deref_mut().as_mut() {
      if let Some(entry) = data.inners.iter_mut().find(|e| e.id == self.id) {
        entry.sub = Some(subscription.clone());
      }
    }
  }

  fn next(&mut self, value: I) {
    let grabbed = {
      let slot = self.core.rc_deref();
      slot.as_ref().map(|data| {
        (data.selector.clone(), data.destination.clone(), data.reenter.clone(), data.ctx.clone())
      })
    };
    let Some((selector, destination, reenter, ctx)) = grabbed else { return };
    let i = self.inner_index;
    self.inner_index += 1;
    let outer_value = &self.outer_value;
    let oi = self.outer_index;
    match ctx.trap_result(|| selector(outer_value, value, oi, i)) {
      Ok(result) => match reenter {
        Some(reenter) => reenter(&self.core, result),
        None => destination.next(result),
      },
      Err(captured) => fail(&self.core, Err::from(captured)),
    }
  }

  fn error(&mut self, err: Err) { fail(&self.core, err) }

  fn complete(&mut self) { inner_complete(&self.core, self.id) }
}

/// One outer value arrives: start its inner source if a slot is free,
/// buffer it otherwise.
pub(crate) fn outer_next<T, I, R, Err>(core: &CoreHandle<T, I, R, Err>, value: T)
where
  T: 'static,
  I: 'static,
  R: 'static,
  Err: From<CaughtPanic> + 'static,
{
  {
    let mut slot = core.rc_deref_mut();
    let Some(data) = slot.as_mut() else { return };
    if data.active >= data.concurrent {
      data.buffer.push_back(value);
      return;
    }
  }
  project_to(core, value);
}

/// Projects an outer value and subscribes its inner source. The projection
/// happens here, exactly once per outer value, at start time, never
/// eagerly on buffering.
fn project_to<T, I, R, Err>(core: &CoreHandle<T, I, R, Err>, value: T)
where
  T: 'static,
  I: 'static,
  R: 'static,
  Err: From<CaughtPanic> + 'static,
{
  let (id, i, project, emit_outer, destination, ctx) = {
    let mut slot = core.rc_deref_mut();
    let Some(data) = slot.as_mut() else { return };
    let id = data.next_id;
    data.next_id += 1;
    let i = data.index;
    data.index += 1;
    data.active += 1;
    data.inners.push(InnerEntry { id, sub: None });
    (
      id,
      i,
      data.project.clone(),
      data.emit_outer.clone(),
      data.destination.clone(),
      data.ctx.clone(),
    )
  };
  if let Some(emit) = emit_outer {
    emit(&destination, &value);
  }
  let inner = match ctx.trap_result(|| project(&value, i)) {
    Ok(source) => source.into_observable_in(&ctx),
    Err(captured) => {
      fail(core, Err::from(captured));
      return;
    }
  };
  let inner_sub = inner.subscribe_observer(InnerObserver {
    core: core.clone(),
    id,
    outer_value: value,
    outer_index: i,
    inner_index: 0,
  });
  let keep = {
    let slot = core.rc_deref();
    slot.as_ref().is_some_and(|data| data.inners.iter().any(|e| e.id == id))
  };
  if !keep {
    // The inner finished during subscribe, or the coordinator terminated
    // mid-flight; either way the handle must not dangle.
    inner_sub.unsubscribe();
  }
}

/// One inner source completed: free its slot, start the next buffered outer
/// value, or finish the whole stream when nothing remains.
fn inner_complete<T, I, R, Err>(core: &CoreHandle<T, I, R, Err>, id: u64)
where
  T: 'static,
  I: 'static,
  R: 'static,
  Err: From<CaughtPanic> + 'static,
{
  enum After<T, R, Err> {
    Nothing,
    Dequeue(T),
    Finish(SubscriptionObserver<R, Err>),
  }

  let after = {
    let mut slot = core.rc_deref_mut();
    let Some(data) = slot.as_mut() else { return };
    data.active -= 1;
    if let Some(pos) = data.inners.iter().position(|e| e.id == id) {
      data.inners.remove(pos);
    }
    let dequeued = data.buffer.pop_front();
    let done = data.outer_completed && data.active == 0;
    match dequeued {
      Some(value) => After::Dequeue(value),
      None if done => {
        let data = slot.take().expect("coordinator state present");
        After::Finish(data.destination)
      }
      None => After::Nothing,
    }
  };
  match after {
    After::Nothing => {}
    After::Dequeue(value) => project_to(core, value),
    After::Finish(destination) => destination.complete(),
  }
}

/// The outer source completed; downstream completes only once the last
/// active inner does.
fn outer_complete<T, I, R, Err>(core: &CoreHandle<T, I, R, Err>) {
  let destination = {
    let mut slot = core.rc_deref_mut();
    let Some(data) = slot.as_mut() else { return };
    data.outer_completed = true;
    let idle = data.active == 0;
    debug_assert!(!idle || data.buffer.is_empty());
    if idle { slot.take().map(|data| data.destination) } else { None }
  };
  if let Some(destination) = destination {
    destination.complete();
  }
}

/// Terminal error from anywhere: forward downstream first, then cancel the
/// outer subscription and every active inner. No buffered value starts.
pub(crate) fn fail<T, I, R, Err>(core: &CoreHandle<T, I, R, Err>, err: Err) {
  let taken = core.rc_deref_mut().take();
  let Some(mut data) = taken else { return };
  data.destination.error(err);
  if let Some(outer) = data.outer_sub.take() {
    outer.unsubscribe();
  }
  for entry in data.inners.drain(..) {
    if let Some(sub) = entry.sub {
      sub.unsubscribe();
    }
  }
}

/// Cascading cancellation from the downstream side, not a graceful drain.
fn cancel<T, I, R, Err>(core: &CoreHandle<T, I, R, Err>) {
  let taken = core.rc_deref_mut().take();
  let Some(mut data) = taken else { return };
  if let Some(outer) = data.outer_sub.take() {
    outer.unsubscribe();
  }
  for entry in data.inners.drain(..) {
    if let Some(sub) = entry.sub {
      sub.unsubscribe();
    }
  }
}

impl<Item: 'static, Err: From<CaughtPanic> + 'static> Observable<Item, Err> {
  /// Projects each value to an inner source and merges the inner emissions
  /// into one stream, running at most `concurrent` inner subscriptions at a
  /// time (`usize::MAX` for unbounded). Values arriving while every slot is
  /// busy wait in a FIFO buffer; their projection is deferred until started.
  ///
  /// ```
  /// use rxlite::prelude::*;
  ///
  /// observable::from_iter::<_, String>(1..4)
  ///   .merge_map(|v, _| observable::from_iter(0..*v), usize::MAX)
  ///   .subscribe(|v| println!("{},", v));
  /// ```
  pub fn merge_map<I, S, F>(self, project: F, concurrent: usize) -> Observable<I, Err>
  where
    I: 'static,
    S: Into<Source<I, Err>>,
    F: Fn(&Item, usize) -> S + 'static,
  {
    let project: ProjectFn<Item, I, Err> = Rc::new(move |v, i| project(v, i).into());
    flatten(self, project, Rc::new(|_, inner, _, _| inner), None, None, concurrent)
  }

  /// `merge_map` with a result selector: each inner value is passed through
  /// `selector(outer value, inner value, outer index, inner index)` before
  /// being emitted. A panicking selector terminates the whole coordinator
  /// with that error.
  pub fn merge_map_with<I, R, S, F, G>(
    self,
    project: F,
    selector: G,
    concurrent: usize,
  ) -> Observable<R, Err>
  where
    I: 'static,
    R: 'static,
    S: Into<Source<I, Err>>,
    F: Fn(&Item, usize) -> S + 'static,
    G: Fn(&Item, I, usize, usize) -> R + 'static,
  {
    let project: ProjectFn<Item, I, Err> = Rc::new(move |v, i| project(v, i).into());
    flatten(self, project, Rc::new(selector), None, None, concurrent)
  }

  /// `merge_map` serialized: one inner source at a time, later outer values
  /// buffered until the current inner completes.
  pub fn concat_map<I, S, F>(self, project: F) -> Observable<I, Err>
  where
    I: 'static,
    S: Into<Source<I, Err>>,
    F: Fn(&Item, usize) -> S + 'static,
  {
    self.merge_map(project, 1)
  }
}

impl<I: 'static, Err: From<CaughtPanic> + 'static> Observable<Observable<I, Err>, Err> {
  /// Flattens a stream of observables with identity projection, running at
  /// most `concurrent` of them at a time (`usize::MAX` for unbounded).
  pub fn merge_all(self, concurrent: usize) -> Observable<I, Err> {
    self.merge_map(|inner, _| inner.clone(), concurrent)
  }

  /// Flattens a stream of observables strictly one after another.
  pub fn concat_all(self) -> Observable<I, Err> { self.merge_all(1) }
}

#[cfg(test)]
mod test {
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  use crate::prelude::*;

  type Emitters = Rc<RefCell<Vec<SubscriptionObserver<i32, String>>>>;

  /// An inner source that never terminates on its own; its producer handle
  /// is parked in `emitters` for the test to drive.
  fn remote_controlled(emitters: &Emitters) -> Observable<i32, String> {
    let emitters = emitters.clone();
    Observable::new(move |observer| {
      emitters.borrow_mut().push(observer);
      Cleanup::None
    })
  }

  #[test]
  fn concat_map_subscribes_one_at_a_time() {
    let inner_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let inners =
      vec![remote_controlled(&inner_emitters), remote_controlled(&inner_emitters)];
    let outer_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let outer = remote_controlled(&outer_emitters);

    let projected = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::new(RefCell::new(Vec::new()));
    let (p, n, c) = (projected.clone(), log.clone(), log.clone());
    outer
      .concat_map(move |v: &i32, i| {
        p.borrow_mut().push((*v, i));
        inners[i].clone()
      })
      .subscribe_complete(
        move |v| n.borrow_mut().push(format!("next {v}")),
        move || c.borrow_mut().push("complete".to_owned()),
      );

    let outer_observer = outer_emitters.borrow()[0].clone();
    outer_observer.next(10);
    outer_observer.next(11);
    // Only the first outer value was projected; the second waits buffered.
    assert_eq!(*projected.borrow(), vec![(10, 0)]);
    assert_eq!(inner_emitters.borrow().len(), 1);

    inner_emitters.borrow()[0].clone().next(100);
    inner_emitters.borrow()[0].clone().next(101);
    assert_eq!(*log.borrow(), vec!["next 100", "next 101"]);

    inner_emitters.borrow()[0].clone().complete();
    assert_eq!(*projected.borrow(), vec![(10, 0), (11, 1)]);
    assert_eq!(inner_emitters.borrow().len(), 2);

    inner_emitters.borrow()[1].clone().next(110);
    inner_emitters.borrow()[1].clone().complete();
    assert_eq!(*log.borrow(), vec!["next 100", "next 101", "next 110"]);

    outer_observer.complete();
    assert_eq!(*log.borrow(), vec!["next 100", "next 101", "next 110", "complete"]);
  }

  #[test]
  fn merge_map_subscribes_all_at_once() {
    let inner_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let inners =
      vec![remote_controlled(&inner_emitters), remote_controlled(&inner_emitters)];
    let outer_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let outer = remote_controlled(&outer_emitters);

    let projected = Rc::new(RefCell::new(Vec::new()));
    let p = projected.clone();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    outer
      .merge_map(
        move |v: &i32, i| {
          p.borrow_mut().push((*v, i));
          inners[i].clone()
        },
        usize::MAX,
      )
      .subscribe(move |v| s.borrow_mut().push(v));

    let outer_observer = outer_emitters.borrow()[0].clone();
    outer_observer.next(10);
    outer_observer.next(11);
    // Both projections happened before any inner emitted.
    assert_eq!(*projected.borrow(), vec![(10, 0), (11, 1)]);
    assert_eq!(inner_emitters.borrow().len(), 2);

    inner_emitters.borrow()[1].clone().next(110);
    inner_emitters.borrow()[0].clone().next(100);
    assert_eq!(*seen.borrow(), vec![110, 100]);
  }

  #[test]
  fn completion_waits_for_buffered_values() {
    let inner_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let inners =
      vec![remote_controlled(&inner_emitters), remote_controlled(&inner_emitters)];
    let outer_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let outer = remote_controlled(&outer_emitters);

    let completed = Rc::new(Cell::new(false));
    let c = completed.clone();
    outer
      .merge_map(move |_, i: usize| inners[i].clone(), 1)
      .subscribe_complete(|_| {}, move || c.set(true));

    let outer_observer = outer_emitters.borrow()[0].clone();
    outer_observer.next(0);
    outer_observer.next(1);
    // The outer completes while its second value is still buffered, before
    // that value's inner source has even started.
    outer_observer.complete();
    assert!(!completed.get());
    assert_eq!(inner_emitters.borrow().len(), 1);

    inner_emitters.borrow()[0].clone().complete();
    assert!(!completed.get(), "the dequeued inner is still active");
    assert_eq!(inner_emitters.borrow().len(), 2);

    inner_emitters.borrow()[1].clone().complete();
    assert!(completed.get());
  }

  #[test]
  fn merge_all_flattens_iterable_inners() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    observable::from_iter::<_, String>(vec![
      observable::from_iter(vec![1, 2]),
      observable::from_iter(vec![3, 4]),
    ])
    .merge_all(usize::MAX)
    .subscribe(move |v| s.borrow_mut().push(v));

    assert_eq!(*seen.borrow(), vec![1, 2, 3, 4]);
  }

  #[test]
  fn concat_all_preserves_source_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    observable::from_iter::<_, String>(vec![
      observable::from_iter(vec![1, 2]),
      observable::from_iter(vec![3, 4]),
    ])
    .concat_all()
    .subscribe(move |v| s.borrow_mut().push(v));

    assert_eq!(*seen.borrow(), vec![1, 2, 3, 4]);
  }

  #[test]
  fn result_selector_sees_both_values_and_indices() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    observable::from_iter::<_, String>(vec![10, 20])
      .merge_map_with(
        |v, _| observable::from_iter(vec![*v + 1, *v + 2]),
        |outer, inner, oi, ii| format!("{outer}:{inner}@{oi}.{ii}"),
        usize::MAX,
      )
      .subscribe(move |v| s.borrow_mut().push(v));

    assert_eq!(
      *seen.borrow(),
      vec!["10:11@0.0", "10:12@0.1", "20:21@1.0", "20:22@1.1"]
    );
  }

  #[test]
  fn selector_panic_terminates_the_coordinator() {
    let inner_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let inner = remote_controlled(&inner_emitters);
    let errors = Rc::new(RefCell::new(Vec::new()));
    let e = errors.clone();

    observable::of::<_, String>(1)
      .merge_map_with(
        move |_, _| inner.clone(),
        |_, inner: i32, _, _| -> i32 {
          if inner == 2 {
            panic!("selector refused")
          } else {
            inner
          }
        },
        usize::MAX,
      )
      .subscribe_err(|_| {}, move |err: String| e.borrow_mut().push(err));

    let emitter = inner_emitters.borrow()[0].clone();
    emitter.next(1);
    emitter.next(2);
    assert_eq!(*errors.borrow(), vec!["selector refused".to_owned()]);
    assert!(emitter.is_closed(), "the failing coordinator cancelled its inner");
  }

  #[test]
  fn inner_error_cancels_everything() {
    let inner_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let inners =
      vec![remote_controlled(&inner_emitters), remote_controlled(&inner_emitters)];
    let outer_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let outer = remote_controlled(&outer_emitters);

    let errors = Rc::new(RefCell::new(Vec::new()));
    let e = errors.clone();
    outer
      .merge_map(move |_, i: usize| inners[i].clone(), usize::MAX)
      .subscribe_err(|_| {}, move |err: String| e.borrow_mut().push(err));

    let outer_observer = outer_emitters.borrow()[0].clone();
    outer_observer.next(0);
    outer_observer.next(1);

    inner_emitters.borrow()[0].clone().error("inner died".to_owned());
    assert_eq!(*errors.borrow(), vec!["inner died".to_owned()]);
    assert!(outer_observer.is_closed());
    assert!(inner_emitters.borrow()[1].is_closed(), "sibling inner was cancelled");
  }

  #[test]
  fn unsubscribe_cascades_into_outer_and_inners() {
    let inner_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let inner = remote_controlled(&inner_emitters);
    let outer_emitters: Emitters = Rc::new(RefCell::new(Vec::new()));
    let outer = remote_controlled(&outer_emitters);

    let sub = outer
      .merge_map(move |_, _| inner.clone(), usize::MAX)
      .subscribe(|_| {});

    let outer_observer = outer_emitters.borrow()[0].clone();
    outer_observer.next(0);
    assert_eq!(inner_emitters.borrow().len(), 1);

    sub.unsubscribe();
    assert!(outer_observer.is_closed());
    assert!(inner_emitters.borrow()[0].is_closed());
  }

  #[test]
  fn synchronous_inners_complete_synchronously() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    observable::from_iter::<_, String>(vec![2, 3])
      .merge_map(|v, _| observable::from_iter(0..*v), usize::MAX)
      .subscribe_complete(
        move |v| n.borrow_mut().push(format!("next {v}")),
        move || c.borrow_mut().push("complete".to_owned()),
      );
    assert_eq!(
      *log.borrow(),
      vec!["next 0", "next 1", "next 0", "next 1", "next 2", "complete"]
    );
  }
}
