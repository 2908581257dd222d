//! Operators: observables derived from observables.
//!
//! Every operator builds a new [`crate::observable::Observable`] whose
//! subscriber wraps a subscribe call on the source, so termination,
//! containment and cancellation all flow through the subscription core. The
//! flattening family (`merge_map`, `merge_all`, `concat_map`, `concat_all`,
//! `expand`) shares the coordinator in [`flatten`].

pub mod catch_error;
pub mod concat;
pub mod default_if_empty;
pub mod expand;
pub mod filter;
pub mod flatten;
pub mod map;
pub mod materialize;
pub mod reduce;
pub mod tap;
pub mod to_vec;
