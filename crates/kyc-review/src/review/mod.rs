//! Review Engine — applies an administrator's decision to one document.
//!
//! A decision moves a record out of `pending` exactly once. Deciding on a
//! record that is already approved or rejected is a conflict, never an
//! overwrite.

pub mod engine;
pub mod types;

pub use engine::ReviewEngine;
pub use types::{Decision, ReviewOutcome, ReviewTransition};
