//! Lock state: the one record The Ruler persists.
//!
//! # Module Structure
//!
//! - [`types`]: [`LockState`], its on-disk [`StateRecord`] and the derived [`LockPhase`]
//! - [`machine`]: pure tick/unlock transitions
//! - [`store`]: JSON file persistence (`timelock_state.json`)
//!
//! # Invariants
//!
//! - `is_locked => lock_triggered` once the trigger logic has run. Records
//!   loaded from disk are repaired with [`machine::repair`].
//! - Only the agent actor mutates a live `LockState`; it saves after every
//!   change.

pub mod machine;
mod store;
pub(crate) mod types;

pub use machine::{evaluate, repair, unlock, Evaluation};
pub use store::StateStore;
pub use types::{LockPhase, LockState, StateRecord, Transition, UnlockOutcome};
