//! ruler-core: shared logic for The Ruler.
//!
//! The Ruler locks the desktop behind a password prompt at a fixed minute on
//! weekdays. Two binaries build on this crate:
//!
//! - `ruler-agent`: long-running process that owns the lock state machine
//! - `ruler-killer`: one-shot command that ends the agent and clears its state
//!
//! The two never talk directly. They share the state file on disk and the OS
//! process table.
//!
//! ```text
//! Ticker ──Tick──▶ LockAgent (single writer) ──save──▶ timelock_state.json
//!                    ▲        │                              │
//!   Prompt ──UnlockAttempt    └──show/dismiss──▶ Prompt      │
//!                                                            ▼
//!                              ruler-killer ──kill + remove──┘
//! ```
//!
//! # Module Structure
//!
//! - [`state`]: record types, the pure transition functions and the JSON store
//! - [`agent`]: the actor that applies transitions and drives the prompt
//! - [`config`]: TOML configuration (password, lock time, intervals)
//! - [`guard`]: single-instance lock for the agent
//! - [`process`]: process listing and termination
//! - [`terminator`]: the kill-and-clean operation behind `ruler-killer`

pub mod agent;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod logging;
pub mod paths;
pub mod process;
pub mod state;
pub mod terminator;

pub use agent::{AgentEvent, LockAgent, Prompt, UnlockHandle};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{LockSchedule, RulerConfig};
pub use error::{Result, RulerError};
pub use guard::InstanceGuard;
pub use state::{LockPhase, LockState, StateStore, Transition, UnlockOutcome};
