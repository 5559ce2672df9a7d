use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::clock::is_weekday;
use crate::config::LockSchedule;

/// The two flags that make up the lock state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockState {
    /// The prompt is (or should be) on screen.
    pub is_locked: bool,
    /// The lock already fired for the current window.
    pub lock_triggered: bool,
}

impl LockState {
    pub const UNLOCKED: LockState = LockState {
        is_locked: false,
        lock_triggered: false,
    };

    pub const LOCKED: LockState = LockState {
        is_locked: true,
        lock_triggered: true,
    };

    pub fn new(is_locked: bool, lock_triggered: bool) -> Self {
        Self {
            is_locked,
            lock_triggered,
        }
    }

    pub fn phase(&self, now: NaiveDateTime, schedule: &LockSchedule) -> LockPhase {
        LockPhase::classify(self, now, schedule)
    }
}

/// On-disk form of [`LockState`].
///
/// `last_updated` is written for humans and never read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub lock_triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl StateRecord {
    pub fn new(state: LockState, last_updated: String) -> Self {
        Self {
            is_locked: state.is_locked,
            lock_triggered: state.lock_triggered,
            last_updated: Some(last_updated),
        }
    }

    pub fn state(&self) -> LockState {
        LockState::new(self.is_locked, self.lock_triggered)
    }
}

/// Where a record sits in the lock lifecycle at a given moment.
///
/// ```text
///            lock minute (weekday)
///   Armed ─────────────────────────▶ Locked
///     ▲                                 │ correct password
///     │ next day                        ▼
///   UnlockedIdle ◀──────────────── (unlocked)
///     ▲
///     │ lock time passed
///   TriggeredCooldown
/// ```
///
/// Weekends force `UnlockedIdle` from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPhase {
    UnlockedIdle,
    Armed,
    Locked,
    TriggeredCooldown,
}

impl LockPhase {
    pub fn classify(state: &LockState, now: NaiveDateTime, schedule: &LockSchedule) -> Self {
        if !is_weekday(now) {
            return LockPhase::UnlockedIdle;
        }
        if state.is_locked {
            return LockPhase::Locked;
        }
        if state.lock_triggered {
            return LockPhase::TriggeredCooldown;
        }
        if schedule.has_passed(now) {
            LockPhase::UnlockedIdle
        } else {
            LockPhase::Armed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LockPhase::UnlockedIdle => "unlocked_idle",
            LockPhase::Armed => "armed",
            LockPhase::Locked => "locked",
            LockPhase::TriggeredCooldown => "triggered_cooldown",
        }
    }
}

impl std::fmt::Display for LockPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a tick evaluation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Lock minute reached while armed.
    Triggered,
    /// Lock time passed; the trigger flag was cleared for the next window.
    CooldownCleared,
    /// Weekend; both flags cleared.
    WeekendReset,
    Idle,
}

/// Result of checking a password attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Accepted,
    Rejected,
    /// Nothing to unlock.
    NotLocked,
    /// The agent went away before answering.
    Closed,
}
