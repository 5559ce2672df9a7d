//! Pure transition functions for the lock state.
//!
//! Nothing here touches the disk or the screen. The agent applies the
//! returned state and performs the side effects.

use chrono::NaiveDateTime;

use crate::clock::is_weekday;
use crate::config::LockSchedule;

use super::types::{LockState, Transition, UnlockOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub state: LockState,
    pub transition: Transition,
}

impl Evaluation {
    fn idle(state: LockState) -> Self {
        Self {
            state,
            transition: Transition::Idle,
        }
    }
}

/// One poll of the state machine.
///
/// The trigger needs the clock to read exactly the lock minute. If no poll
/// lands inside that minute the day is skipped.
pub fn evaluate(state: &LockState, now: NaiveDateTime, schedule: &LockSchedule) -> Evaluation {
    if !is_weekday(now) {
        if state.is_locked || state.lock_triggered {
            return Evaluation {
                state: LockState::UNLOCKED,
                transition: Transition::WeekendReset,
            };
        }
        return Evaluation::idle(*state);
    }

    if schedule.is_lock_minute(now) && !state.is_locked && !state.lock_triggered {
        return Evaluation {
            state: LockState::LOCKED,
            transition: Transition::Triggered,
        };
    }

    // A locked record keeps its trigger flag until the password clears both.
    if schedule.has_passed(now) && state.lock_triggered && !state.is_locked {
        return Evaluation {
            state: LockState {
                lock_triggered: false,
                ..*state
            },
            transition: Transition::CooldownCleared,
        };
    }

    Evaluation::idle(*state)
}

/// Checks a password attempt. Plain equality; no lockout.
pub fn unlock(state: &LockState, attempt: &str, password: &str) -> (LockState, UnlockOutcome) {
    if !state.is_locked {
        return (*state, UnlockOutcome::NotLocked);
    }
    if attempt == password {
        (LockState::UNLOCKED, UnlockOutcome::Accepted)
    } else {
        (*state, UnlockOutcome::Rejected)
    }
}

/// Restores `is_locked => lock_triggered` on a record loaded from disk.
pub fn repair(state: &LockState) -> LockState {
    if state.is_locked && !state.lock_triggered {
        LockState::LOCKED
    } else {
        *state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PASSWORD: &str = "youaskedforit";

    fn schedule() -> LockSchedule {
        LockSchedule::new(19, 55)
    }

    // 2024-01-01 is a Monday.
    fn day(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .expect("valid time")
    }

    fn all_states() -> [LockState; 4] {
        [
            LockState::new(false, false),
            LockState::new(false, true),
            LockState::new(true, false),
            LockState::new(true, true),
        ]
    }

    #[test]
    fn weekend_always_ends_unlocked() {
        for weekend_day in [6, 7] {
            for (hour, minute) in [(0, 0), (19, 55), (19, 56), (23, 59)] {
                for state in all_states() {
                    let now = day(weekend_day, hour, minute, 0);
                    let result = evaluate(&state, now, &schedule());
                    assert_eq!(result.state, LockState::UNLOCKED);
                    assert_eq!(
                        result.state.phase(now, &schedule()),
                        crate::state::LockPhase::UnlockedIdle
                    );
                    let expected = if state == LockState::UNLOCKED {
                        Transition::Idle
                    } else {
                        Transition::WeekendReset
                    };
                    assert_eq!(result.transition, expected);
                }
            }
        }
    }

    #[test]
    fn lock_minute_triggers_from_armed() {
        let result = evaluate(&LockState::UNLOCKED, day(3, 19, 55, 0), &schedule());
        assert_eq!(result.transition, Transition::Triggered);
        assert_eq!(result.state, LockState::new(true, true));

        let late_in_minute = evaluate(&LockState::UNLOCKED, day(3, 19, 55, 59), &schedule());
        assert_eq!(late_in_minute.transition, Transition::Triggered);
    }

    #[test]
    fn lock_minute_does_not_retrigger() {
        for state in [LockState::LOCKED, LockState::new(false, true)] {
            let result = evaluate(&state, day(3, 19, 55, 5), &schedule());
            assert_eq!(result.transition, Transition::Idle);
            assert_eq!(result.state, state);
        }
    }

    #[test]
    fn missed_minute_is_skipped() {
        let result = evaluate(&LockState::UNLOCKED, day(3, 19, 56, 0), &schedule());
        assert_eq!(result.transition, Transition::Idle);
        assert_eq!(result.state, LockState::UNLOCKED);
    }

    #[test]
    fn cooldown_clears_after_lock_time() {
        let result = evaluate(&LockState::new(false, true), day(3, 19, 56, 0), &schedule());
        assert_eq!(result.transition, Transition::CooldownCleared);
        assert_eq!(result.state, LockState::UNLOCKED);
        assert_eq!(
            result.state.phase(day(4, 9, 0, 0), &schedule()),
            crate::state::LockPhase::Armed
        );
    }

    #[test]
    fn cooldown_holds_before_lock_time() {
        let state = LockState::new(false, true);
        let result = evaluate(&state, day(3, 19, 54, 0), &schedule());
        assert_eq!(result.transition, Transition::Idle);
        assert_eq!(result.state, state);
    }

    #[test]
    fn locked_state_survives_lock_time_passing() {
        let result = evaluate(&LockState::LOCKED, day(3, 22, 0, 0), &schedule());
        assert_eq!(result.transition, Transition::Idle);
        assert_eq!(result.state, LockState::LOCKED);
    }

    #[test]
    fn correct_password_unlocks() {
        let (state, outcome) = unlock(&LockState::LOCKED, PASSWORD, PASSWORD);
        assert_eq!(outcome, UnlockOutcome::Accepted);
        assert_eq!(state, LockState::UNLOCKED);
    }

    #[test]
    fn wrong_password_changes_nothing() {
        for attempt in ["", "YouAskedForIt", "youaskedforit ", "letmein"] {
            let (state, outcome) = unlock(&LockState::LOCKED, attempt, PASSWORD);
            assert_eq!(outcome, UnlockOutcome::Rejected, "attempt {:?}", attempt);
            assert_eq!(state, LockState::LOCKED);
        }
    }

    #[test]
    fn unlock_when_not_locked_is_a_no_op() {
        let state = LockState::new(false, true);
        let (next, outcome) = unlock(&state, PASSWORD, PASSWORD);
        assert_eq!(outcome, UnlockOutcome::NotLocked);
        assert_eq!(next, state);
    }

    #[test]
    fn repair_sets_trigger_on_locked_records_only() {
        assert_eq!(repair(&LockState::new(true, false)), LockState::LOCKED);
        assert_eq!(repair(&LockState::new(false, true)), LockState::new(false, true));
        assert_eq!(repair(&LockState::UNLOCKED), LockState::UNLOCKED);
    }
}
