//! The lock agent: a single-writer actor over [`LockState`].
//!
//! Everything that wants to change the state sends an [`AgentEvent`] down one
//! channel. The ticker sends `Tick`; the prompt sends `UnlockAttempt` through
//! an [`UnlockHandle`] and waits for the answer. The actor thread is the only
//! place the state is mutated and persisted.
//!
//! Store and prompt failures are logged and swallowed. A prompt that failed
//! to show is retried on the next tick while the state says locked.

use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clock::{format_timestamp, Clock};
use crate::config::RulerConfig;
use crate::error::{Result, RulerError};
use crate::state::{machine, LockPhase, LockState, StateStore, Transition, UnlockOutcome};

pub enum AgentEvent {
    Tick,
    UnlockAttempt {
        attempt: String,
        reply: Sender<UnlockOutcome>,
    },
    Shutdown,
}

/// Lets a prompt submit password attempts to the agent.
#[derive(Clone)]
pub struct UnlockHandle {
    events: Sender<AgentEvent>,
}

impl UnlockHandle {
    pub fn new(events: Sender<AgentEvent>) -> Self {
        Self { events }
    }

    /// Sends `attempt` and blocks until the agent answers.
    pub fn attempt(&self, attempt: impl Into<String>) -> UnlockOutcome {
        let (reply, response) = mpsc::channel();
        let event = AgentEvent::UnlockAttempt {
            attempt: attempt.into(),
            reply,
        };
        if self.events.send(event).is_err() {
            return UnlockOutcome::Closed;
        }
        response.recv().unwrap_or(UnlockOutcome::Closed)
    }
}

/// The full-screen password prompt, seen from the agent.
///
/// `show` must not block: the prompt runs on its own thread and reports back
/// through the handle.
pub trait Prompt {
    fn show(&mut self, unlock: UnlockHandle) -> Result<()>;
    fn dismiss(&mut self);
}

pub struct LockAgent<C: Clock, P: Prompt> {
    config: RulerConfig,
    store: StateStore,
    clock: C,
    prompt: P,
    events: Sender<AgentEvent>,
    state: LockState,
    prompt_visible: bool,
}

impl<C: Clock, P: Prompt> LockAgent<C, P> {
    /// Builds the agent and loads the persisted state. `events` must feed the
    /// receiver later passed to [`LockAgent::run`].
    pub fn new(
        config: RulerConfig,
        store: StateStore,
        clock: C,
        prompt: P,
        events: Sender<AgentEvent>,
    ) -> Self {
        let state = store.load();
        tracing::info!(
            lock_time = %config.schedule(),
            is_locked = state.is_locked,
            lock_triggered = state.lock_triggered,
            "Lock agent initialized"
        );
        Self {
            config,
            store,
            clock,
            prompt,
            events,
            state,
            prompt_visible: false,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn phase(&self) -> LockPhase {
        self.state
            .phase(self.clock.now(), &self.config.schedule())
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Startup recovery: repair the loaded record and bring the prompt back
    /// if the last run ended while locked.
    pub fn restore(&mut self) {
        let repaired = machine::repair(&self.state);
        if repaired != self.state {
            tracing::info!("Repaired locked state missing its trigger flag");
            self.commit(repaired);
        }
        if self.state.is_locked {
            tracing::info!("Resuming lock from previous session");
            self.show_prompt();
        }
    }

    /// Runs until `Shutdown`. The agent keeps a sender for its prompt
    /// handles, so the channel never closes on its own.
    pub fn run(mut self, events: Receiver<AgentEvent>) {
        self.restore();
        for event in events {
            if self.handle(event).is_break() {
                break;
            }
        }
        tracing::info!("Lock agent stopped");
    }

    pub fn handle(&mut self, event: AgentEvent) -> ControlFlow<()> {
        match event {
            AgentEvent::Tick => self.tick(),
            AgentEvent::UnlockAttempt { attempt, reply } => {
                let outcome = self.submit(&attempt);
                let _ = reply.send(outcome);
            }
            AgentEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    pub fn tick(&mut self) {
        let now = self.clock.now();
        tracing::debug!(time = %now.format("%H:%M:%S"), "Checking time");

        let evaluation = machine::evaluate(&self.state, now, &self.config.schedule());
        match evaluation.transition {
            Transition::Triggered => {
                tracing::info!("Lock time reached, activating lock");
                self.commit(evaluation.state);
                self.show_prompt();
                return;
            }
            Transition::CooldownCleared => {
                tracing::info!("Lock time has passed, resetting lock trigger");
                self.commit(evaluation.state);
            }
            Transition::WeekendReset => {
                tracing::info!("Weekend detected, unlocking");
                self.commit(evaluation.state);
                self.dismiss_prompt();
            }
            Transition::Idle => {}
        }

        if self.state.is_locked && !self.prompt_visible {
            self.show_prompt();
        }
    }

    /// Checks one password attempt. The prompt clears its own input on
    /// [`UnlockOutcome::Rejected`].
    pub fn submit(&mut self, attempt: &str) -> UnlockOutcome {
        let (next, outcome) = machine::unlock(&self.state, attempt, &self.config.password);
        match outcome {
            UnlockOutcome::Accepted => {
                tracing::info!("Correct password entered, unlocking");
                self.commit(next);
                self.dismiss_prompt();
            }
            UnlockOutcome::Rejected => tracing::info!("Incorrect password attempt"),
            UnlockOutcome::NotLocked => tracing::debug!("Unlock attempt while not locked"),
            UnlockOutcome::Closed => {}
        }
        outcome
    }

    fn commit(&mut self, next: LockState) {
        if next == self.state {
            return;
        }
        self.state = next;
        let stamp = format_timestamp(self.clock.now());
        if let Err(err) = self.store.save(&self.state, stamp) {
            tracing::error!(
                error = %err,
                path = %self.store.path().display(),
                "Error saving state"
            );
        }
    }

    fn show_prompt(&mut self) {
        if self.prompt_visible {
            return;
        }
        match self.prompt.show(UnlockHandle::new(self.events.clone())) {
            Ok(()) => {
                self.prompt_visible = true;
                tracing::info!("Lock screen shown");
            }
            Err(err) => {
                tracing::error!(error = %err, "Error creating lock screen; will retry");
            }
        }
    }

    fn dismiss_prompt(&mut self) {
        if !self.prompt_visible {
            return;
        }
        self.prompt.dismiss();
        self.prompt_visible = false;
    }
}

/// Sends `Tick` every `interval` until the agent hangs up.
pub fn spawn_ticker(events: Sender<AgentEvent>, interval: Duration) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("ruler-ticker".into())
        .spawn(move || loop {
            if events.send(AgentEvent::Tick).is_err() {
                break;
            }
            thread::sleep(interval);
        })
        .map_err(|err| RulerError::io("spawn ticker thread", err))
}
