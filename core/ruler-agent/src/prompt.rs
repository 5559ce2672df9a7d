//! Terminal rendition of the lock prompt.
//!
//! One reader thread owns stdin for the life of the prompt. It sends each
//! line to whatever session is current, so a line typed after a re-show goes
//! to the new session instead of being lost to an old reader. Lines read with
//! no session open are discarded. Each `show` also starts a keep-on-top loop
//! that re-asserts the window title until `dismiss`.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use ruler_core::agent::{Prompt, UnlockHandle};
use ruler_core::state::UnlockOutcome;
use ruler_core::{Result, RulerError};

const LOCK_TITLE: &str = "Computer Locked";

type Session = Arc<Mutex<Option<UnlockHandle>>>;

pub struct TerminalPrompt {
    keep_on_top_interval: Duration,
    session: Session,
    reader_started: bool,
    raising: Option<Arc<AtomicBool>>,
}

impl TerminalPrompt {
    pub fn new(keep_on_top_interval: Duration) -> Self {
        Self {
            keep_on_top_interval,
            session: Arc::new(Mutex::new(None)),
            reader_started: false,
            raising: None,
        }
    }

    fn start_reader(&mut self) -> Result<()> {
        if self.reader_started {
            return Ok(());
        }
        let session = Arc::clone(&self.session);
        thread::Builder::new()
            .name("ruler-prompt".into())
            .spawn(move || forward_attempts(io::stdin().lock(), io::stdout(), &session))
            .map_err(|err| RulerError::PromptUnavailable(err.to_string()))?;
        self.reader_started = true;
        Ok(())
    }
}

impl Prompt for TerminalPrompt {
    fn show(&mut self, unlock: UnlockHandle) -> Result<()> {
        self.dismiss();

        draw_lock_screen(&mut io::stdout().lock())
            .map_err(|err| RulerError::PromptUnavailable(err.to_string()))?;
        self.start_reader()?;
        replace_session(&self.session, Some(unlock));

        let raising = Arc::new(AtomicBool::new(true));
        let loop_flag = Arc::clone(&raising);
        let interval = self.keep_on_top_interval;
        let spawned = thread::Builder::new()
            .name("ruler-keep-on-top".into())
            .spawn(move || keep_on_top(loop_flag, interval));
        if let Err(err) = spawned {
            tracing::warn!(error = %err, "Failed to start keep-on-top loop");
        }

        self.raising = Some(raising);
        Ok(())
    }

    fn dismiss(&mut self) {
        if let Some(raising) = self.raising.take() {
            raising.store(false, Ordering::SeqCst);
        }
        if replace_session(&self.session, None).is_some() {
            println!("\nUnlocked.");
        }
    }
}

fn replace_session(
    session: &Mutex<Option<UnlockHandle>>,
    next: Option<UnlockHandle>,
) -> Option<UnlockHandle> {
    let mut current = session.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *current, next)
}

fn current_session(session: &Mutex<Option<UnlockHandle>>) -> Option<UnlockHandle> {
    session.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn draw_lock_screen<W: Write>(out: &mut W) -> io::Result<()> {
    // Clear screen, cursor home.
    write!(out, "\x1b[2J\x1b[H")?;
    writeln!(out, "{}", LOCK_TITLE)?;
    write!(out, "Enter password to unlock: ")?;
    out.flush()
}

/// Reads lines from `input` until it ends and submits each one to the
/// current session. A rejected attempt redraws the prompt on `output`.
fn forward_attempts<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    session: &Mutex<Option<UnlockHandle>>,
) {
    let mut line = String::new();

    loop {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => {
                tracing::warn!("Prompt input closed; waiting for the agent to unlock");
                return;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(error = %err, "Failed to read password input");
                return;
            }
        }

        let Some(unlock) = current_session(session) else {
            tracing::debug!("Ignoring input while unlocked");
            continue;
        };

        let attempt = line.trim_end_matches(&['\r', '\n'][..]);
        match unlock.attempt(attempt) {
            UnlockOutcome::Rejected => {
                if let Err(err) = draw_lock_screen(&mut output) {
                    tracing::warn!(error = %err, "Failed to redraw lock screen");
                }
            }
            UnlockOutcome::Closed => return,
            UnlockOutcome::Accepted | UnlockOutcome::NotLocked => {}
        }
    }
}

fn keep_on_top(active: Arc<AtomicBool>, interval: Duration) {
    while active.load(Ordering::SeqCst) {
        if raise().is_err() {
            break;
        }
        thread::sleep(interval);
    }
}

/// Re-asserts the terminal window title.
fn raise() -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "\x1b]0;{}\x07", LOCK_TITLE)?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruler_core::agent::AgentEvent;
    use std::io::Cursor;
    use std::sync::mpsc;
    use std::thread::JoinHandle;

    const PASSWORD: &str = "youaskedforit";

    /// Answers attempts the way the agent would and records them.
    /// `on_accept` runs before the reply, like the agent's own dismissal.
    fn answering_agent(
        mut on_accept: impl FnMut() + Send + 'static,
    ) -> (UnlockHandle, JoinHandle<Vec<String>>) {
        let (events, receiver) = mpsc::channel();
        let worker = thread::spawn(move || {
            let mut seen = Vec::new();
            for event in receiver {
                if let AgentEvent::UnlockAttempt { attempt, reply } = event {
                    let outcome = if attempt == PASSWORD {
                        on_accept();
                        UnlockOutcome::Accepted
                    } else {
                        UnlockOutcome::Rejected
                    };
                    seen.push(attempt);
                    let _ = reply.send(outcome);
                }
            }
            seen
        });
        (UnlockHandle::new(events), worker)
    }

    fn prompt_count(output: &[u8]) -> usize {
        String::from_utf8_lossy(output)
            .matches("Enter password to unlock: ")
            .count()
    }

    #[test]
    fn rejected_attempt_redraws_the_prompt() {
        let (unlock, agent) = answering_agent(|| {});
        let session: Session = Arc::new(Mutex::new(Some(unlock)));
        let mut output = Vec::new();

        forward_attempts(
            Cursor::new("wrong\r\nyouaskedforit\n"),
            &mut output,
            &session,
        );
        drop(session);

        assert_eq!(prompt_count(&output), 1);
        assert_eq!(agent.join().expect("agent thread"), vec!["wrong", PASSWORD]);
    }

    #[test]
    fn input_after_a_reshow_reaches_the_new_session() {
        let session: Session = Arc::new(Mutex::new(None));
        let (second, second_agent) = answering_agent(|| {});

        // Accepting the first session dismisses it and locks again at once.
        let swap = Arc::clone(&session);
        let mut next = Some(second);
        let (first, first_agent) = answering_agent(move || {
            replace_session(&swap, None);
            replace_session(&swap, next.take());
        });
        replace_session(&session, Some(first));

        let mut output = Vec::new();
        forward_attempts(
            Cursor::new("youaskedforit\nagain\n"),
            &mut output,
            &session,
        );

        assert_eq!(first_agent.join().expect("first agent"), vec![PASSWORD]);
        drop(session);
        assert_eq!(second_agent.join().expect("second agent"), vec!["again"]);
        assert_eq!(prompt_count(&output), 1);
    }

    #[test]
    fn input_without_a_session_is_ignored() {
        let session: Session = Arc::new(Mutex::new(None));
        let mut output = Vec::new();

        forward_attempts(Cursor::new("stray\n"), &mut output, &session);

        assert!(output.is_empty());
    }

    #[test]
    fn dismiss_ends_the_session() {
        let mut prompt = TerminalPrompt::new(Duration::from_millis(500));
        let (events, _receiver) = mpsc::channel();
        let raising = Arc::new(AtomicBool::new(true));
        replace_session(&prompt.session, Some(UnlockHandle::new(events)));
        prompt.raising = Some(Arc::clone(&raising));

        prompt.dismiss();

        assert!(!raising.load(Ordering::SeqCst));
        assert!(prompt.raising.is_none());
        assert!(current_session(&prompt.session).is_none());
    }

    #[test]
    fn dismiss_without_session_is_a_no_op() {
        let mut prompt = TerminalPrompt::new(Duration::from_millis(500));
        prompt.dismiss();
        assert!(prompt.raising.is_none());
        assert!(current_session(&prompt.session).is_none());
    }
}
