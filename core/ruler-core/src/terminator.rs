//! Kill-and-clean operation behind `ruler-killer`.

use crate::error::{Result, RulerError};
use crate::process::{find_agent_processes, ProcessTable};
use crate::state::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillReport {
    pub killed: usize,
    pub state_removed: bool,
}

/// Checks `attempt` against `password`, kills every agent process and
/// deletes the state file.
///
/// A wrong password touches nothing. Processes that vanish or refuse the
/// kill are logged and skipped.
pub fn terminate_agents(
    password: &str,
    attempt: &str,
    table: &dyn ProcessTable,
    store: &StateStore,
) -> Result<KillReport> {
    if attempt != password {
        tracing::warn!("Kill attempt with incorrect password");
        return Err(RulerError::IncorrectPassword);
    }

    let mut killed = 0;
    for process in find_agent_processes(table)? {
        match table.terminate(process.pid) {
            Ok(true) => {
                killed += 1;
                tracing::info!(pid = process.pid, name = %process.name, "Killed agent process");
            }
            Ok(false) => {
                tracing::debug!(pid = process.pid, "Agent process already gone");
            }
            Err(err) => {
                tracing::warn!(error = %err, pid = process.pid, "Failed to kill agent process");
            }
        }
    }

    let state_removed = store.remove()?;
    if state_removed {
        tracing::info!(path = %store.path().display(), "Removed state file");
    }
    tracing::info!(killed, "Terminator finished");

    Ok(KillReport {
        killed,
        state_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessInfo;
    use crate::state::LockState;
    use std::cell::RefCell;

    const PASSWORD: &str = "youaskedforit";

    struct FakeTable {
        processes: Vec<ProcessInfo>,
        killed: RefCell<Vec<u32>>,
        refuse: Vec<u32>,
    }

    impl FakeTable {
        fn new(processes: Vec<ProcessInfo>) -> Self {
            Self {
                processes,
                killed: RefCell::new(Vec::new()),
                refuse: Vec::new(),
            }
        }
    }

    impl ProcessTable for FakeTable {
        fn list(&self) -> Result<Vec<ProcessInfo>> {
            Ok(self.processes.clone())
        }

        fn terminate(&self, pid: u32) -> Result<bool> {
            if self.refuse.contains(&pid) {
                return Err(RulerError::io(
                    "kill",
                    std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                ));
            }
            self.killed.borrow_mut().push(pid);
            Ok(true)
        }
    }

    fn agent(pid: u32) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: "ruler-agent".into(),
            cmdline: vec!["ruler-agent".into()],
        }
    }

    fn other(pid: u32) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: "bash".into(),
            cmdline: vec!["bash".into()],
        }
    }

    fn pid(offset: u32) -> u32 {
        std::process::id().wrapping_add(offset)
    }

    fn locked_store(dir: &std::path::Path) -> StateStore {
        let store = StateStore::new(dir.join("timelock_state.json"));
        store
            .save(&LockState::LOCKED, "2024-01-03T19:55:00.000000".into())
            .expect("save");
        store
    }

    #[test]
    fn wrong_password_touches_nothing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let store = locked_store(temp_dir.path());
        let table = FakeTable::new(vec![agent(pid(1))]);

        let err = terminate_agents(PASSWORD, "guess", &table, &store).expect_err("wrong password");
        assert!(matches!(err, RulerError::IncorrectPassword));
        assert!(table.killed.borrow().is_empty());
        assert!(store.path().exists());
    }

    #[test]
    fn correct_password_kills_agents_and_removes_state() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let store = locked_store(temp_dir.path());
        let table = FakeTable::new(vec![agent(pid(1)), other(pid(2)), agent(pid(3))]);

        let report = terminate_agents(PASSWORD, PASSWORD, &table, &store).expect("terminate");
        assert_eq!(
            report,
            KillReport {
                killed: 2,
                state_removed: true
            }
        );
        assert_eq!(*table.killed.borrow(), vec![pid(1), pid(3)]);
        assert!(!store.path().exists());
    }

    #[test]
    fn kill_failures_are_skipped() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let store = locked_store(temp_dir.path());
        let mut table = FakeTable::new(vec![agent(pid(1)), agent(pid(2))]);
        table.refuse = vec![pid(1)];

        let report = terminate_agents(PASSWORD, PASSWORD, &table, &store).expect("terminate");
        assert_eq!(report.killed, 1);
        assert!(report.state_removed);
    }

    #[test]
    fn no_agent_and_no_state_is_still_success() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let store = StateStore::new(temp_dir.path().join("timelock_state.json"));
        let table = FakeTable::new(vec![other(pid(1))]);

        let report = terminate_agents(PASSWORD, PASSWORD, &table, &store).expect("terminate");
        assert_eq!(
            report,
            KillReport {
                killed: 0,
                state_removed: false
            }
        );
    }
}
