//! Process inspection helpers for the killer.
//!
//! Agent processes are recognised by name or command line. This is a
//! heuristic: anything launched as `ruler-agent` matches, whoever started it.

use std::path::Path;
use sysinfo::{Pid, ProcessRefreshKind, System, ThreadKind, UpdateKind};

use crate::error::Result;

/// Binary name of the lock agent.
pub const AGENT_PROCESS_NAME: &str = "ruler-agent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cmdline: Vec<String>,
}

pub trait ProcessTable {
    fn list(&self) -> Result<Vec<ProcessInfo>>;

    /// Kills `pid`. Returns false if the process was gone or refused the signal.
    fn terminate(&self, pid: u32) -> Result<bool>;
}

pub struct SystemProcessTable;

impl ProcessTable for SystemProcessTable {
    fn list(&self) -> Result<Vec<ProcessInfo>> {
        let mut sys = System::new();
        sys.refresh_processes_specifics(ProcessRefreshKind::new().with_cmd(UpdateKind::Always));

        // On Linux every userland thread is listed with the parent's command line.
        Ok(sys
            .processes()
            .iter()
            .filter(|(_, process)| process.thread_kind() != Some(ThreadKind::Userland))
            .map(|(pid, process)| ProcessInfo {
                pid: pid.as_u32(),
                name: process.name().to_string(),
                cmdline: process.cmd().to_vec(),
            })
            .collect())
    }

    fn terminate(&self, pid: u32) -> Result<bool> {
        let mut sys = System::new();
        let sys_pid = Pid::from_u32(pid);
        if !sys.refresh_process_specifics(sys_pid, ProcessRefreshKind::new()) {
            return Ok(false);
        }
        Ok(sys.process(sys_pid).map(|process| process.kill()).unwrap_or(false))
    }
}

/// True when `info` looks like a running lock agent.
pub fn is_agent_process(info: &ProcessInfo) -> bool {
    if matches_agent_name(&info.name) {
        return true;
    }
    info.cmdline.iter().any(|arg| {
        Path::new(arg)
            .file_name()
            .and_then(|name| name.to_str())
            .map(matches_agent_name)
            .unwrap_or(false)
    })
}

fn matches_agent_name(name: &str) -> bool {
    let name = name.strip_suffix(".exe").unwrap_or(name);
    name == AGENT_PROCESS_NAME
}

/// Agent processes other than the caller.
pub fn find_agent_processes(table: &dyn ProcessTable) -> Result<Vec<ProcessInfo>> {
    let own_pid = std::process::id();
    Ok(table
        .list()?
        .into_iter()
        .filter(|info| info.pid != own_pid && is_agent_process(info))
        .collect())
}
