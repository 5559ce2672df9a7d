//! Single-instance guard for the agent.
//!
//! An exclusive advisory lock on `ruler-agent.lock`. The OS drops the lock
//! when the holder exits, so a crashed agent never blocks the next start.
//! The file body holds the holder's pid for diagnostics only.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, RulerError};

#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
    path: PathBuf,
}

impl InstanceGuard {
    /// Takes the lock at `path`, or fails with [`RulerError::AlreadyRunning`].
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)
                .map_err(|err| RulerError::io("create guard directory", err))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|err| RulerError::io(format!("open guard file {}", path.display()), err))?;

        if file.try_lock_exclusive().is_err() {
            let holder = read_pid(&mut file);
            return Err(RulerError::AlreadyRunning { holder });
        }

        write_pid(&mut file, std::process::id())
            .map_err(|err| RulerError::io("write guard pid", err))?;
        tracing::debug!(path = %path.display(), pid = std::process::id(), "Instance guard acquired");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn acquire_default() -> Result<Self> {
        Self::acquire(&crate::paths::guard_file_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        if let Err(err) = self.file.set_len(0) {
            tracing::warn!(error = %err, "Failed to clear instance guard pid");
        }
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %err, "Failed to release instance guard");
        }
    }
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut content).ok()?;
    content.trim().parse().ok()
}

fn write_pid(file: &mut File, pid: u32) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", pid)?;
    file.flush()
}
