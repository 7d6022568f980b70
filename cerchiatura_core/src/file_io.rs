//! # File I/O
//!
//! JSON persistence shared by the request loader and the custom-materials
//! store. Saves go through a sibling `.tmp` file that is fsynced and renamed
//! over the target, so a crash never leaves a half-written store. Writers to
//! the store also hold a [`FileLock`]: an fs2 exclusive lock on a sibling
//! `.lock` file that records who holds it.
//!
//! ```rust,no_run
//! use cerchiatura_core::file_io::{save_json, FileLock};
//! use std::path::Path;
//!
//! let store = Path::new("custom_materials.json");
//! let _guard = FileLock::acquire(store, "anna")?;
//! save_json(&serde_json::json!({"version": "0.1.0", "materials": {}}), store)?;
//! # Ok::<(), cerchiatura_core::errors::CalcError>(())
//! ```

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// A lock older than this is taken over regardless of its holder
const LOCK_MAX_AGE_HOURS: i64 = 24;

// ============================================================================
// Locking
// ============================================================================

/// Contents of a `.lock` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockHolder {
    pub user: String,
    pub host: String,
    pub pid: u32,
    pub since: DateTime<Utc>,
}

impl LockHolder {
    fn current(user: String) -> Self {
        LockHolder {
            user,
            host: host_name(),
            pid: std::process::id(),
            since: Utc::now(),
        }
    }

    /// Abandoned: older than a day, or its process is gone on this host
    fn is_stale(&self) -> bool {
        if Utc::now() - self.since > Duration::hours(LOCK_MAX_AGE_HOURS) {
            return true;
        }
        self.host == host_name() && !process_alive(self.pid)
    }

    fn describe(&self) -> String {
        format!("{}@{} (pid {})", self.user, self.host, self.pid)
    }
}

fn host_name() -> String {
    ["HOSTNAME", "COMPUTERNAME", "HOST"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    std::process::Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(true)
}

#[cfg(not(any(unix, windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive write access to a JSON file. Dropping the guard deletes the
/// `.lock` file and releases the OS lock.
#[derive(Debug)]
pub struct FileLock {
    target: PathBuf,
    lock_path: PathBuf,
    holder: LockHolder,
    _handle: File,
}

impl FileLock {
    /// Take the lock on `path` for `user`.
    ///
    /// A live lock held by someone else gives [`CalcError::FileLocked`]; a
    /// stale one is overwritten.
    pub fn acquire(path: &Path, user: impl Into<String>) -> CalcResult<Self> {
        let target = path.display().to_string();
        if let Some(other) = Self::check(path) {
            return Err(CalcError::file_locked(target, other.describe(), other.since.to_rfc3339()));
        }

        let lock_path = sibling_path(path, "lock");
        let io_err = |action: &str, e: std::io::Error| {
            CalcError::file_error(action, lock_path.display().to_string(), e.to_string())
        };

        // Truncate only once the OS lock is ours, never under a live holder
        let mut handle = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| io_err("create lock", e))?;
        handle
            .try_lock_exclusive()
            .map_err(|_| CalcError::file_locked(target.clone(), "another process", "now"))?;
        handle.set_len(0).map_err(|e| io_err("reset lock", e))?;

        let holder = LockHolder::current(user.into());
        let body = serde_json::to_vec_pretty(&holder).map_err(CalcError::serialization)?;
        handle
            .write_all(&body)
            .and_then(|_| handle.sync_all())
            .map_err(|e| io_err("write lock", e))?;

        log::debug!("{} locked by {}", target, holder.describe());
        Ok(FileLock {
            target: path.to_path_buf(),
            lock_path,
            holder,
            _handle: handle,
        })
    }

    /// Holder of a live lock on `path`. Unreadable or stale locks count as free.
    pub fn check(path: &Path) -> Option<LockHolder> {
        let body = fs::read_to_string(sibling_path(path, "lock")).ok()?;
        serde_json::from_str::<LockHolder>(&body)
            .ok()
            .filter(|holder| !holder.is_stale())
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn holder(&self) -> &LockHolder {
        &self.holder
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock_path) {
            log::warn!("Could not remove {}: {}", self.lock_path.display(), e);
        }
    }
}

/// `store.json` -> `store.json.<suffix>`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

// ============================================================================
// Atomic JSON save / load
// ============================================================================

/// Write `value` as pretty JSON, replacing `path` only once the new content
/// is on disk. Parent directories are created as needed.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> CalcResult<()> {
    let body = serde_json::to_vec_pretty(value).map_err(CalcError::serialization)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|e| CalcError::file_error("create directory", dir.display().to_string(), e.to_string()))?;
    }

    let tmp = sibling_path(path, "tmp");
    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(&body)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(CalcError::file_error("write", tmp.display().to_string(), e.to_string()));
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(CalcError::file_error("replace", path.display().to_string(), e.to_string()));
    }

    log::debug!("Saved {} ({} bytes)", path.display(), body.len());
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> CalcResult<T> {
    let body = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| CalcError::serialization(format!("{}: {}", path.display(), e)))
}

/// Check a file's schema version against the version this build writes.
///
/// The major version must match. While the schema is 0.x a file with a newer
/// minor version is rejected as well.
pub fn validate_version(file_version: &str, expected: &str) -> CalcResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.trim().parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(expected);

    let mismatch = || CalcError::version_mismatch(file_version, expected);

    if file_parts.is_empty() || current_parts.is_empty() || file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}
