//! Single-invocation orchestration: read the file, plan edits, back up,
//! write atomically, report
//!
//! Each call is independent and owns its state for the duration of the
//! invocation; nothing is cached between runs. The write path goes through
//! a temp file in the target's directory followed by a rename, so a failure
//! at any step leaves the original file byte-identical to what was read.

use crate::document::ConfigDocument;
use crate::error::{PwqError, Result};
use crate::reconcile::{self, Change, DesiredState};
use crate::types::{Param, Value};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Standard location of the pam_pwquality configuration
pub const DEFAULT_CONF_PATH: &str = "/etc/security/pwquality.conf";

/// One reconciliation request against a configuration file
#[derive(Debug, Clone)]
pub struct PolicyRequest {
    /// Target file
    pub path: PathBuf,
    /// Requested parameter states
    pub desired: DesiredState,
    /// Copy the pre-edit file to a timestamped sibling before writing
    pub backup: bool,
    /// Plan and report without writing anything
    pub check_mode: bool,
}

impl PolicyRequest {
    /// Request against the standard path, with backup and check mode off
    pub fn new(desired: DesiredState) -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONF_PATH),
            desired,
            backup: false,
            check_mode: false,
        }
    }
}

/// Result of one reconciliation run
#[derive(Debug, Clone, Serialize)]
pub struct PolicyOutcome {
    /// True if the file content changed, or would change in check mode
    pub changed: bool,
    /// The edits that were (or would be) applied, in application order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
    /// Effective parameter set after the run (after the hypothetical run,
    /// in check mode)
    pub params: BTreeMap<Param, Value>,
    /// Where the backup copy landed, when one was requested and succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_file: Option<PathBuf>,
    /// Why the backup copy failed, when it did. The main write still
    /// happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_warning: Option<String>,
}

/// Reconcile the file at `req.path` with `req.desired`.
///
/// # Errors
/// Returns an IO error if the file cannot be read or atomically replaced.
/// Backup failure is reported on the outcome instead of failing the run.
pub fn apply_policy(req: &PolicyRequest) -> Result<PolicyOutcome> {
    run_policy(req, Local::now())
}

/// Read-only view of the current effective parameter set at `path`
///
/// # Errors
/// Returns an IO error if the file cannot be read.
pub fn show(path: &Path) -> Result<BTreeMap<Param, Value>> {
    let text = read_config(path)?;
    Ok(ConfigDocument::parse(&text).effective())
}

/// [`apply_policy`] with the clock supplied, so tests can pin the backup
/// file name
fn run_policy(req: &PolicyRequest, now: DateTime<Local>) -> Result<PolicyOutcome> {
    let text = read_config(&req.path)?;
    let doc = ConfigDocument::parse(&text);
    debug!("loaded {} ({} bytes)", req.path.display(), text.len());

    let report = reconcile::diff(&doc, &req.desired);
    if report.is_empty() {
        debug!("{} already satisfies the request", req.path.display());
        return Ok(PolicyOutcome {
            changed: false,
            changes: Vec::new(),
            params: doc.effective(),
            backup_file: None,
            backup_warning: None,
        });
    }

    let next = reconcile::apply(&doc, &report);
    if req.check_mode {
        info!(
            "check mode: {} change(s) planned for {}, nothing written",
            report.len(),
            req.path.display()
        );
        return Ok(PolicyOutcome {
            changed: true,
            changes: report.changes,
            params: next.effective(),
            backup_file: None,
            backup_warning: None,
        });
    }

    let mut backup_file = None;
    let mut backup_warning = None;
    if req.backup {
        match create_backup(&req.path, now) {
            Ok(dest) => {
                debug!("backed up {} to {}", req.path.display(), dest.display());
                backup_file = Some(dest);
            }
            Err(err) => {
                warn!("backup of {} failed: {err}", req.path.display());
                backup_warning = Some(err.to_string());
            }
        }
    }

    write_atomic(&req.path, &next.render())?;
    info!("updated {} ({} change(s))", req.path.display(), report.len());

    Ok(PolicyOutcome {
        changed: true,
        changes: report.changes,
        params: next.effective(),
        backup_file,
        backup_warning,
    })
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| PwqError::io(path, e))
}

/// Sibling path carrying a timestamp suffix, e.g.
/// `pwquality.conf.2025-03-14@09:26:53~`
fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}", now.format("%Y-%m-%d@%H:%M:%S~")));
    PathBuf::from(name)
}

fn create_backup(path: &Path, now: DateTime<Local>) -> Result<PathBuf> {
    let dest = backup_path(path, now);
    fs::copy(path, &dest).map_err(|e| PwqError::io(&dest, e))?;
    Ok(dest)
}

/// Replace `path` with `content` via a temp file in the same directory and
/// a rename, carrying over the original permission bits. The original file
/// stays intact unless the rename itself succeeds.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PwqError::io(path, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| PwqError::io(path, e))?;
    let perms = fs::metadata(path)
        .map_err(|e| PwqError::io(path, e))?
        .permissions();
    fs::set_permissions(tmp.path(), perms).map_err(|e| PwqError::io(path, e))?;
    tmp.persist(path).map_err(|e| PwqError::io(path, e.error))?;
    Ok(())
}
