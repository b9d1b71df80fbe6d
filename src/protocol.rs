//! JSON request/response adapter for orchestration callers
//!
//! One JSON document in, one JSON document out. The request carries the
//! parameters to set (`params`), names to remove (`unset`), and the
//! `path`/`backup`/`check_mode` switches; the response reports `changed`,
//! the applied edits, and the resulting parameter set. Failures become a
//! `{"failed": true, "kind": ..., "msg": ...}` document rather than a
//! panic or a half-written reply, so the caller always has exactly one
//! document to parse.
//!
//! This is a thin shell over [`crate::engine::apply_policy`]; the engine
//! never knows which entry point invoked it.

use crate::engine::{self, PolicyOutcome, PolicyRequest, DEFAULT_CONF_PATH};
use crate::error::{PwqError, Result};
use crate::reconcile::DesiredState;
use crate::types::{Param, Value};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Incoming request document.
///
/// `params` keeps the caller's key order (it decides append order), and a
/// JSON `null` value means "not specified", matching the calling
/// convention of configuration-management runners. Unknown top-level keys
/// are rejected so a misspelled switch cannot silently do nothing.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleRequest {
    /// Target file, defaulting to the standard location
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Parameters to ensure, name to value
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Parameter names to ensure absent
    #[serde(default)]
    pub unset: Vec<String>,
    /// Copy the pre-edit file to a timestamped sibling before writing
    #[serde(default)]
    pub backup: bool,
    /// Plan and report without writing
    #[serde(default)]
    pub check_mode: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONF_PATH)
}

impl ModuleRequest {
    /// Validate names and values and convert into an engine request.
    ///
    /// # Errors
    /// Returns a validation error for names outside the allow-list, values
    /// that fail coercion, or a name that is both set and unset. No file
    /// access has happened by the time this returns.
    pub fn into_policy_request(self) -> Result<PolicyRequest> {
        let mut desired = DesiredState::new();
        for (name, json) in self.params {
            if json.is_null() {
                continue;
            }
            let param = Param::from_name(&name)?;
            let value: Value = serde_json::from_value(json)
                .map_err(|_| PwqError::validation(format!("{name}: unsupported value type")))?;
            desired.set(param, value)?;
        }
        for name in &self.unset {
            let param = Param::from_name(name)?;
            if desired.contains(param) {
                return Err(PwqError::validation(format!(
                    "{name} is both set and unset"
                )));
            }
            desired.unset(param);
        }
        Ok(PolicyRequest {
            path: self.path,
            desired,
            backup: self.backup,
            check_mode: self.check_mode,
        })
    }
}

/// Failure document shape
#[derive(Debug, Serialize)]
pub struct ModuleFailure {
    pub failed: bool,
    /// Error category, `validation` or `io`
    pub kind: &'static str,
    pub msg: String,
}

impl From<&PwqError> for ModuleFailure {
    fn from(err: &PwqError) -> Self {
        Self {
            failed: true,
            kind: err.kind(),
            msg: err.to_string(),
        }
    }
}

/// Execute one JSON request and produce the reply document.
///
/// `Ok` carries the success reply, `Err` the failure reply; both are JSON
/// text, so the caller decides only the exit status.
pub fn run_module(request_json: &str) -> std::result::Result<String, String> {
    match execute(request_json) {
        Ok(outcome) => Ok(to_json(&outcome)),
        Err(err) => Err(to_json(&ModuleFailure::from(&err))),
    }
}

fn execute(request_json: &str) -> Result<PolicyOutcome> {
    let request: ModuleRequest = serde_json::from_str(request_json)
        .map_err(|e| PwqError::validation(format!("malformed request: {e}")))?;
    let policy = request.into_policy_request()?;
    engine::apply_policy(&policy)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        format!("{{\"failed\": true, \"kind\": \"io\", \"msg\": \"reply serialization: {e}\"}}")
    })
}
