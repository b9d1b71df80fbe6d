//! pwqctl library
//!
//! Idempotent management of `/etc/security/pwquality.conf`. The document
//! module owns parsing and byte-faithful rendering, reconcile turns a
//! desired parameter state into a minimal edit plan, and the engine runs
//! one plan against the filesystem with optional backup and an atomic
//! write. The CLI and the JSON module protocol are thin adapters over the
//! same engine.

pub mod cli;
pub mod document;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod reconcile;
pub mod types;

// Re-export main types for convenience
pub use document::{ConfigDocument, Directive, Line};
pub use engine::{apply_policy, show, PolicyOutcome, PolicyRequest, DEFAULT_CONF_PATH};
pub use error::{PwqError, Result};
pub use protocol::{run_module, ModuleFailure, ModuleRequest};
pub use reconcile::{apply, diff, Change, ChangeAction, ChangeReport, DesiredState, Request};
pub use types::{Param, ParamKind, Value};
