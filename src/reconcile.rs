//! Reconciliation planning: compute the minimal edits that take the current
//! document to a requested parameter state, then apply them
//!
//! The planner is pure. [`diff`] only reads, [`apply`] edits a copy, and
//! neither touches the filesystem, so check mode and the real write path
//! share one code path and differ only in whether the result is persisted.

use crate::document::ConfigDocument;
use crate::error::Result;
use crate::types::{Param, Value};
use serde::Serialize;
use std::fmt;

/// What the caller wants for one parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Ensure the parameter is present with this value
    Set(Value),
    /// Ensure the parameter is absent
    Unset,
}

/// Ordered set of requested parameter states.
///
/// Insertion order is preserved and decides the order in which missing
/// directives are appended to the file. Requesting the same parameter again
/// replaces the earlier request without moving its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredState {
    entries: Vec<(Param, Request)>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `param = value`, coercing the value to the parameter's
    /// declared kind.
    ///
    /// # Errors
    /// Returns a validation error if the value cannot be coerced. Nothing
    /// has touched the filesystem by then.
    pub fn set(&mut self, param: Param, value: Value) -> Result<()> {
        let coerced = param.coerce(value)?;
        self.put(param, Request::Set(coerced));
        Ok(())
    }

    /// Request removal of `param`
    pub fn unset(&mut self, param: Param) {
        self.put(param, Request::Unset);
    }

    /// True if `param` has been requested, either way
    pub fn contains(&self, param: Param) -> bool {
        self.entries.iter().any(|(p, _)| *p == param)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Param, Request)> {
        self.entries.iter()
    }

    fn put(&mut self, param: Param, request: Request) {
        match self.entries.iter_mut().find(|(p, _)| *p == param) {
            Some(entry) => entry.1 = request,
            None => self.entries.push((param, request)),
        }
    }
}

/// Kind of edit needed for one parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Add,
    Update,
    Remove,
}

/// One planned edit: the parameter, what happens to it, and the value text
/// before and after (`None` meaning absent)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub name: Param,
    pub action: ChangeAction,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            ChangeAction::Add => {
                write!(f, "+ {} = {}", self.name, self.new.as_deref().unwrap_or(""))
            }
            ChangeAction::Update => write!(
                f,
                "~ {} = {} (was {})",
                self.name,
                self.new.as_deref().unwrap_or(""),
                self.old.as_deref().unwrap_or("")
            ),
            ChangeAction::Remove => write!(f, "- {}", self.name),
        }
    }
}

/// Ordered list of planned edits; empty means the run is a no-op
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeReport {
    pub changes: Vec<Change>,
}

impl ChangeReport {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
}

/// Compute the minimal edit set that takes `doc` to `desired`.
///
/// Comparison against the current file is type-aware, so `dcredit = -1`
/// already satisfies a desired `-1` regardless of spacing or leading
/// zeroes, while a value that cannot be read as its declared type never
/// matches and gets rewritten canonically. A set whose canonical rendering
/// is empty (an empty word list, an empty string) adds nothing when the
/// parameter is absent. Unsetting an absent parameter is a no-op.
pub fn diff(doc: &ConfigDocument, desired: &DesiredState) -> ChangeReport {
    let mut changes = Vec::new();
    for (param, request) in desired.iter() {
        let current = doc.value_of(*param);
        match request {
            Request::Set(value) => {
                let rendered = value.to_string();
                match current {
                    None => {
                        if !rendered.is_empty() {
                            changes.push(Change {
                                name: *param,
                                action: ChangeAction::Add,
                                old: None,
                                new: Some(rendered),
                            });
                        }
                    }
                    Some(raw) => {
                        if !param.matches_raw(value, raw) {
                            changes.push(Change {
                                name: *param,
                                action: ChangeAction::Update,
                                old: Some(raw.to_string()),
                                new: Some(rendered),
                            });
                        }
                    }
                }
            }
            Request::Unset => {
                if let Some(raw) = current {
                    changes.push(Change {
                        name: *param,
                        action: ChangeAction::Remove,
                        old: Some(raw.to_string()),
                        new: None,
                    });
                }
            }
        }
    }
    ChangeReport { changes }
}

/// Apply a report to a copy of `doc` and return the edited document.
///
/// The input document is not mutated, so a check-mode caller can render
/// the result without giving up its pristine copy. Adds append in report
/// order; updates rewrite the existing line in place; removes delete every
/// occurrence.
pub fn apply(doc: &ConfigDocument, report: &ChangeReport) -> ConfigDocument {
    let mut next = doc.clone();
    for change in report.iter() {
        match change.action {
            ChangeAction::Add | ChangeAction::Update => {
                next.upsert(change.name, change.new.as_deref().unwrap_or(""));
            }
            ChangeAction::Remove => next.remove(change.name),
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired(entries: &[(Param, Value)]) -> DesiredState {
        let mut state = DesiredState::new();
        for (param, value) in entries {
            state.set(*param, value.clone()).unwrap();
        }
        state
    }

    #[test]
    fn test_diff_empty_desired_is_noop() {
        let doc = ConfigDocument::parse("minlen = 8\n");
        let report = diff(&doc, &DesiredState::new());
        assert!(report.is_empty());
    }

    #[test]
    fn test_diff_matching_value_is_noop() {
        let doc = ConfigDocument::parse("minlen = 8\ndictcheck = yes\n");
        let state = desired(&[
            (Param::Minlen, Value::Int(8)),
            (Param::Dictcheck, Value::Bool(true)),
        ]);
        assert!(diff(&doc, &state).is_empty());
    }

    #[test]
    fn test_diff_plans_update_add_remove() {
        let doc = ConfigDocument::parse("minlen = 8\nretry = 3\n");
        let mut state = desired(&[
            (Param::Minlen, Value::Int(12)),
            (Param::Dcredit, Value::Int(-1)),
        ]);
        state.unset(Param::Retry);
        let report = diff(&doc, &state);
        assert_eq!(report.len(), 3);
        assert_eq!(report.changes[0].action, ChangeAction::Update);
        assert_eq!(report.changes[0].name, Param::Minlen);
        assert_eq!(report.changes[0].old.as_deref(), Some("8"));
        assert_eq!(report.changes[0].new.as_deref(), Some("12"));
        assert_eq!(report.changes[1].action, ChangeAction::Add);
        assert_eq!(report.changes[1].name, Param::Dcredit);
        assert_eq!(report.changes[2].action, ChangeAction::Remove);
        assert_eq!(report.changes[2].name, Param::Retry);
    }

    #[test]
    fn test_diff_unset_absent_is_noop() {
        let doc = ConfigDocument::parse("minlen = 8\n");
        let mut state = DesiredState::new();
        state.unset(Param::Dcredit);
        assert!(diff(&doc, &state).is_empty());
    }

    #[test]
    fn test_diff_skips_add_of_empty_rendering() {
        let doc = ConfigDocument::parse("minlen = 8\n");
        let state = desired(&[(Param::Badwords, Value::List(Vec::new()))]);
        assert!(diff(&doc, &state).is_empty());
    }

    #[test]
    fn test_diff_still_updates_to_empty_rendering() {
        let doc = ConfigDocument::parse("badwords = a b\n");
        let state = desired(&[(Param::Badwords, Value::List(Vec::new()))]);
        let report = diff(&doc, &state);
        assert_eq!(report.len(), 1);
        assert_eq!(report.changes[0].action, ChangeAction::Update);
        assert_eq!(report.changes[0].new.as_deref(), Some(""));
    }

    #[test]
    fn test_diff_rewrites_malformed_value() {
        // `8 # desired` cannot be read as an integer, so even a desired 8
        // forces a canonical rewrite
        let doc = ConfigDocument::parse("minlen = 8 # desired\n");
        let state = desired(&[(Param::Minlen, Value::Int(8))]);
        let report = diff(&doc, &state);
        assert_eq!(report.len(), 1);
        assert_eq!(report.changes[0].old.as_deref(), Some("8 # desired"));
        assert_eq!(report.changes[0].new.as_deref(), Some("8"));
    }

    #[test]
    fn test_desired_state_preserves_insertion_order() {
        let mut state = DesiredState::new();
        state.set(Param::Retry, Value::Int(3)).unwrap();
        state.set(Param::Difok, Value::Int(4)).unwrap();
        state.set(Param::Retry, Value::Int(5)).unwrap();
        let order: Vec<Param> = state.iter().map(|(p, _)| *p).collect();
        assert_eq!(order, vec![Param::Retry, Param::Difok]);
        let report = diff(&ConfigDocument::parse(""), &state);
        assert_eq!(report.changes[0].new.as_deref(), Some("5"));
    }

    #[test]
    fn test_desired_state_set_validates_before_any_io() {
        let mut state = DesiredState::new();
        let err = state.set(Param::Minlen, Value::Str("tall".into())).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(state.is_empty());
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let doc = ConfigDocument::parse("minlen = 8\n");
        let state = desired(&[(Param::Minlen, Value::Int(12))]);
        let report = diff(&doc, &state);
        let next = apply(&doc, &report);
        assert_eq!(doc.render(), "minlen = 8\n");
        assert_eq!(next.render(), "minlen = 12\n");
    }

    #[test]
    fn test_apply_then_diff_again_is_noop() {
        let doc = ConfigDocument::parse("# header\nminlen = 8\nfuture_param = 3\n");
        let mut state = desired(&[
            (Param::Minlen, Value::Int(12)),
            (Param::Dcredit, Value::Int(-1)),
            (Param::Badwords, Value::List(vec!["secret".into(), "pass word".into()])),
        ]);
        state.unset(Param::Retry);
        let next = apply(&doc, &diff(&doc, &state));
        assert!(diff(&next, &state).is_empty());
        assert_eq!(
            next.render(),
            "# header\nminlen = 12\nfuture_param = 3\ndcredit = -1\nbadwords = secret \"pass word\"\n"
        );
    }

    #[test]
    fn test_change_display() {
        let add = Change {
            name: Param::Dcredit,
            action: ChangeAction::Add,
            old: None,
            new: Some("-1".into()),
        };
        assert_eq!(add.to_string(), "+ dcredit = -1");
        let update = Change {
            name: Param::Minlen,
            action: ChangeAction::Update,
            old: Some("8".into()),
            new: Some("12".into()),
        };
        assert_eq!(update.to_string(), "~ minlen = 12 (was 8)");
        let remove = Change {
            name: Param::Retry,
            action: ChangeAction::Remove,
            old: Some("3".into()),
            new: None,
        };
        assert_eq!(remove.to_string(), "- retry");
    }

    #[test]
    fn test_change_serializes_with_text_labels() {
        let change = Change {
            name: Param::Minlen,
            action: ChangeAction::Update,
            old: Some("8".into()),
            new: Some("12".into()),
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["name"], "minlen");
        assert_eq!(json["action"], "update");
        assert_eq!(json["old"], "8");
        assert_eq!(json["new"], "12");
    }
}
