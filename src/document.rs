//! Line-preserving model of a pwquality configuration file
//!
//! Parsing never fails: every physical line is classified as a blank, a
//! comment, a recognized directive, or a passthrough, and anything that is
//! not a recognized directive is stored verbatim. Rendering an unedited
//! document reproduces the input byte for byte, including the presence or
//! absence of a final newline. Edits touch only the directive lines they
//! target; comments, blanks, and unknown lines are never rewritten.

use crate::types::{unquote, Param, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

/// One recognized `name = value` entry
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Known parameter this line sets
    pub name: Param,
    /// Value text with surrounding quotes stripped. Inline `#` text is part
    /// of the value, as pam_pwquality itself has no inline comments.
    pub value: String,
    /// The verbatim line, which for untouched lines keeps the original
    /// spacing and for edited lines holds the canonical `name = value` form
    pub line: String,
}

/// One physical line of the file
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// Whitespace-only line, kept verbatim
    Blank(String),
    /// Full-line comment (first non-blank character is `#`), kept verbatim
    Comment(String),
    /// A directive naming a known parameter
    Directive(Directive),
    /// Anything else: unknown keys, bare keys, junk. Kept verbatim and
    /// never edited.
    Passthrough(String),
}

impl Line {
    fn text(&self) -> &str {
        match self {
            Self::Blank(s) | Self::Comment(s) | Self::Passthrough(s) => s,
            Self::Directive(d) => &d.line,
        }
    }

    fn directive(&self) -> Option<&Directive> {
        match self {
            Self::Directive(d) => Some(d),
            _ => None,
        }
    }
}

/// In-memory form of the configuration file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigDocument {
    lines: Vec<Line>,
    /// Whether the source text ended with a newline
    trailing_newline: bool,
}

impl ConfigDocument {
    /// Parse file text. Infallible: unrecognized content degrades to
    /// passthrough lines rather than errors.
    pub fn parse(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(classify_line).collect()
        };
        Self {
            lines,
            trailing_newline,
        }
    }

    /// Serialize back to file text.
    ///
    /// For a document that has not been edited this is byte-identical to
    /// the text given to [`ConfigDocument::parse`].
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(line.text());
        }
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Raw value text of `param`, taken from its last occurrence
    pub fn value_of(&self, param: Param) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .find_map(|l| l.directive().filter(|d| d.name == param))
            .map(|d| d.value.as_str())
    }

    /// Set `param` to `value_text`, rewriting the last occurrence in place
    /// as canonical `name = value` and dropping any earlier duplicates, or
    /// appending a new line at the end when the parameter is absent.
    pub fn upsert(&mut self, param: Param, value_text: &str) {
        let line = if value_text.is_empty() {
            format!("{param} =")
        } else {
            format!("{param} = {value_text}")
        };
        let directive = Directive {
            name: param,
            value: value_text.to_string(),
            line,
        };
        let last = self
            .lines
            .iter()
            .rposition(|l| l.directive().is_some_and(|d| d.name == param));
        match last {
            Some(idx) => {
                self.lines[idx] = Line::Directive(directive);
                // walk backwards so removals cannot shift unvisited indices
                for i in (0..idx).rev() {
                    if self.lines[i].directive().is_some_and(|d| d.name == param) {
                        self.lines.remove(i);
                    }
                }
            }
            None => {
                self.lines.push(Line::Directive(directive));
                // appending to a file that lacked a final newline adds one
                self.trailing_newline = true;
            }
        }
    }

    /// Delete every occurrence of `param`
    pub fn remove(&mut self, param: Param) {
        self.lines
            .retain(|l| !l.directive().is_some_and(|d| d.name == param));
    }

    /// Typed view of the directives, last occurrence winning.
    ///
    /// A value that is malformed for its declared kind is logged and left
    /// out rather than reported under the wrong type; if the winning
    /// occurrence is malformed the parameter is absent from the view.
    pub fn effective(&self) -> BTreeMap<Param, Value> {
        let mut params = BTreeMap::new();
        for line in &self.lines {
            if let Line::Directive(d) = line {
                match d.name.parse_raw(&d.value) {
                    Some(value) => {
                        params.insert(d.name, value);
                    }
                    None => {
                        warn!("ignoring malformed {} value {:?}", d.name, d.value);
                        params.remove(&d.name);
                    }
                }
            }
        }
        params
    }
}

fn classify_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Line::Blank(raw.to_string());
    }
    if trimmed.starts_with('#') {
        return Line::Comment(raw.to_string());
    }
    match split_directive(trimmed) {
        Some((name, value)) => Line::Directive(Directive {
            name,
            value,
            line: raw.to_string(),
        }),
        None => Line::Passthrough(raw.to_string()),
    }
}

/// Split a trimmed non-comment line into a known parameter and its value
/// text. Accepts `name = value` and the older `name value` form; the value
/// may be empty only with `=`. Unknown names, bare names, and lines with
/// whitespace inside the would-be name all return `None`.
fn split_directive(trimmed: &str) -> Option<(Param, String)> {
    let (key, value) = match trimmed.split_once('=') {
        Some((key, value)) => (key.trim_end(), value.trim()),
        None => {
            let (key, value) = trimmed.split_once(char::is_whitespace)?;
            (key, value.trim())
        }
    };
    let name = Param::from_str(key).ok()?;
    Some((name, unquote(value).to_string()))
}
