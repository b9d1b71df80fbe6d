//! Type-safe parameter and value types for the pwquality configuration
//!
//! This module replaces stringly-typed parameter handling with proper Rust
//! enums that provide compile-time validation and exhaustive matching. The
//! [`Param`] enum is the closed allow-list of directives this crate will
//! edit; anything else found in the file is carried through untouched.

use crate::error::{PwqError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// Declared value type of a known parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Signed integer (credits may be negative)
    Int,
    /// Boolean, written as `1` or `0`
    Bool,
    /// Free-form string (paths)
    Str,
    /// Whitespace-separated word list
    List,
}

impl ParamKind {
    /// Human label used in validation messages
    pub fn describe(self) -> &'static str {
        match self {
            Self::Int => "an integer",
            Self::Bool => "a boolean",
            Self::Str => "a string",
            Self::List => "a word list",
        }
    }
}

/// The directives pam_pwquality understands, in the order new entries are
/// appended when no caller-supplied order exists.
///
/// Names are case-sensitive and match the configuration file exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    #[strum(serialize = "difok")]
    Difok,
    #[strum(serialize = "minlen")]
    Minlen,
    #[strum(serialize = "dcredit")]
    Dcredit,
    #[strum(serialize = "ucredit")]
    Ucredit,
    #[strum(serialize = "lcredit")]
    Lcredit,
    #[strum(serialize = "ocredit")]
    Ocredit,
    #[strum(serialize = "minclass")]
    Minclass,
    #[strum(serialize = "maxrepeat")]
    Maxrepeat,
    #[strum(serialize = "maxclassrepeat")]
    Maxclassrepeat,
    #[strum(serialize = "maxsequence")]
    Maxsequence,
    #[strum(serialize = "gecoscheck")]
    Gecoscheck,
    #[strum(serialize = "dictcheck")]
    Dictcheck,
    #[strum(serialize = "usercheck")]
    Usercheck,
    #[strum(serialize = "badwords")]
    Badwords,
    #[strum(serialize = "dictpath")]
    Dictpath,
    #[strum(serialize = "usersubstr")]
    Usersubstr,
    #[strum(serialize = "enforcing")]
    Enforcing,
    #[strum(serialize = "retry")]
    Retry,
    #[strum(serialize = "enforce_for_root")]
    EnforceForRoot,
    #[strum(serialize = "local_users_only")]
    LocalUsersOnly,
}

impl Param {
    /// Declared type of this parameter's value
    pub fn kind(self) -> ParamKind {
        match self {
            Self::Dictcheck | Self::Usercheck | Self::EnforceForRoot | Self::LocalUsersOnly => {
                ParamKind::Bool
            }
            Self::Badwords => ParamKind::List,
            Self::Dictpath => ParamKind::Str,
            _ => ParamKind::Int,
        }
    }

    /// Parse a directive name, mapping unknown names to a validation error.
    ///
    /// Matching is exact: `Minlen` is not a known parameter.
    ///
    /// # Errors
    /// Returns [`PwqError::Validation`] for names outside the allow-list.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::from_str(name)
            .map_err(|_| PwqError::validation(format!("unknown parameter {name:?}")))
    }

    /// Coerce a caller-supplied value to this parameter's declared kind,
    /// normalizing it to the form a later read of the file will report.
    ///
    /// Integers accept integer and numeric-string forms. Booleans accept
    /// booleans, `0`/`1`, and the usual true/false/yes/no spellings.
    /// Strings are trimmed and unquoted. Lists accept arrays of words or a
    /// single string that is split on whitespace (quoted spans count as
    /// one word); empty words are dropped.
    ///
    /// # Errors
    /// Returns [`PwqError::Validation`] when the value cannot represent
    /// the declared kind, or when its text could not survive a write/read
    /// cycle (embedded newlines, quote characters in list words).
    pub fn coerce(self, value: Value) -> Result<Value> {
        let kind = self.kind();
        match (kind, value) {
            (ParamKind::Int, Value::Int(n)) => Ok(Value::Int(n)),
            (ParamKind::Int, Value::Str(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Ok(Value::Int(n)),
                Err(_) => Err(self.mismatch(kind, &Value::Str(s))),
            },
            (ParamKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (ParamKind::Bool, Value::Int(n)) if n == 0 || n == 1 => Ok(Value::Bool(n != 0)),
            (ParamKind::Bool, Value::Str(s)) => match parse_bool_word(s.trim()) {
                Some(b) => Ok(Value::Bool(b)),
                None => Err(self.mismatch(kind, &Value::Str(s))),
            },
            (ParamKind::Str, Value::Str(s)) => {
                let cleaned = canonical_str(&s);
                if cleaned.contains('\n') {
                    return Err(PwqError::validation(format!(
                        "{self}: value may not contain newlines"
                    )));
                }
                Ok(Value::Str(cleaned.to_string()))
            }
            (ParamKind::Str, Value::Int(n)) => Ok(Value::Str(n.to_string())),
            (ParamKind::List, Value::List(words)) => Ok(Value::List(self.clean_words(words)?)),
            (ParamKind::List, Value::Str(s)) => {
                Ok(Value::List(self.clean_words(tokenize_words(&s))?))
            }
            (kind, other) => Err(self.mismatch(kind, &other)),
        }
    }

    /// List words pass through a write/read cycle unmodified only if they
    /// carry no quote characters or newlines; whitespace is fine because
    /// rendering quotes such words.
    fn clean_words(self, words: Vec<String>) -> Result<Vec<String>> {
        let mut cleaned = Vec::with_capacity(words.len());
        for word in words {
            if word.is_empty() {
                continue;
            }
            if word.contains(['"', '\'', '\n']) {
                return Err(PwqError::validation(format!(
                    "{self}: word {word:?} may not contain quotes or newlines"
                )));
            }
            cleaned.push(word);
        }
        Ok(cleaned)
    }

    /// Interpret a raw on-disk value according to this parameter's kind.
    /// `None` means the text is malformed for the declared type.
    pub fn parse_raw(self, raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        match self.kind() {
            ParamKind::Int => trimmed.parse::<i64>().ok().map(Value::Int),
            // PAM treats any integer as a flag, so `dictcheck = 5` reads as true
            ParamKind::Bool => match trimmed.parse::<i64>() {
                Ok(n) => Some(Value::Bool(n != 0)),
                Err(_) => parse_bool_word(trimmed).map(Value::Bool),
            },
            ParamKind::Str => Some(Value::Str(unquote(trimmed).to_string())),
            ParamKind::List => Some(Value::List(tokenize_words(trimmed))),
        }
    }

    /// Compare a desired (already coerced) value against raw on-disk text.
    ///
    /// The comparison is type-aware: `dcredit = -1` matches `-1`, `01` and
    /// ` 1 ` both match a desired `1`, and `dictcheck = yes` matches a
    /// desired `true`. Malformed raw text matches nothing, which forces a
    /// canonical rewrite of the line.
    pub fn matches_raw(self, desired: &Value, raw: &str) -> bool {
        self.parse_raw(raw).as_ref() == Some(desired)
    }

    fn mismatch(self, kind: ParamKind, got: &Value) -> PwqError {
        PwqError::validation(format!(
            "{self}: expected {}, got {}",
            kind.describe(),
            got.describe()
        ))
    }
}

// ============================================================================
// Values
// ============================================================================

/// A typed parameter value.
///
/// Serializes untagged, so JSON callers write plain numbers, booleans,
/// strings, and arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl Value {
    /// Human label used in validation messages
    pub fn describe(&self) -> String {
        match self {
            Self::Int(n) => format!("integer {n}"),
            Self::Bool(b) => format!("boolean {b}"),
            Self::Str(s) => format!("string {s:?}"),
            Self::List(_) => "a word list".to_string(),
        }
    }
}

/// Canonical file rendering: booleans become `1`/`0`, lists join with
/// single spaces and quote any word containing whitespace.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(true) => f.write_str("1"),
            Self::Bool(false) => f.write_str("0"),
            Self::Str(s) => f.write_str(s),
            Self::List(words) => {
                for (i, word) in words.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    if word.chars().any(char::is_whitespace) {
                        write!(f, "\"{word}\"")?;
                    } else {
                        f.write_str(word)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Recognize the boolean word spellings accepted from callers and files
fn parse_bool_word(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Trim and unquote to a fixed point, the form a value settles into after
/// being written and read back
fn canonical_str(s: &str) -> &str {
    let mut cleaned = s.trim();
    loop {
        let next = unquote(cleaned).trim();
        if next == cleaned {
            return cleaned;
        }
        cleaned = next;
    }
}

/// Strip one level of matching single or double quotes
pub(crate) fn unquote(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0]
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Split a list value into words: whitespace separates, quoted spans hold
/// together, and an unterminated quote keeps the rest as one word rather
/// than failing.
pub(crate) fn tokenize_words(raw: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in raw.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_param_names_roundtrip() {
        for param in Param::iter() {
            let name = param.to_string();
            assert_eq!(Param::from_str(&name).unwrap(), param);
        }
    }

    #[test]
    fn test_param_name_spellings() {
        assert_eq!(Param::Minlen.to_string(), "minlen");
        assert_eq!(Param::EnforceForRoot.to_string(), "enforce_for_root");
        assert_eq!(Param::LocalUsersOnly.to_string(), "local_users_only");
        assert_eq!(Param::Maxclassrepeat.to_string(), "maxclassrepeat");
    }

    #[test]
    fn test_param_parsing_is_case_sensitive() {
        assert_eq!(Param::from_str("minlen").unwrap(), Param::Minlen);
        assert!(Param::from_str("Minlen").is_err());
        assert!(Param::from_str("MINLEN").is_err());
        assert!(Param::from_name("bogus").is_err());
    }

    #[test]
    fn test_param_kinds() {
        assert_eq!(Param::Minlen.kind(), ParamKind::Int);
        assert_eq!(Param::Dcredit.kind(), ParamKind::Int);
        assert_eq!(Param::Dictcheck.kind(), ParamKind::Bool);
        assert_eq!(Param::EnforceForRoot.kind(), ParamKind::Bool);
        assert_eq!(Param::Badwords.kind(), ParamKind::List);
        assert_eq!(Param::Dictpath.kind(), ParamKind::Str);
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(
            Param::Minlen.coerce(Value::Int(12)).unwrap(),
            Value::Int(12)
        );
        assert_eq!(
            Param::Dcredit.coerce(Value::Str("-1".into())).unwrap(),
            Value::Int(-1)
        );
        assert!(Param::Minlen.coerce(Value::Str("short".into())).is_err());
        assert!(Param::Minlen.coerce(Value::Bool(true)).is_err());
    }

    #[test]
    fn test_coerce_bool() {
        assert_eq!(
            Param::Dictcheck.coerce(Value::Bool(true)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Param::Dictcheck.coerce(Value::Int(0)).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            Param::Usercheck.coerce(Value::Str("yes".into())).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Param::Usercheck.coerce(Value::Str("No".into())).unwrap(),
            Value::Bool(false)
        );
        assert!(Param::Dictcheck.coerce(Value::Int(5)).is_err());
        assert!(Param::Dictcheck.coerce(Value::Str("maybe".into())).is_err());
    }

    #[test]
    fn test_coerce_list_splits_strings() {
        assert_eq!(
            Param::Badwords
                .coerce(Value::Str("secret password 'pass word'".into()))
                .unwrap(),
            Value::List(vec![
                "secret".into(),
                "password".into(),
                "pass word".into()
            ])
        );
        assert!(Param::Badwords.coerce(Value::Int(3)).is_err());
    }

    #[test]
    fn test_coerce_list_normalizes_words() {
        // empty words vanish; quote characters cannot survive a
        // write/read cycle, so they are rejected outright
        assert_eq!(
            Param::Badwords
                .coerce(Value::List(vec!["".into(), "ok".into()]))
                .unwrap(),
            Value::List(vec!["ok".into()])
        );
        assert!(Param::Badwords
            .coerce(Value::List(vec!["a\"b".into()]))
            .is_err());
        assert!(Param::Badwords
            .coerce(Value::List(vec!["a\nb".into()]))
            .is_err());
        // the same rule applies to words extracted from a string form
        assert!(Param::Badwords
            .coerce(Value::Str("\"a'b\"".into()))
            .is_err());
    }

    #[test]
    fn test_coerce_str_normalizes_to_read_back_form() {
        assert_eq!(
            Param::Dictpath
                .coerce(Value::Str("  \"/usr/share/dict\"  ".into()))
                .unwrap(),
            Value::Str("/usr/share/dict".into())
        );
        // ints are accepted for string parameters
        assert_eq!(
            Param::Dictpath.coerce(Value::Int(5)).unwrap(),
            Value::Str("5".into())
        );
        assert!(Param::Dictpath
            .coerce(Value::Str("two\nlines".into()))
            .is_err());
    }

    #[test]
    fn test_coerce_error_names_the_parameter() {
        let err = Param::Minlen.coerce(Value::Str("abc".into())).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("minlen"), "message was: {msg}");
        assert!(msg.contains("an integer"), "message was: {msg}");
    }

    #[test]
    fn test_parse_raw_int() {
        assert_eq!(Param::Minlen.parse_raw("12"), Some(Value::Int(12)));
        assert_eq!(Param::Minlen.parse_raw("  12  "), Some(Value::Int(12)));
        assert_eq!(Param::Dcredit.parse_raw("-1"), Some(Value::Int(-1)));
        assert_eq!(Param::Minlen.parse_raw("012"), Some(Value::Int(12)));
        assert_eq!(Param::Minlen.parse_raw("12 # inline"), None);
        assert_eq!(Param::Minlen.parse_raw("abc"), None);
    }

    #[test]
    fn test_parse_raw_bool_accepts_pam_spellings() {
        assert_eq!(Param::Dictcheck.parse_raw("1"), Some(Value::Bool(true)));
        assert_eq!(Param::Dictcheck.parse_raw("0"), Some(Value::Bool(false)));
        assert_eq!(Param::Dictcheck.parse_raw("5"), Some(Value::Bool(true)));
        assert_eq!(Param::Dictcheck.parse_raw("yes"), Some(Value::Bool(true)));
        assert_eq!(Param::Dictcheck.parse_raw("False"), Some(Value::Bool(false)));
        assert_eq!(Param::Dictcheck.parse_raw("maybe"), None);
    }

    #[test]
    fn test_parse_raw_list_and_str() {
        assert_eq!(
            Param::Badwords.parse_raw("a  b \"c d\""),
            Some(Value::List(vec!["a".into(), "b".into(), "c d".into()]))
        );
        assert_eq!(
            Param::Dictpath.parse_raw("\"/usr/share/dict\""),
            Some(Value::Str("/usr/share/dict".into()))
        );
    }

    #[test]
    fn test_matches_raw_is_type_aware() {
        assert!(Param::Minlen.matches_raw(&Value::Int(12), "12"));
        assert!(Param::Minlen.matches_raw(&Value::Int(12), " 012 "));
        assert!(!Param::Minlen.matches_raw(&Value::Int(12), "13"));
        assert!(Param::Dictcheck.matches_raw(&Value::Bool(true), "yes"));
        assert!(Param::Badwords.matches_raw(
            &Value::List(vec!["a".into(), "b".into()]),
            "a   b"
        ));
        // malformed raw text never matches, forcing a rewrite
        assert!(!Param::Minlen.matches_raw(&Value::Int(12), "12 # comment"));
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(Value::Int(-1).to_string(), "-1");
        assert_eq!(Value::Bool(true).to_string(), "1");
        assert_eq!(Value::Bool(false).to_string(), "0");
        assert_eq!(Value::Str("/usr/share/dict".into()).to_string(), "/usr/share/dict");
        assert_eq!(
            Value::List(vec!["a".into(), "pass word".into()]).to_string(),
            "a \"pass word\""
        );
        assert_eq!(Value::List(Vec::new()).to_string(), "");
    }

    #[test]
    fn test_value_json_shapes() {
        assert_eq!(serde_json::to_string(&Value::Int(-1)).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Value::Bool(true)).unwrap(), "true");
        let parsed: Value = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(parsed, Value::List(vec!["a".into(), "b".into()]));
        let parsed: Value = serde_json::from_str("8").unwrap();
        assert_eq!(parsed, Value::Int(8));
    }

    #[test]
    fn test_tokenize_words_edges() {
        assert_eq!(tokenize_words(""), Vec::<String>::new());
        assert_eq!(tokenize_words("   "), Vec::<String>::new());
        assert_eq!(tokenize_words("one"), vec!["one"]);
        // unterminated quote keeps the rest together instead of failing
        assert_eq!(tokenize_words("a \"b c"), vec!["a", "b c"]);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("\"abc'"), "\"abc'");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn test_allow_list_is_complete() {
        assert_eq!(Param::iter().count(), 20);
    }
}
