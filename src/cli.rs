use crate::engine::DEFAULT_CONF_PATH;
use crate::error::{PwqError, Result};
use crate::reconcile::DesiredState;
use crate::types::{Param, Value};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// pwqctl - Idempotent editor for the pam_pwquality configuration file
#[derive(Parser)]
#[command(name = "pwqctl")]
#[command(about = "Manage password-quality policy in /etc/security/pwquality.conf")]
#[command(version)]
pub struct Cli {
    /// Configuration file to operate on
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_CONF_PATH)]
    pub path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the current effective parameter set
    Show {
        /// Emit JSON instead of name = value lines
        #[arg(long)]
        json: bool,
    },
    /// Add, update, or remove parameters
    Set(SetArgs),
    /// Run one JSON request document (for orchestration tooling)
    Module {
        /// Request file, or `-` for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        file: String,
    },
}

/// Parameters for `pwqctl set`. Every policy flag is optional; only the
/// flags given take part in the reconciliation.
#[derive(Debug, Args)]
pub struct SetArgs {
    /// Characters in the new password that must differ from the old one
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub difok: Option<i64>,

    /// Minimum acceptable password length
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub minlen: Option<i64>,

    /// Credit for digits (negative = required count)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub dcredit: Option<i64>,

    /// Credit for uppercase characters (negative = required count)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub ucredit: Option<i64>,

    /// Credit for lowercase characters (negative = required count)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub lcredit: Option<i64>,

    /// Credit for other characters (negative = required count)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub ocredit: Option<i64>,

    /// Minimum number of character classes
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub minclass: Option<i64>,

    /// Maximum run of the same character
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub maxrepeat: Option<i64>,

    /// Maximum run of characters of the same class
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub maxclassrepeat: Option<i64>,

    /// Maximum length of monotonic sequences like 12345
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub maxsequence: Option<i64>,

    /// Minimum length of GECOS words to check against
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub gecoscheck: Option<i64>,

    /// Check candidate passwords against the cracklib dictionary
    #[arg(long, value_name = "BOOL")]
    pub dictcheck: Option<bool>,

    /// Reject passwords derived from the user name
    #[arg(long, value_name = "BOOL")]
    pub usercheck: Option<bool>,

    /// Words that must not appear in passwords
    #[arg(long, value_name = "WORD", num_args = 1..)]
    pub badwords: Option<Vec<String>>,

    /// Path to the cracklib dictionaries
    #[arg(long, value_name = "PATH")]
    pub dictpath: Option<String>,

    /// Length of user-name substrings to reject
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub usersubstr: Option<i64>,

    /// Reject failing passwords instead of only warning
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub enforcing: Option<i64>,

    /// Number of password entry attempts
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub retry: Option<i64>,

    /// Apply the checks to root as well
    #[arg(long, value_name = "BOOL")]
    pub enforce_for_root: Option<bool>,

    /// Check only users in the local passwd database
    #[arg(long, value_name = "BOOL")]
    pub local_users_only: Option<bool>,

    /// Remove a parameter from the file (repeatable)
    #[arg(long, value_name = "PARAM")]
    pub unset: Vec<String>,

    /// Copy the file to a timestamped sibling before writing
    #[arg(long)]
    pub backup: bool,

    /// Report what would change without writing the file
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl SetArgs {
    /// Build the typed desired state.
    ///
    /// Flags are collected in the file's conventional parameter order (the
    /// command line gives flags no inherent order). `--unset` names are
    /// validated against the allow-list and must not collide with a flag
    /// that sets the same parameter.
    ///
    /// # Errors
    /// Returns a validation error for unknown `--unset` names or a
    /// parameter both set and unset.
    pub fn to_desired_state(&self) -> Result<DesiredState> {
        let mut desired = DesiredState::new();
        let entries = [
            (Param::Difok, self.difok.map(Value::Int)),
            (Param::Minlen, self.minlen.map(Value::Int)),
            (Param::Dcredit, self.dcredit.map(Value::Int)),
            (Param::Ucredit, self.ucredit.map(Value::Int)),
            (Param::Lcredit, self.lcredit.map(Value::Int)),
            (Param::Ocredit, self.ocredit.map(Value::Int)),
            (Param::Minclass, self.minclass.map(Value::Int)),
            (Param::Maxrepeat, self.maxrepeat.map(Value::Int)),
            (Param::Maxclassrepeat, self.maxclassrepeat.map(Value::Int)),
            (Param::Maxsequence, self.maxsequence.map(Value::Int)),
            (Param::Gecoscheck, self.gecoscheck.map(Value::Int)),
            (Param::Dictcheck, self.dictcheck.map(Value::Bool)),
            (Param::Usercheck, self.usercheck.map(Value::Bool)),
            (Param::Badwords, self.badwords.clone().map(Value::List)),
            (Param::Dictpath, self.dictpath.clone().map(Value::Str)),
            (Param::Usersubstr, self.usersubstr.map(Value::Int)),
            (Param::Enforcing, self.enforcing.map(Value::Int)),
            (Param::Retry, self.retry.map(Value::Int)),
            (Param::EnforceForRoot, self.enforce_for_root.map(Value::Bool)),
            (Param::LocalUsersOnly, self.local_users_only.map(Value::Bool)),
        ];
        for (param, value) in entries {
            if let Some(value) = value {
                desired.set(param, value)?;
            }
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
        Ok(desired)
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
