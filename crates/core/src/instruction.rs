// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instructions represent the image-layer operations a stage performs

use crate::identity::ExecutionIdentity;
use crate::image::BaseImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One image-layer operation, applied in order by a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Start from a pinned base image
    From { image: BaseImage },

    /// Run a typed command in the current user context
    Run {
        command: Command,
        /// Exit conditions that are expected and must not abort the build
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        benign: Vec<BenignExit>,
    },

    /// Set an environment variable in the image config
    Env { key: String, value: EnvValue },

    /// Set the working directory (metadata; the directory is created explicitly beforehand)
    Workdir { path: PathBuf },

    /// Switch the user context for every later instruction
    User { name: String },

    /// Copy files from the build context, stamping ownership at write time when `chown` is set
    Copy {
        source: PathBuf,
        dest: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chown: Option<String>,
    },

    /// Default command of the image
    Cmd { argv: Vec<String> },
}

impl Instruction {
    pub fn run(command: Command) -> Self {
        Instruction::Run { command, benign: Vec::new() }
    }

    /// Instruction name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::From { .. } => "from",
            Instruction::Run { .. } => "run",
            Instruction::Env { .. } => "env",
            Instruction::Workdir { .. } => "workdir",
            Instruction::User { .. } => "user",
            Instruction::Copy { .. } => "copy",
            Instruction::Cmd { .. } => "cmd",
        }
    }

    /// Key-value pairs for structured logging
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Instruction::From { image } => vec![("image", image.to_string())],
            Instruction::Run { command, benign } => vec![
                ("command", command.name().to_string()),
                ("benign", benign.len().to_string()),
            ],
            Instruction::Env { key, value } => vec![("key", key.clone()), ("value", value.to_string())],
            Instruction::Workdir { path } => vec![("path", path.display().to_string())],
            Instruction::User { name } => vec![("name", name.clone())],
            Instruction::Copy { source, dest, chown } => vec![
                ("source", source.display().to_string()),
                ("dest", dest.display().to_string()),
                ("chown", chown.clone().unwrap_or_default()),
            ],
            Instruction::Cmd { argv } => vec![("argv", argv.join(" "))],
        }
    }

    /// Whether the instruction can write to the image filesystem
    pub fn writes_filesystem(&self) -> bool {
        matches!(self, Instruction::From { .. } | Instruction::Run { .. } | Instruction::Copy { .. })
    }
}

/// Typed command executed by a `Run` instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// Point /etc/localtime and /etc/timezone at a zone (idempotent)
    LinkTimezone { zone: String },
    /// Create the execution identity with its home directory
    CreateUser { identity: ExecutionIdentity },
    /// Create a directory and its parents
    MakeDir { path: PathBuf },
    /// Reassign ownership
    Chown { owner: String, path: PathBuf, recursive: bool },
    /// Upgrade the package manager itself into the user-local location
    PipSelfUpgrade { python: String },
    /// Install the dependency manifest
    PipInstall {
        python: String,
        manifest: PathBuf,
        /// Install into the user-local location
        user: bool,
        /// Keep no download/build cache
        no_cache: bool,
        /// Suppress warnings about scripts installed outside PATH
        quiet_script_location: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::LinkTimezone { .. } => "link_timezone",
            Command::CreateUser { .. } => "create_user",
            Command::MakeDir { .. } => "make_dir",
            Command::Chown { .. } => "chown",
            Command::PipSelfUpgrade { .. } => "pip_self_upgrade",
            Command::PipInstall { .. } => "pip_install",
        }
    }

    /// POSIX shell line for this command
    pub fn to_shell(&self) -> String {
        match self {
            Command::LinkTimezone { zone } => {
                let target = format!("/usr/share/zoneinfo/{}", zone);
                format!(
                    "ln -snf {} /etc/localtime && echo {} > /etc/timezone",
                    shell_quote(&target),
                    shell_quote(zone)
                )
            }
            Command::CreateUser { identity } => {
                let mut argv = vec![
                    "useradd".to_string(),
                    "--create-home".to_string(),
                    "--home-dir".to_string(),
                    identity.home.display().to_string(),
                    "--shell".to_string(),
                    identity.shell.clone(),
                    "--comment".to_string(),
                    identity.comment.clone(),
                ];
                if let Some(uid) = identity.uid {
                    argv.push("--uid".to_string());
                    argv.push(uid.to_string());
                }
                argv.push(identity.username.clone());
                join_argv(&argv)
            }
            Command::MakeDir { path } => {
                let path = path.display().to_string();
                join_argv(&["mkdir", "-p", path.as_str()])
            }
            Command::Chown { owner, path, recursive } => {
                let path = path.display().to_string();
                if *recursive {
                    join_argv(&["chown", "-R", owner.as_str(), path.as_str()])
                } else {
                    join_argv(&["chown", owner.as_str(), path.as_str()])
                }
            }
            Command::PipSelfUpgrade { python } => join_argv(&[
                python.as_str(),
                "-m",
                "pip",
                "install",
                "--user",
                "--upgrade",
                "--no-cache-dir",
                "--disable-pip-version-check",
                "pip",
            ]),
            Command::PipInstall { python, manifest, user, no_cache, quiet_script_location } => {
                let manifest = manifest.display().to_string();
                let mut argv = vec![python.as_str(), "-m", "pip", "install"];
                if *user {
                    argv.push("--user");
                }
                if *no_cache {
                    argv.push("--no-cache-dir");
                }
                if *quiet_script_location {
                    argv.push("--no-warn-script-location");
                }
                argv.push("-r");
                argv.push(manifest.as_str());
                join_argv(&argv)
            }
        }
    }
}

/// Value of an environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvValue {
    Literal(String),
    /// `entry` followed by the inherited value of `var`
    Prepend { entry: String, var: String },
}

impl EnvValue {
    /// Resolve against the inherited value of the variable.
    pub fn resolve(&self, inherited: Option<&str>) -> String {
        match self {
            EnvValue::Literal(v) => v.clone(),
            EnvValue::Prepend { entry, .. } => match inherited {
                Some(rest) if !rest.is_empty() => format!("{}:{}", entry, rest),
                _ => entry.clone(),
            },
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(v) => write!(f, "{}", v),
            EnvValue::Prepend { entry, var } => write!(f, "{}:${{{}}}", entry, var),
        }
    }
}

/// An expected, non-fatal exit condition of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenignExit {
    pub exit_code: i32,
    /// Text that must appear in the command's stdout or stderr
    pub output_contains: String,
    /// Why this condition is expected
    pub reason: String,
}

impl BenignExit {
    pub fn new(exit_code: i32, output_contains: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { exit_code, output_contains: output_contains.into(), reason: reason.into() }
    }

    pub fn matches(&self, exit_code: i32, stdout: &str, stderr: &str) -> bool {
        exit_code == self.exit_code
            && (stdout.contains(&self.output_contains) || stderr.contains(&self.output_contains))
    }
}

/// Filesystem state that must hold after a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum PostCondition {
    /// Every entry under `root`, including `root`, is owned by `owner`
    OwnedBy { root: PathBuf, owner: String },
    /// `path` does not exist
    Absent { path: PathBuf },
}

impl fmt::Display for PostCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostCondition::OwnedBy { root, owner } => {
                write!(f, "owned_by({}, {})", root.display(), owner)
            }
            PostCondition::Absent { path } => write!(f, "absent({})", path.display()),
        }
    }
}

/// Quote a word for a POSIX shell. Words made only of safe characters pass through.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b'.' | b'_' | b'-' | b':' | b'=' | b'+' | b','));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

fn join_argv<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter().map(|a| shell_quote(a.as_ref())).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "instruction_tests.rs"]
mod tests;
