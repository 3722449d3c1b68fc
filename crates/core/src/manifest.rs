// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency manifest and requirement specifiers.
//!
//! The pipeline treats manifest entries as opaque lines handed to the
//! package manager. [`Requirement`] parsing exists for simulation and
//! reporting only; it understands names, extras, and version constraints,
//! not the full requirement grammar.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Externally supplied list of package requirement lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    /// Path of the manifest relative to the build context
    pub path: PathBuf,
    /// Requirement lines with comments and blank lines removed
    pub entries: Vec<String>,
}

impl DependencyManifest {
    /// Parse manifest text. Full-line and inline (` #`) comments are dropped
    /// and `\` continuation lines are joined into one entry.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let mut entries = Vec::new();
        let mut pending = String::new();
        for line in content.lines() {
            let line = match line.find(" #") {
                Some(i) => &line[..i],
                None => line,
            }
            .trim();
            if line.starts_with('#') {
                continue;
            }
            let (part, continued) = match line.strip_suffix('\\') {
                Some(part) => (part.trim_end(), true),
                None => (line, false),
            };
            if !part.is_empty() {
                if !pending.is_empty() {
                    pending.push(' ');
                }
                pending.push_str(part);
            }
            if !continued && !pending.is_empty() {
                entries.push(std::mem::take(&mut pending));
            }
        }
        if !pending.is_empty() {
            entries.push(pending);
        }
        Self { path: path.into(), entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Requirements the simulation can model.
    ///
    /// Option lines such as `-r` are skipped, per-requirement options such as
    /// `--hash` are dropped, and URL or VCS requirements are left out (see
    /// [`DependencyManifest::unsupported`]).
    pub fn requirements(&self) -> Result<Vec<Requirement>, RequirementError> {
        let mut requirements = Vec::new();
        for line in self.requirement_lines() {
            match Requirement::parse(line) {
                Ok(requirement) => requirements.push(requirement),
                Err(RequirementError::Unsupported(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(requirements)
    }

    /// Requirement entries in forms that are passed through but not simulated.
    pub fn unsupported(&self) -> Vec<&str> {
        self.requirement_lines()
            .filter(|line| matches!(Requirement::parse(line), Err(RequirementError::Unsupported(_))))
            .collect()
    }

    fn requirement_lines(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(|e| !e.starts_with('-')).map(|e| strip_options(e))
    }
}

// `flask==3.0.0 --hash=sha256:...` -> `flask==3.0.0`
fn strip_options(entry: &str) -> &str {
    let mut end = entry.len();
    for (i, _) in entry.match_indices("--") {
        if entry[..i].ends_with(char::is_whitespace) {
            end = i;
            break;
        }
    }
    entry[..end].trim_end()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementError {
    #[error("missing package name in `{0}`")]
    MissingName(String),
    #[error("invalid version constraint `{constraint}` in `{line}`")]
    InvalidConstraint { line: String, constraint: String },
    #[error("requirement form `{0}` is not simulated")]
    Unsupported(String),
}

/// Version comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    Compatible,
}

impl Op {
    // Longest operators first so `>=` is not read as `>`.
    const TABLE: [(&'static str, Op); 7] = [
        ("~=", Op::Compatible),
        ("==", Op::Eq),
        ("!=", Op::Ne),
        (">=", Op::Ge),
        ("<=", Op::Le),
        (">", Op::Gt),
        ("<", Op::Lt),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Ge => ">=",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Compatible => "~=",
        }
    }
}

/// A single `<op><version>` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub op: Op,
    pub version: String,
}

impl Constraint {
    pub fn matches(&self, candidate: &str) -> bool {
        match self.op {
            Op::Eq => version_eq(candidate, &self.version),
            Op::Ne => !version_eq(candidate, &self.version),
            Op::Ge => compare_versions(candidate, &self.version) != Ordering::Less,
            Op::Le => compare_versions(candidate, &self.version) != Ordering::Greater,
            Op::Gt => compare_versions(candidate, &self.version) == Ordering::Greater,
            Op::Lt => compare_versions(candidate, &self.version) == Ordering::Less,
            Op::Compatible => {
                let parts: Vec<&str> = self.version.split('.').collect();
                if parts.len() < 2 {
                    return false;
                }
                let prefix = format!("{}.*", parts[..parts.len() - 1].join("."));
                compare_versions(candidate, &self.version) != Ordering::Less
                    && version_eq(candidate, &prefix)
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// Parsed requirement: `name[extras] constraint, constraint ; markers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl Requirement {
    pub fn parse(line: &str) -> Result<Self, RequirementError> {
        let original = line.trim();
        // Environment markers are not evaluated.
        let spec = original.split(';').next().unwrap_or("").trim();
        if spec.starts_with('-') || spec.contains("://") || spec.contains(" @ ") {
            return Err(RequirementError::Unsupported(original.to_string()));
        }

        let name_len = spec
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
            .count();
        if name_len == 0 {
            return Err(RequirementError::MissingName(original.to_string()));
        }
        let name = spec[..name_len].to_string();
        let mut rest = spec[name_len..].trim_start();

        let mut extras = Vec::new();
        if let Some(after) = rest.strip_prefix('[') {
            let Some(end) = after.find(']') else {
                return Err(RequirementError::Unsupported(original.to_string()));
            };
            extras = after[..end]
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            rest = after[end + 1..].trim_start();
        }

        let mut constraints = Vec::new();
        if !rest.is_empty() {
            for clause in rest.split(',').map(str::trim) {
                let parsed = Op::TABLE.iter().find_map(|&(token, op)| {
                    clause
                        .strip_prefix(token)
                        .map(|v| Constraint { op, version: v.trim().to_string() })
                });
                match parsed {
                    Some(c) if is_version(&c.version) => constraints.push(c),
                    _ => {
                        return Err(RequirementError::InvalidConstraint {
                            line: original.to_string(),
                            constraint: clause.to_string(),
                        })
                    }
                }
            }
        }

        Ok(Self { name, extras, constraints })
    }

    /// Canonical package name: lowercase, runs of `-_.` collapsed to `-`.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether `version` satisfies every constraint.
    pub fn matches(&self, version: &str) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        let clauses: Vec<String> = self.constraints.iter().map(Constraint::to_string).collect();
        write!(f, "{}", clauses.join(","))
    }
}

/// Canonical package name: lowercase, runs of `-_.` collapsed to `-`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('-');
        }
        pending_sep = false;
        out.push(ch.to_ascii_lowercase());
    }
    out
}

fn is_version(v: &str) -> bool {
    let v = v.strip_suffix(".*").unwrap_or(v);
    !v.is_empty()
        && v.split('.').all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_alphanumeric()))
}

/// Compare dotted versions component-wise; numeric components compare
/// numerically, others lexically, missing components count as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let pa: Vec<&str> = a.split('.').collect();
    let pb: Vec<&str> = b.split('.').collect();
    for i in 0..pa.len().max(pb.len()) {
        let x = pa.get(i).copied().unwrap_or("0");
        let y = pb.get(i).copied().unwrap_or("0");
        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn version_eq(candidate: &str, target: &str) -> bool {
    match target.strip_suffix(".*") {
        Some(prefix) => {
            let want: Vec<&str> = prefix.split('.').collect();
            let have: Vec<&str> = candidate.split('.').collect();
            have.len() >= want.len()
                && want.iter().zip(&have).all(|(w, h)| compare_versions(w, h) == Ordering::Equal)
        }
        None => compare_versions(candidate, target) == Ordering::Equal,
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
