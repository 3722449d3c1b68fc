// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Package index used by the simulated package manager

use keel_core::manifest::{compare_versions, normalize_name};
use keel_core::{Op, Requirement};
use std::collections::BTreeMap;

/// One published version of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    /// Requirement lines this release depends on
    pub requires: Vec<String>,
    /// Console scripts installed into the bin directory
    pub scripts: Vec<String>,
}

impl Release {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into(), requires: Vec::new(), scripts: Vec::new() }
    }

    pub fn requires(mut self, requirement: impl Into<String>) -> Self {
        self.requires.push(requirement.into());
        self
    }

    pub fn script(mut self, name: impl Into<String>) -> Self {
        self.scripts.push(name.into());
        self
    }
}

/// A package chosen by resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Name as requested by the first requirement naming it
    pub name: String,
    pub version: String,
    pub scripts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    /// Every well-formed requirement resolves
    Permissive,
    Explicit(BTreeMap<String, Vec<Release>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIndex {
    mode: Mode,
}

impl Default for PackageIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageIndex {
    /// An empty index; nothing resolves until packages are added.
    pub fn new() -> Self {
        Self { mode: Mode::Explicit(BTreeMap::new()) }
    }

    /// Resolves every satisfiable requirement, choosing the version its constraints name.
    pub fn permissive() -> Self {
        Self { mode: Mode::Permissive }
    }

    pub fn with_release(mut self, name: &str, release: Release) -> Self {
        if let Mode::Explicit(packages) = &mut self.mode {
            packages.entry(normalize_name(name)).or_default().push(release);
        }
        self
    }

    pub fn with_package(self, name: &str, versions: &[&str]) -> Self {
        versions.iter().fold(self, |index, v| index.with_release(name, Release::new(*v)))
    }

    /// Resolve requirements and their dependencies, first match wins.
    ///
    /// On failure returns pip-style `ERROR:` diagnostics.
    pub fn resolve(&self, requirements: &[Requirement]) -> Result<Vec<Resolved>, String> {
        let mut chosen: BTreeMap<String, Resolved> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut queue: Vec<(Requirement, Option<String>)> =
            requirements.iter().rev().map(|r| (r.clone(), None)).collect();

        while let Some((requirement, parent)) = queue.pop() {
            let key = requirement.normalized_name();
            if let Some(existing) = chosen.get(&key) {
                if !requirement.matches(&existing.version) {
                    return Err(conflict(&requirement, parent.as_deref(), existing));
                }
                continue;
            }

            let release = self.pick(&requirement).ok_or_else(|| self.unsatisfiable(&requirement))?;
            let mut dependencies = Vec::with_capacity(release.requires.len());
            for line in &release.requires {
                let dependency = Requirement::parse(line)
                    .map_err(|e| format!("ERROR: Invalid requirement in {}: {e}", requirement.name))?;
                dependencies.push((dependency, Some(format!("{}=={}", requirement.name, release.version))));
            }
            queue.extend(dependencies.into_iter().rev());

            order.push(key.clone());
            chosen.insert(
                key,
                Resolved { name: requirement.name.clone(), version: release.version, scripts: release.scripts },
            );
        }

        Ok(order.into_iter().filter_map(|key| chosen.remove(&key)).collect())
    }

    fn pick(&self, requirement: &Requirement) -> Option<Release> {
        match &self.mode {
            Mode::Permissive => permissive_version(requirement).map(Release::new),
            Mode::Explicit(packages) => packages
                .get(&requirement.normalized_name())?
                .iter()
                .filter(|r| requirement.matches(&r.version))
                .max_by(|a, b| compare_versions(&a.version, &b.version))
                .cloned(),
        }
    }

    fn unsatisfiable(&self, requirement: &Requirement) -> String {
        let available = match &self.mode {
            Mode::Explicit(packages) => {
                let mut versions: Vec<&str> = packages
                    .get(&requirement.normalized_name())
                    .map(|rs| rs.iter().map(|r| r.version.as_str()).collect())
                    .unwrap_or_default();
                versions.sort_by(|a, b| compare_versions(a, b));
                if versions.is_empty() {
                    "none".to_string()
                } else {
                    versions.join(", ")
                }
            }
            Mode::Permissive => "none".to_string(),
        };
        format!(
            "ERROR: Could not find a version that satisfies the requirement {requirement} (from versions: {available})\n\
             ERROR: No matching distribution found for {requirement}"
        )
    }
}

fn conflict(requirement: &Requirement, parent: Option<&str>, existing: &Resolved) -> String {
    let by = parent.map(|p| format!(" (required by {p})")).unwrap_or_default();
    format!(
        "ERROR: Cannot install {requirement}{by} and {}=={} because these package versions have conflicting dependencies.\n\
         ERROR: ResolutionImpossible",
        existing.name, existing.version
    )
}

/// A version satisfying every constraint, preferring the one the
/// constraints name. `None` when the constraints contradict each other.
fn permissive_version(requirement: &Requirement) -> Option<String> {
    let named = requirement
        .constraints
        .iter()
        .filter(|c| matches!(c.op, Op::Eq | Op::Ge | Op::Le | Op::Compatible))
        .map(|c| base_version(&c.version).to_string());
    let above = requirement.constraints.iter().filter(|c| c.op == Op::Gt).map(|c| bump(base_version(&c.version)));
    let nearby = requirement.constraints.iter().flat_map(|c| {
        let v = base_version(&c.version);
        [v.to_string(), bump(v), format!("{v}.1")]
    });

    named
        .chain(above)
        .chain(std::iter::once("0.0.0".to_string()))
        .chain(nearby)
        .find(|candidate| requirement.matches(candidate))
}

fn base_version(version: &str) -> &str {
    version.strip_suffix(".*").unwrap_or(version)
}

// Next release after `version`: `2.31` -> `2.32`
fn bump(version: &str) -> String {
    match version.rsplit_once('.') {
        Some((head, last)) => match last.parse::<u64>() {
            Ok(n) => format!("{head}.{}", n + 1),
            Err(_) => format!("{version}.1"),
        },
        None => match version.parse::<u64>() {
            Ok(n) => (n + 1).to_string(),
            Err(_) => format!("{version}.1"),
        },
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
