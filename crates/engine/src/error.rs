// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build failure taxonomy

use crate::host::HostError;
use keel_core::{PrivilegeError, StageKind, StageRecord};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure class, stable for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Resolution,
    IdentityConflict,
    DependencyResolution,
    CommandFailed,
    Privilege,
    Postcondition,
    Host,
}

keel_core::simple_display! {
    ErrorClass {
        Resolution => "resolution",
        IdentityConflict => "identity_conflict",
        DependencyResolution => "dependency_resolution",
        CommandFailed => "command_failed",
        Privilege => "privilege",
        Postcondition => "postcondition",
        Host => "host",
    }
}

/// Errors that abort a pipeline run. Tool diagnostics are carried verbatim.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("base image {image} could not be resolved: {diagnostics}")]
    Resolution { image: String, diagnostics: String },

    #[error("identity `{username}` conflicts with an existing account or home: {diagnostics}")]
    IdentityConflict { username: String, diagnostics: String },

    #[error("dependencies in {} could not be installed:\n{diagnostics}", manifest.display())]
    DependencyResolution { manifest: PathBuf, diagnostics: String },

    #[error("{stage} stage: `{command}` exited with status {exit_code}: {diagnostics}")]
    CommandFailed { stage: StageKind, command: String, exit_code: i32, diagnostics: String },

    #[error("{stage} stage: {source}")]
    Privilege { stage: StageKind, source: PrivilegeError },

    #[error("{stage} stage: post-condition {check} failed: {detail}")]
    Postcondition { stage: StageKind, check: String, detail: String },

    #[error("{stage} stage: {source}")]
    Host { stage: StageKind, source: HostError },

    #[error("publishing image: {0}")]
    Publish(HostError),
}

impl BuildError {
    pub fn class(&self) -> ErrorClass {
        match self {
            BuildError::Resolution { .. } => ErrorClass::Resolution,
            BuildError::IdentityConflict { .. } => ErrorClass::IdentityConflict,
            BuildError::DependencyResolution { .. } => ErrorClass::DependencyResolution,
            BuildError::CommandFailed { .. } => ErrorClass::CommandFailed,
            BuildError::Privilege { .. } => ErrorClass::Privilege,
            BuildError::Postcondition { .. } => ErrorClass::Postcondition,
            BuildError::Host { .. } | BuildError::Publish(_) => ErrorClass::Host,
        }
    }

    /// Stage the failure occurred in, if any.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            BuildError::Resolution { .. } => Some(StageKind::BaseRuntime),
            BuildError::IdentityConflict { .. } => Some(StageKind::Identity),
            BuildError::DependencyResolution { .. } => Some(StageKind::Dependencies),
            BuildError::CommandFailed { stage, .. }
            | BuildError::Privilege { stage, .. }
            | BuildError::Postcondition { stage, .. }
            | BuildError::Host { stage, .. } => Some(*stage),
            BuildError::Publish(_) => None,
        }
    }
}

/// A failed run: the error plus the records of every stage that started.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct BuildFailure {
    pub error: BuildError,
    pub stages: Vec<StageRecord>,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
