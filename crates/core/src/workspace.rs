// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application workspace inside the execution identity's home tree.
//!
//! The ownership invariant is scoped to the whole home tree, so a
//! workspace outside of it could never be verified and is rejected.

use crate::identity::{is_normal_absolute, ExecutionIdentity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    #[error("workspace path `{0}` must be absolute and normalized")]
    NotNormal(PathBuf),
    #[error("workspace `{workspace}` is outside the home tree `{home}`")]
    OutsideHome { workspace: PathBuf, home: PathBuf },
}

/// The application's working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub path: PathBuf,
}

impl Workspace {
    /// Resolve `dir` against the identity's home. Absolute paths are taken as-is.
    pub fn resolve(identity: &ExecutionIdentity, dir: &Path) -> Result<Self, WorkspaceError> {
        let path = if dir.is_absolute() { dir.to_path_buf() } else { identity.home.join(dir) };
        if !is_normal_absolute(&path) {
            return Err(WorkspaceError::NotNormal(path));
        }
        if !path.starts_with(&identity.home) {
            return Err(WorkspaceError::OutsideHome { workspace: path, home: identity.home.clone() });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
