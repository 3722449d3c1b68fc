// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The non-root execution identity that owns all application state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from validating an execution identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("invalid username `{0}`: expected [a-z_][a-z0-9_-]* (max 32 chars)")]
    InvalidUsername(String),
    #[error("the execution identity must not be root")]
    Root,
    #[error("home path `{0}` must be absolute and normalized")]
    InvalidHome(PathBuf),
    #[error("login shell `{0}` must be an absolute path")]
    InvalidShell(String),
    #[error("uid 0 is reserved for root")]
    RootUid,
}

/// Non-root user the application and its dependency installation run as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionIdentity {
    pub username: String,
    pub home: PathBuf,
    pub shell: String,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
}

impl ExecutionIdentity {
    /// Identity with default home (`/home/<name>`), shell, and comment.
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            home: PathBuf::from("/home").join(&username),
            shell: "/bin/bash".to_string(),
            comment: format!("{} application user", username),
            uid: None,
            username,
        }
    }

    crate::setters! {
        into { home: PathBuf, shell: String, comment: String }
        option { uid: u32 }
    }

    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.username == crate::privilege::ROOT_USER {
            return Err(IdentityError::Root);
        }
        if !is_portable_username(&self.username) {
            return Err(IdentityError::InvalidUsername(self.username.clone()));
        }
        if !is_normal_absolute(&self.home) || self.home == Path::new("/") {
            return Err(IdentityError::InvalidHome(self.home.clone()));
        }
        if !self.shell.starts_with('/') {
            return Err(IdentityError::InvalidShell(self.shell.clone()));
        }
        if self.uid == Some(0) {
            return Err(IdentityError::RootUid);
        }
        Ok(())
    }

    /// `user:group` for chown; the user's primary group shares its name.
    pub fn owner_spec(&self) -> String {
        format!("{0}:{0}", self.username)
    }

    /// Identity-local executable directory (`<home>/.local/bin`).
    pub fn local_bin(&self) -> PathBuf {
        self.home.join(".local/bin")
    }

    /// Identity-local package directory for a `major.minor` runtime version.
    pub fn site_packages(&self, runtime_minor: &str) -> PathBuf {
        self.home.join(format!(".local/lib/python{}/site-packages", runtime_minor))
    }

    /// Package manager download/build cache location.
    pub fn pip_cache(&self) -> PathBuf {
        self.home.join(".cache/pip")
    }
}

fn is_portable_username(name: &str) -> bool {
    let mut bytes = name.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    name.len() <= 32
        && (first.is_ascii_lowercase() || first == b'_')
        && bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

/// Absolute, with no `.`/`..` components and no trailing slash.
pub(crate) fn is_normal_absolute(path: &Path) -> bool {
    use std::path::Component;
    if path == Path::new("/") {
        return true;
    }
    path.is_absolute()
        && path.components().all(|c| matches!(c, Component::RootDir | Component::Normal(_)))
        && !path.to_string_lossy().ends_with('/')
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
