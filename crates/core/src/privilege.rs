// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic privilege capability threaded through the pipeline.
//!
//! A [`PrivilegeToken`] starts out elevated (root) exactly once per
//! pipeline run. It is not `Clone`: the only transition is consuming it
//! into a restricted token for the execution identity, and no method
//! turns a restricted token back into an elevated one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the superuser.
pub const ROOT_USER: &str = "root";

/// Privilege level a stage requires or a context holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    Elevated,
    Restricted,
}

crate::simple_display! {
    Privilege {
        Elevated => "elevated",
        Restricted => "restricted",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrivilegeError {
    #[error("stage requires {required} privilege but the context is {current}")]
    Mismatch { required: Privilege, current: Privilege },
    #[error("cannot re-escalate to `{target}` after dropping privilege to `{identity}`")]
    Escalation { identity: String, target: String },
    #[error("cannot switch from `{identity}` to `{target}` after dropping privilege")]
    IdentitySwitch { identity: String, target: String },
}

/// Execution context capability: elevated (root) or restricted to one identity.
#[derive(Debug, PartialEq, Eq)]
pub struct PrivilegeToken {
    identity: Option<String>,
}

impl PrivilegeToken {
    /// The initial root context of a pipeline run.
    pub fn elevated() -> Self {
        Self { identity: None }
    }

    pub fn level(&self) -> Privilege {
        match self.identity {
            None => Privilege::Elevated,
            Some(_) => Privilege::Restricted,
        }
    }

    /// User the context currently runs as.
    pub fn user(&self) -> &str {
        self.identity.as_deref().unwrap_or(ROOT_USER)
    }

    /// Require the context to hold exactly `required`.
    pub fn require(&self, required: Privilege) -> Result<(), PrivilegeError> {
        let current = self.level();
        if current == required {
            Ok(())
        } else {
            Err(PrivilegeError::Mismatch { required, current })
        }
    }

    /// Apply a `USER` switch.
    ///
    /// `target` may be `name`, `name:group`, or a numeric uid. Switching to
    /// root while elevated is a no-op; switching to root after the drop is
    /// an escalation. Once restricted, only the same identity is accepted.
    pub fn switch_user(self, target: &str) -> Result<Self, PrivilegeError> {
        let user = target.split(':').next().unwrap_or(target);
        let targets_root = user == ROOT_USER || user == "0";
        match (self.identity, targets_root) {
            (None, true) => Ok(Self { identity: None }),
            (None, false) => Ok(Self { identity: Some(user.to_string()) }),
            (Some(identity), true) => {
                Err(PrivilegeError::Escalation { identity, target: target.to_string() })
            }
            (Some(identity), false) if identity == user => Ok(Self { identity: Some(identity) }),
            (Some(identity), false) => {
                Err(PrivilegeError::IdentitySwitch { identity, target: target.to_string() })
            }
        }
    }
}

#[cfg(test)]
#[path = "privilege_tests.rs"]
mod tests;
