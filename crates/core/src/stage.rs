// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline stages and their execution records.

use crate::privilege::Privilege;
use serde::{Deserialize, Serialize};

/// The provisioning stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Base Runtime Resolver
    BaseRuntime,
    /// System Configuration Stage
    SystemConfig,
    /// Identity Provisioner
    Identity,
    /// Workspace Initializer
    Workspace,
    /// Privilege Dropper
    PrivilegeDrop,
    /// Artifact Materializer
    Artifacts,
    /// Dependency Installer
    Dependencies,
}

impl StageKind {
    pub const ALL: [StageKind; 7] = [
        StageKind::BaseRuntime,
        StageKind::SystemConfig,
        StageKind::Identity,
        StageKind::Workspace,
        StageKind::PrivilegeDrop,
        StageKind::Artifacts,
        StageKind::Dependencies,
    ];

    /// Human-readable component name
    pub fn label(&self) -> &'static str {
        match self {
            StageKind::BaseRuntime => "Base Runtime Resolver",
            StageKind::SystemConfig => "System Configuration",
            StageKind::Identity => "Identity Provisioner",
            StageKind::Workspace => "Workspace Initializer",
            StageKind::PrivilegeDrop => "Privilege Dropper",
            StageKind::Artifacts => "Artifact Materializer",
            StageKind::Dependencies => "Dependency Installer",
        }
    }
}

crate::simple_display! {
    StageKind {
        BaseRuntime => "base_runtime",
        SystemConfig => "system_config",
        Identity => "identity",
        Workspace => "workspace",
        PrivilegeDrop => "privilege_drop",
        Artifacts => "artifacts",
        Dependencies => "dependencies",
    }
}

/// Result of running a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Running,
    Completed,
    Failed(String),
}

impl StageOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StageOutcome::Completed)
    }
}

crate::simple_display! {
    StageOutcome {
        Running => "running",
        Completed => "completed",
        Failed(..) => "failed",
    }
}

/// Record of a stage execution (for build reports)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: StageKind,
    /// Privilege level the stage ran with
    pub privilege: Privilege,
    /// User the stage's instructions ran as (after the stage)
    pub user: String,
    pub started_at_ms: u64,
    pub finished_at_ms: Option<u64>,
    pub outcome: StageOutcome,
    /// Number of instructions applied
    pub instructions: usize,
    /// Reasons of benign exit conditions that were tolerated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerated: Vec<String>,
    /// Warning lines emitted by commands
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl StageRecord {
    pub fn start(stage: StageKind, privilege: Privilege, user: &str, now_ms: u64) -> Self {
        Self {
            stage,
            privilege,
            user: user.to_string(),
            started_at_ms: now_ms,
            finished_at_ms: None,
            outcome: StageOutcome::Running,
            instructions: 0,
            tolerated: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn finish(&mut self, outcome: StageOutcome, now_ms: u64) {
        self.outcome = outcome;
        self.finished_at_ms = Some(now_ms);
    }

    pub fn elapsed_ms(&self) -> Option<u64> {
        self.finished_at_ms.map(|f| f.saturating_sub(self.started_at_ms))
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
