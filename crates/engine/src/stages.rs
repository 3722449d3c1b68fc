// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage planning: one function per provisioning component.
//!
//! Each stage declares the privilege it requires, the instructions it
//! applies, and the post-conditions that must hold once it is done.

use keel_core::{
    BenignExit, Command, EnvValue, Instruction, PostCondition, Privilege, StageKind,
};
use keel_recipe::{BuildSpec, Layering};
use serde::Serialize;
use std::path::PathBuf;

/// Output text pip prints when the installed version is already the newest.
pub const PIP_ALREADY_CURRENT: &str = "Requirement already satisfied: pip";

/// Ordered instructions and checks of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    pub stage: StageKind,
    pub requires: Privilege,
    pub instructions: Vec<Instruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<PostCondition>,
}

impl StagePlan {
    fn new(stage: StageKind, requires: Privilege) -> Self {
        Self { stage, requires, instructions: Vec::new(), checks: Vec::new() }
    }
}

/// Privilege a stage must run with. Everything up to and including the
/// drop runs as root; everything after runs as the execution identity.
pub fn required_privilege(stage: StageKind) -> Privilege {
    match stage {
        StageKind::BaseRuntime
        | StageKind::SystemConfig
        | StageKind::Identity
        | StageKind::Workspace
        | StageKind::PrivilegeDrop => Privilege::Elevated,
        StageKind::Artifacts | StageKind::Dependencies => Privilege::Restricted,
    }
}

pub fn plan_stage(stage: StageKind, spec: &BuildSpec) -> StagePlan {
    match stage {
        StageKind::BaseRuntime => base_runtime(spec),
        StageKind::SystemConfig => system_config(spec),
        StageKind::Identity => identity(spec),
        StageKind::Workspace => workspace(spec),
        StageKind::PrivilegeDrop => privilege_drop(spec),
        StageKind::Artifacts => artifacts(spec),
        StageKind::Dependencies => dependencies(spec),
    }
}

fn base_runtime(spec: &BuildSpec) -> StagePlan {
    let mut plan = StagePlan::new(StageKind::BaseRuntime, required_privilege(StageKind::BaseRuntime));
    plan.instructions.push(Instruction::From { image: spec.base.clone() });
    plan
}

fn system_config(spec: &BuildSpec) -> StagePlan {
    let mut plan = StagePlan::new(StageKind::SystemConfig, required_privilege(StageKind::SystemConfig));
    plan.instructions
        .push(Instruction::run(Command::LinkTimezone { zone: spec.timezone.clone() }));
    plan
}

fn identity(spec: &BuildSpec) -> StagePlan {
    let mut plan = StagePlan::new(StageKind::Identity, required_privilege(StageKind::Identity));
    plan.instructions
        .push(Instruction::run(Command::CreateUser { identity: spec.identity.clone() }));
    plan.checks.push(owned_home(spec));
    plan
}

fn workspace(spec: &BuildSpec) -> StagePlan {
    let mut plan = StagePlan::new(StageKind::Workspace, required_privilege(StageKind::Workspace));
    let dir = spec.workspace.path().to_path_buf();
    plan.instructions.push(Instruction::run(Command::MakeDir { path: dir.clone() }));
    plan.instructions.push(Instruction::Workdir { path: dir });
    plan.instructions.push(Instruction::run(Command::Chown {
        owner: spec.identity.owner_spec(),
        path: spec.identity.home.clone(),
        recursive: true,
    }));
    plan.checks.push(owned_home(spec));
    plan
}

fn privilege_drop(spec: &BuildSpec) -> StagePlan {
    let mut plan = StagePlan::new(StageKind::PrivilegeDrop, required_privilege(StageKind::PrivilegeDrop));
    plan.instructions.push(Instruction::User { name: spec.identity.username.clone() });
    plan
}

fn artifacts(spec: &BuildSpec) -> StagePlan {
    let mut plan = StagePlan::new(StageKind::Artifacts, required_privilege(StageKind::Artifacts));
    let copy = match spec.layering {
        Layering::Tree => copy_tree(spec),
        // The full tree follows the install, in the dependency stage
        Layering::ManifestFirst => Instruction::Copy {
            source: spec.manifest.clone(),
            dest: spec.workspace.path().join(&spec.manifest),
            chown: Some(spec.identity.owner_spec()),
        },
    };
    plan.instructions.push(copy);
    plan.checks.push(owned_workspace(spec));
    plan
}

fn dependencies(spec: &BuildSpec) -> StagePlan {
    let mut plan = StagePlan::new(StageKind::Dependencies, required_privilege(StageKind::Dependencies));
    plan.instructions.push(Instruction::Env {
        key: "PATH".to_string(),
        value: EnvValue::Prepend {
            entry: spec.identity.local_bin().display().to_string(),
            var: "PATH".to_string(),
        },
    });
    plan.instructions.push(Instruction::Run {
        command: Command::PipSelfUpgrade { python: spec.python.clone() },
        benign: vec![BenignExit::new(1, PIP_ALREADY_CURRENT, "package manager already current")],
    });
    plan.instructions.push(Instruction::run(Command::PipInstall {
        python: spec.python.clone(),
        manifest: spec.manifest.clone(),
        user: true,
        no_cache: true,
        quiet_script_location: true,
    }));
    if spec.layering == Layering::ManifestFirst {
        plan.instructions.push(copy_tree(spec));
    }
    if let Some(argv) = &spec.command {
        plan.instructions.push(Instruction::Cmd { argv: argv.clone() });
    }
    plan.checks.push(owned_home(spec));
    plan.checks.push(PostCondition::Absent { path: spec.identity.pip_cache() });
    plan
}

fn copy_tree(spec: &BuildSpec) -> Instruction {
    Instruction::Copy {
        source: PathBuf::from("."),
        dest: spec.workspace.path().to_path_buf(),
        chown: Some(spec.identity.owner_spec()),
    }
}

fn owned_home(spec: &BuildSpec) -> PostCondition {
    PostCondition::OwnedBy { root: spec.identity.home.clone(), owner: spec.identity.username.clone() }
}

fn owned_workspace(spec: &BuildSpec) -> PostCondition {
    PostCondition::OwnedBy {
        root: spec.workspace.path().to_path_buf(),
        owner: spec.identity.username.clone(),
    }
}

#[cfg(test)]
#[path = "stages_tests.rs"]
mod tests;
