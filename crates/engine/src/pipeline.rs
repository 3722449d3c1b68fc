// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline driver

use crate::error::{BuildError, BuildFailure};
use crate::host::{Applied, Host, HostError, Verdict};
use crate::stages::{plan_stage, StagePlan};
use keel_core::{
    Clock, Command, Instruction, PrivilegeToken, StageKind, StageOutcome, StageRecord,
};
use keel_recipe::BuildSpec;

/// Successful run: stage records plus whatever the host published.
#[derive(Debug)]
pub struct BuildReport<O> {
    pub stages: Vec<StageRecord>,
    pub output: O,
}

/// Ordered stage plans, driven strictly sequentially
#[derive(Debug, Clone)]
pub struct Pipeline {
    plans: Vec<StagePlan>,
}

impl Pipeline {
    /// The seven provisioning stages for `spec`, in order.
    pub fn standard(spec: &BuildSpec) -> Self {
        Self { plans: StageKind::ALL.iter().map(|&stage| plan_stage(stage, spec)).collect() }
    }

    pub fn new(plans: Vec<StagePlan>) -> Self {
        Self { plans }
    }

    pub fn plans(&self) -> &[StagePlan] {
        &self.plans
    }

    /// Drive every stage against `host`, publishing only if all succeed.
    pub fn run<H: Host, C: Clock>(&self, mut host: H, clock: &C) -> Result<BuildReport<H::Output>, BuildFailure> {
        let mut token = PrivilegeToken::elevated();
        let mut records = Vec::with_capacity(self.plans.len());

        for plan in &self.plans {
            let mut record = StageRecord::start(plan.stage, plan.requires, token.user(), clock.epoch_ms());
            tracing::info!(stage = %plan.stage, privilege = %plan.requires, user = token.user(), "stage started");

            match run_stage(plan, &mut host, token, &mut record) {
                Ok(next) => {
                    record.user = next.user().to_string();
                    record.finish(StageOutcome::Completed, clock.epoch_ms());
                    tracing::info!(
                        stage = %plan.stage,
                        instructions = record.instructions,
                        elapsed_ms = record.elapsed_ms().unwrap_or(0),
                        "stage completed"
                    );
                    records.push(record);
                    token = next;
                }
                Err(error) => {
                    tracing::error!(stage = %plan.stage, class = %error.class(), error = %error, "stage failed");
                    record.finish(StageOutcome::Failed(error.to_string()), clock.epoch_ms());
                    records.push(record);
                    return Err(BuildFailure { error, stages: records });
                }
            }
        }

        match host.finish() {
            Ok(output) => Ok(BuildReport { stages: records, output }),
            Err(e) => Err(BuildFailure { error: BuildError::Publish(e), stages: records }),
        }
    }
}

fn run_stage<H: Host>(
    plan: &StagePlan,
    host: &mut H,
    mut token: PrivilegeToken,
    record: &mut StageRecord,
) -> Result<PrivilegeToken, BuildError> {
    token
        .require(plan.requires)
        .map_err(|source| BuildError::Privilege { stage: plan.stage, source })?;
    host.begin_stage(plan);

    for instruction in &plan.instructions {
        if let Instruction::User { name } = instruction {
            token = token
                .switch_user(name)
                .map_err(|source| BuildError::Privilege { stage: plan.stage, source })?;
        }

        tracing::debug!("applying instruction={} {}", instruction.name(), format_fields(instruction));
        let applied = host
            .apply(instruction)
            .map_err(|e| host_error(plan.stage, instruction, e))?;
        record.instructions += 1;

        for warning in applied.warnings() {
            tracing::warn!(stage = %plan.stage, "{}", warning);
            record.warnings.push(warning);
        }

        if applied.success() {
            continue;
        }
        let Instruction::Run { command, benign } = instruction else {
            return Err(command_error(plan.stage, instruction, &applied));
        };
        match benign.iter().find(|b| b.matches(applied.exit_code, &applied.stdout, &applied.stderr)) {
            Some(allowed) => {
                tracing::warn!(
                    stage = %plan.stage,
                    command = command.name(),
                    exit_code = applied.exit_code,
                    reason = %allowed.reason,
                    "tolerated benign exit"
                );
                record.tolerated.push(allowed.reason.clone());
            }
            None => return Err(command_error(plan.stage, instruction, &applied)),
        }
    }

    for check in &plan.checks {
        match host.verify(check).map_err(|e| BuildError::Host { stage: plan.stage, source: e })? {
            Verdict::Holds => tracing::debug!(stage = %plan.stage, %check, "post-condition holds"),
            Verdict::Deferred => tracing::debug!(stage = %plan.stage, %check, "post-condition deferred"),
            Verdict::Violated(detail) => {
                return Err(BuildError::Postcondition { stage: plan.stage, check: check.to_string(), detail })
            }
        }
    }

    Ok(token)
}

fn host_error(stage: StageKind, instruction: &Instruction, error: HostError) -> BuildError {
    match (instruction, error) {
        (Instruction::From { image }, HostError::UnknownImage { message, .. }) => {
            BuildError::Resolution { image: image.to_string(), diagnostics: message }
        }
        (_, source) => BuildError::Host { stage, source },
    }
}

fn command_error(stage: StageKind, instruction: &Instruction, applied: &Applied) -> BuildError {
    let diagnostics = applied.diagnostics();
    match instruction {
        Instruction::Run { command: Command::CreateUser { identity }, .. } => {
            BuildError::IdentityConflict { username: identity.username.clone(), diagnostics }
        }
        Instruction::Run { command: Command::PipInstall { manifest, .. }, .. } => {
            BuildError::DependencyResolution { manifest: manifest.clone(), diagnostics }
        }
        Instruction::Run { command, .. } => BuildError::CommandFailed {
            stage,
            command: command.to_shell(),
            exit_code: applied.exit_code,
            diagnostics,
        },
        other => BuildError::CommandFailed {
            stage,
            command: other.name().to_string(),
            exit_code: applied.exit_code,
            diagnostics,
        },
    }
}

// Format the fields as `key=val`
fn format_fields(instruction: &Instruction) -> String {
    let fields = instruction.fields();
    let cap = fields.iter().map(|(a, b)| a.len() + b.len() + 2).sum();
    let mut fmt = String::with_capacity(cap);
    for (key, val) in fields {
        fmt.push_str(key);
        fmt.push('=');
        fmt.push_str(&val);
        fmt.push(' ');
    }
    fmt.pop();
    fmt
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
