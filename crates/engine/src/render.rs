// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dockerfile rendering host

use crate::error::BuildFailure;
use crate::host::{Applied, Host, HostError, Verdict};
use crate::pipeline::{BuildReport, Pipeline};
use crate::stages::StagePlan;
use keel_core::instruction::shell_quote;
use keel_core::{BenignExit, EnvValue, Instruction, PostCondition, SystemClock};
use keel_recipe::BuildSpec;

/// Renders instructions into a deterministic Dockerfile
#[derive(Debug, Clone, Default)]
pub struct DockerfileRenderer {
    lines: Vec<String>,
    checks: bool,
}

impl DockerfileRenderer {
    /// `checks` renders post-conditions as `RUN` tests.
    pub fn new(checks: bool) -> Self {
        Self { lines: vec!["# syntax=docker/dockerfile:1".to_string()], checks }
    }
}

impl Host for DockerfileRenderer {
    type Output = String;

    fn begin_stage(&mut self, plan: &StagePlan) {
        self.lines.push(String::new());
        self.lines.push(format!("# {} ({})", plan.stage.label(), plan.requires));
    }

    fn apply(&mut self, instruction: &Instruction) -> Result<Applied, HostError> {
        self.lines.push(render_instruction(instruction));
        Ok(Applied::ok())
    }

    fn verify(&mut self, check: &PostCondition) -> Result<Verdict, HostError> {
        if self.checks {
            self.lines.push(format!("RUN {}", render_check(check)));
        }
        Ok(Verdict::Deferred)
    }

    fn finish(self) -> Result<String, HostError> {
        let mut out = self.lines.join("\n");
        out.push('\n');
        Ok(out)
    }
}

/// Render the standard pipeline for `spec`.
pub fn render_dockerfile(spec: &BuildSpec) -> Result<BuildReport<String>, BuildFailure> {
    Pipeline::standard(spec).run(DockerfileRenderer::new(spec.render_checks), &SystemClock)
}

pub fn render_instruction(instruction: &Instruction) -> String {
    match instruction {
        Instruction::From { image } => format!("FROM {image}"),
        Instruction::Run { command, benign } if benign.is_empty() => format!("RUN {}", command.to_shell()),
        Instruction::Run { command, benign } => format!("RUN {}", guard(&command.to_shell(), benign)),
        Instruction::Env { key, value } => match value {
            EnvValue::Literal(v) => format!("ENV {key}=\"{}\"", escape_env(v)),
            EnvValue::Prepend { entry, var } => format!("ENV {key}=\"{}:${{{var}}}\"", escape_env(entry)),
        },
        Instruction::Workdir { path } => format!("WORKDIR {}", path.display()),
        Instruction::User { name } => format!("USER {name}"),
        Instruction::Copy { source, dest, chown } => match chown {
            Some(owner) => format!("COPY --chown={owner} {} {}", source.display(), dest.display()),
            None => format!("COPY {} {}", source.display(), dest.display()),
        },
        Instruction::Cmd { argv } => {
            let quoted: Vec<String> = argv.iter().map(|a| json_string(a)).collect();
            format!("CMD [{}]", quoted.join(", "))
        }
    }
}

/// Run `line`, passing its exit status through unless it matches an
/// allowed benign condition.
fn guard(line: &str, benign: &[BenignExit]) -> String {
    let allowed: Vec<String> = benign
        .iter()
        .map(|b| {
            format!(
                "{{ [ \"$rc\" -eq {} ] && printf '%s\\n' \"$out\" | grep -qF {}; }}",
                b.exit_code,
                shell_quote(&b.output_contains)
            )
        })
        .collect();
    format!(
        "out=\"$({line} 2>&1)\"; rc=$?; printf '%s\\n' \"$out\"; [ \"$rc\" -eq 0 ] || {} || exit \"$rc\"",
        allowed.join(" || ")
    )
}

fn render_check(check: &PostCondition) -> String {
    match check {
        PostCondition::OwnedBy { root, owner } => {
            let root = shell_quote(&root.display().to_string());
            let owner = shell_quote(owner);
            format!(
                "bad=\"$(find {root} ! -user {owner} -print -quit)\"; \
                 if [ -n \"$bad\" ]; then echo \"ownership check failed: $bad is not owned by \"{owner} >&2; exit 1; fi"
            )
        }
        PostCondition::Absent { path } => {
            let path = shell_quote(&path.display().to_string());
            format!("if [ -e {path} ]; then echo \"unexpected path: \"{path} >&2; exit 1; fi")
        }
    }
}

fn escape_env(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
