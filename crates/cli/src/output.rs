// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use keel_core::{StageOutcome, StageRecord};
use keel_engine::{render_instruction, SimImage, StagePlan};
use serde::Serialize;

use crate::color;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format-branch helper: JSON when `format` is `Json`, otherwise `text_fn`.
pub fn format_or_json<T: Serialize>(format: OutputFormat, data: &T, text_fn: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Text => {
            text_fn();
        }
    }
    Ok(())
}

/// Heading line for a planned stage, e.g. `3. Identity Provisioner [elevated]`.
pub fn plan_heading(index: usize, plan: &StagePlan) -> String {
    format!("{}. {} [{}]", index + 1, plan.stage.label(), plan.requires)
}

/// Plan as text: a heading per stage, its rendered instructions, then its checks.
pub fn plan_lines(plans: &[StagePlan]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, plan) in plans.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(plan_heading(i, plan));
        lines.extend(plan.instructions.iter().map(|ins| format!("    {}", render_instruction(ins))));
        lines.extend(plan.checks.iter().map(|check| format!("    check {check}")));
    }
    lines
}

pub fn print_plan(plans: &[StagePlan]) {
    for line in plan_lines(plans) {
        if line.starts_with(' ') || line.is_empty() {
            println!("{}", color::literal(&line));
        } else {
            println!("{}", color::header(&line));
        }
    }
}

/// One summary line for a stage record.
pub fn stage_line(record: &StageRecord) -> String {
    let mark = match record.outcome {
        StageOutcome::Completed => "ok",
        StageOutcome::Running => "..",
        StageOutcome::Failed(_) => "FAILED",
    };
    let elapsed = record.elapsed_ms().map(|ms| format!(" {ms}ms")).unwrap_or_default();
    format!(
        "{mark:<6} {:<24} {:<10} as {:<12} {} instruction(s){elapsed}",
        record.stage.label(),
        record.privilege.to_string(),
        record.user,
        record.instructions
    )
}

/// Notes under a stage line: tolerated exits, then warnings.
pub fn stage_notes(record: &StageRecord) -> Vec<String> {
    let tolerated = record.tolerated.iter().map(|reason| format!("       tolerated: {reason}"));
    let warnings = record.warnings.iter().map(|w| format!("       {w}"));
    tolerated.chain(warnings).collect()
}

pub fn print_stages(records: &[StageRecord]) {
    for record in records {
        let line = stage_line(record);
        match record.outcome {
            StageOutcome::Failed(_) => println!("{}", color::failed(&line)),
            _ => println!("{}", color::ok(&line)),
        }
        for note in stage_notes(record) {
            println!("{}", color::muted(&note));
        }
    }
}

/// Summary of a simulated image's runtime configuration.
pub fn image_lines(image: &SimImage) -> Vec<String> {
    let mut lines = vec![
        format!("base:    {}", image.base),
        format!("user:    {}", image.config.user),
        format!("workdir: {}", image.config.workdir.display()),
    ];
    if let Some(path) = image.config.env.get("PATH") {
        lines.push(format!("PATH:    {path}"));
    }
    if let Some(cmd) = &image.config.cmd {
        lines.push(format!("cmd:     {}", cmd.join(" ")));
    }
    lines.push(format!("layers:  {}", image.layers.len()));
    lines
}
