// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `keel verify`: simulate the pipeline against the build context.

use anyhow::Result;
use clap::Args;
use keel_core::{StageKind, StageRecord, SystemClock};
use keel_engine::{BuildFailure, BuildReport, ErrorClass, PackageIndex, Pipeline, SimImage, SimulatedHost, SourceTree};
use keel_recipe::load_manifest;
use serde::Serialize;

use super::Context;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, image_lines, print_stages, OutputFormat};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub type Simulation = Result<BuildReport<SimImage>, BuildFailure>;

/// Run the standard pipeline on a simulated host seeded with the context's files.
///
/// Every well-formed requirement resolves; the outer error covers problems
/// found before any stage runs.
pub fn simulate(ctx: &Context) -> Result<Simulation, ExitError> {
    let manifest = load_manifest(&ctx.dir, &ctx.spec).map_err(ExitError::failure)?;
    if let Err(e) = manifest.requirements() {
        return Err(ExitError::failure(format!("{}: {e}", manifest.path.display())));
    }
    for entry in manifest.unsupported() {
        tracing::warn!(manifest = %manifest.path.display(), entry, "requirement is not simulated");
    }
    let source = SourceTree::from_dir(&ctx.dir)
        .map_err(|e| ExitError::failure(format!("failed to read build context {}: {e}", ctx.dir.display())))?;
    tracing::debug!(files = source.len(), "simulating build");
    let host = SimulatedHost::new(source, PackageIndex::permissive());
    Ok(Pipeline::standard(&ctx.spec).run(host, &SystemClock))
}

#[derive(Serialize)]
struct ErrorSummary {
    class: ErrorClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<StageKind>,
    message: String,
}

#[derive(Serialize)]
struct VerifyReport<'a> {
    ok: bool,
    stages: &'a [StageRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a SimImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorSummary>,
}

pub fn handle(args: VerifyArgs, ctx: &Context) -> Result<()> {
    match simulate(ctx)? {
        Ok(report) => {
            let data = VerifyReport { ok: true, stages: &report.stages, image: Some(&report.output), error: None };
            format_or_json(args.format, &data, || {
                print_stages(&report.stages);
                println!();
                for line in image_lines(&report.output) {
                    println!("{line}");
                }
            })
        }
        Err(failure) => {
            let error = ErrorSummary {
                class: failure.error.class(),
                stage: failure.error.stage(),
                message: failure.error.to_string(),
            };
            let data = VerifyReport { ok: false, stages: &failure.stages, image: None, error: Some(error) };
            format_or_json(args.format, &data, || print_stages(&failure.stages))?;
            Err(ExitError::failure(format!("verification failed ({}): {}", failure.error.class(), failure.error)).into())
        }
    }
}
