// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `keel build`: verify, render, and hand the Dockerfile to the container engine.

use anyhow::Result;
use clap::Args;
use keel_core::BaseImage;
use keel_engine::{BuildRequest, DockerBuilder, DryRunBuilder, ImageBuilder};

use super::{render, verify, Context};
use crate::env;
use crate::exit_error::ExitError;
use crate::output::print_stages;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Image tag, e.g. `xero-api:latest`
    #[arg(short, long)]
    pub tag: String,

    /// Verify and render, but only log what would be built
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle(args: BuildArgs, ctx: &Context) -> Result<()> {
    match verify::simulate(ctx)? {
        Ok(report) => {
            tracing::info!(
                recipe = %ctx.recipe.display(),
                stages = report.stages.len(),
                layers = report.output.layers.len(),
                "verification passed"
            );
        }
        Err(failure) => {
            print_stages(&failure.stages);
            return Err(ExitError::failure(format!("verification failed: {}", failure.error)).into());
        }
    }

    let request = BuildRequest { dockerfile: render::render(ctx)?, context: ctx.dir.clone(), tag: args.tag };
    if args.dry_run {
        let builder = DryRunBuilder::new();
        run_builder(&builder, &ctx.spec.base, &request).await?;
        for call in builder.calls() {
            println!("dry run: {call}");
        }
        return Ok(());
    }

    let mut builder = DockerBuilder::new(env::docker_program());
    if let Some(timeout) = env::build_timeout() {
        builder = builder.with_timeout(timeout);
    }
    run_builder(&builder, &ctx.spec.base, &request).await?;
    println!("built {}", request.tag);
    Ok(())
}

async fn run_builder(builder: &dyn ImageBuilder, base: &BaseImage, request: &BuildRequest) -> Result<(), ExitError> {
    builder.resolve_base(base).await.map_err(ExitError::failure)?;
    builder.build(request).await.map_err(ExitError::failure)
}
