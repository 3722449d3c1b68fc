// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `keel render`: print or write the Dockerfile.

use anyhow::Result;
use clap::Args;
use keel_engine::render_dockerfile;
use std::path::PathBuf;

use super::Context;
use crate::exit_error::ExitError;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Write the Dockerfile to this path instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn handle(args: RenderArgs, ctx: &Context) -> Result<()> {
    let dockerfile = render(ctx)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, &dockerfile)
                .map_err(|e| ExitError::failure(format!("failed to write {}: {e}", path.display())))?;
            tracing::info!(path = %path.display(), "wrote Dockerfile");
        }
        None => print!("{dockerfile}"),
    }
    Ok(())
}

/// Rendered Dockerfile for the context's spec.
pub fn render(ctx: &Context) -> Result<String, ExitError> {
    render_dockerfile(&ctx.spec).map(|report| report.output).map_err(|failure| ExitError::failure(failure.error))
}
