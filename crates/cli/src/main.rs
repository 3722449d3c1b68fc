// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! keel - provision Python application images that run as a non-root user

mod color;
mod commands;
mod env;
mod exit_error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commands::{build, plan, render, verify, Context};
use exit_error::ExitError;

/// keel - provision Python application images that run as a non-root user
#[derive(Parser, Debug)]
#[command(name = "keel", version, about, styles = color::styles())]
struct Cli {
    /// Build context directory
    #[arg(short = 'C', long = "context", global = true, default_value = ".")]
    context: PathBuf,

    /// Recipe file (default: keel.toml, keel.hcl, or keel.json in the context)
    #[arg(long, global = true)]
    recipe: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the Dockerfile
    Render(render::RenderArgs),
    /// Show the ordered stages with their privilege levels
    Plan(plan::PlanArgs),
    /// Simulate the pipeline against the build context
    Verify(verify::VerifyArgs),
    /// Verify, render, and build the image
    Build(build::BuildArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_new(env::log_filter()).unwrap_or_else(|_| EnvFilter::new(env::DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(&cli.context, cli.recipe.as_deref())?;
    match cli.command {
        Commands::Render(args) => render::handle(args, &ctx),
        Commands::Plan(args) => plan::handle(args, &ctx),
        Commands::Verify(args) => verify::handle(args, &ctx),
        Commands::Build(args) => build::handle(args, &ctx).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(err) = run(cli).await {
        let code = match err.downcast_ref::<ExitError>() {
            Some(exit) => exit.code,
            None => exit_error::EXIT_FAILURE,
        };
        eprintln!("error: {err:#}");
        std::process::exit(code);
    }
}
