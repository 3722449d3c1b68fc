// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `keel plan`: the ordered stages with their privilege levels.

use anyhow::Result;
use clap::Args;
use keel_engine::Pipeline;

use super::Context;
use crate::output::{format_or_json, print_plan, OutputFormat};

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub fn handle(args: PlanArgs, ctx: &Context) -> Result<()> {
    let pipeline = Pipeline::standard(&ctx.spec);
    format_or_json(args.format, &pipeline.plans(), || print_plan(pipeline.plans()))
}
