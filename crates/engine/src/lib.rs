// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! keel-engine: stage planning, the pipeline driver, and its hosts

mod docker;
mod error;
mod host;
mod pipeline;
mod render;
pub mod sim;
mod stages;
mod subprocess;

pub use docker::{BuildRequest, BuilderError, DockerBuilder, DryRunBuilder, ImageBuilder};
pub use error::{BuildError, BuildFailure, ErrorClass};
pub use host::{Applied, Host, HostError, Verdict};
pub use pipeline::{BuildReport, Pipeline};
pub use render::{render_dockerfile, render_instruction, DockerfileRenderer};
pub use sim::{PackageIndex, PipState, Release, SimImage, SimulatedHost, SourceTree};
pub use stages::{plan_stage, required_privilege, StagePlan, PIP_ALREADY_CURRENT};

#[cfg(test)]
mod test_helpers;
