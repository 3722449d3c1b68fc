// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host abstraction the pipeline applies instructions to

use crate::stages::StagePlan;
use keel_core::{Instruction, PostCondition};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a host itself, as opposed to a failing command
#[derive(Debug, Error)]
pub enum HostError {
    #[error("base image {image} is not available: {message}")]
    UnknownImage { image: String, message: String },
    #[error("no base image has been set")]
    NoBase,
    #[error("unknown user `{0}`")]
    UnknownUser(String),
    #[error("copy source {} not found in the build context", .0.display())]
    MissingSource(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result of applying one instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Applied {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// `WARNING` lines from either stream, in emission order (stdout first).
    pub fn warnings(&self) -> Vec<String> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .filter(|line| line.starts_with("WARNING"))
            .map(str::to_string)
            .collect()
    }

    /// Diagnostics for an error report: stderr when present, else stdout.
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Outcome of checking a post-condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Holds,
    Violated(String),
    /// The host cannot evaluate the check now; it is carried into the output
    Deferred,
}

/// Something that can carry out a pipeline: render it, simulate it, or run it.
pub trait Host {
    type Output;

    /// Called before each stage's instructions.
    fn begin_stage(&mut self, _plan: &StagePlan) {}

    fn apply(&mut self, instruction: &Instruction) -> Result<Applied, HostError>;

    fn verify(&mut self, check: &PostCondition) -> Result<Verdict, HostError>;

    /// Publish the result. Only called once every stage succeeded.
    fn finish(self) -> Result<Self::Output, HostError>;
}
