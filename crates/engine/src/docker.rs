// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image builders: hand a rendered Dockerfile to a container engine.

use crate::subprocess::{run_with_timeout, BUILD_TIMEOUT, INSPECT_TIMEOUT, PULL_TIMEOUT};
use async_trait::async_trait;
use keel_core::BaseImage;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("base image {image} could not be resolved: {diagnostics}")]
    Resolution { image: String, diagnostics: String },
    #[error("failed to exec {program}: {source}")]
    Spawn { program: String, source: std::io::Error },
    #[error("image build timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("image build failed with exit status {0}")]
    BuildFailed(i32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything a builder needs to produce an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub dockerfile: String,
    pub context: PathBuf,
    pub tag: String,
}

/// Adapter for an image build backend
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Make sure the base image exists before anything is built.
    async fn resolve_base(&self, image: &BaseImage) -> Result<(), BuilderError>;

    /// Build and tag the image. Tool output streams to the terminal.
    async fn build(&self, request: &BuildRequest) -> Result<(), BuilderError>;
}

/// Builds with the Docker CLI
#[derive(Debug, Clone)]
pub struct DockerBuilder {
    program: String,
    timeout: Duration,
}

impl Default for DockerBuilder {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), timeout: BUILD_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, args: &[&str]) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(args);
        cmd
    }
}

#[async_trait]
impl ImageBuilder for DockerBuilder {
    async fn resolve_base(&self, image: &BaseImage) -> Result<(), BuilderError> {
        let reference = image.to_string();
        let inspect = run_with_timeout(
            self.command(&["image", "inspect", "--format", "{{.Id}}", &reference]),
            INSPECT_TIMEOUT,
            "docker image inspect",
        )
        .await;
        if matches!(&inspect, Ok(output) if output.status.success()) {
            tracing::debug!(image = %reference, "base image present locally");
            return Ok(());
        }

        tracing::info!(image = %reference, "pulling base image");
        let output = run_with_timeout(self.command(&["pull", &reference]), PULL_TIMEOUT, "docker pull")
            .await
            .map_err(|diagnostics| BuilderError::Resolution { image: reference.clone(), diagnostics })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(BuilderError::Resolution {
                image: reference,
                diagnostics: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn build(&self, request: &BuildRequest) -> Result<(), BuilderError> {
        let context = request.context.display().to_string();
        let mut cmd = self.command(&["build", "-f", "-", "-t", &request.tag, &context]);
        cmd.stdin(Stdio::piped()).stdout(Stdio::inherit()).stderr(Stdio::inherit()).kill_on_drop(true);

        tracing::info!(tag = %request.tag, context = %context, "starting image build");
        let mut child =
            cmd.spawn().map_err(|source| BuilderError::Spawn { program: self.program.clone(), source })?;

        if let Some(mut stdin) = child.stdin.take() {
            let write_result = stdin.write_all(request.dockerfile.as_bytes()).await;
            drop(stdin); // close pipe to signal EOF
            match write_result {
                // The builder may exit before reading; its status decides
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => status?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "failed to kill timed out build");
                }
                return Err(BuilderError::Timeout(self.timeout));
            }
        };
        if status.success() {
            tracing::info!(tag = %request.tag, "image built");
            Ok(())
        } else {
            Err(BuilderError::BuildFailed(status.code().unwrap_or(-1)))
        }
    }
}

/// Records what would be built without running anything
#[derive(Debug, Clone, Default)]
pub struct DryRunBuilder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl DryRunBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ImageBuilder for DryRunBuilder {
    async fn resolve_base(&self, image: &BaseImage) -> Result<(), BuilderError> {
        tracing::info!(image = %image, "dry run: would resolve base image");
        self.calls.lock().push(format!("resolve {image}"));
        Ok(())
    }

    async fn build(&self, request: &BuildRequest) -> Result<(), BuilderError> {
        tracing::info!(
            tag = %request.tag,
            context = %request.context.display(),
            bytes = request.dockerfile.len(),
            "dry run: would build image"
        );
        self.calls.lock().push(format!("build {} {}", request.tag, request.context.display()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
