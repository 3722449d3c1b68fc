// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess helpers with timeouts

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Timeout for local image metadata lookups.
pub const INSPECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for pulling a base image.
pub const PULL_TIMEOUT: Duration = Duration::from_secs(600);

/// Default timeout for a whole image build.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(3600);

/// Run `cmd` to completion, capturing output. The child is killed if
/// `timeout` elapses first.
pub async fn run_with_timeout(mut cmd: Command, timeout: Duration, description: &str) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(format!("{description}: failed to exec: {e}")),
        Err(_) => Err(format!("{description}: timed out after {}s", timeout.as_secs())),
    }
}
