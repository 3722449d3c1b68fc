// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.

use std::path::PathBuf;
use std::time::Duration;

/// Log filter when neither `KEEL_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Recipe file override, used when `--recipe` is not given.
pub fn recipe_path() -> Option<PathBuf> {
    std::env::var("KEEL_RECIPE").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Base image reference that replaces the recipe's `base`.
pub fn base_image() -> Option<String> {
    std::env::var("KEEL_BASE_IMAGE").ok().filter(|s| !s.is_empty())
}

/// Container engine CLI used by `keel build`.
pub fn docker_program() -> String {
    std::env::var("KEEL_DOCKER").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "docker".to_string())
}

/// Whole-build timeout override
pub fn build_timeout() -> Option<Duration> {
    std::env::var("KEEL_BUILD_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Tracing filter: `KEEL_LOG` > `RUST_LOG` > `warn`
pub fn log_filter() -> String {
    ["KEEL_LOG", "RUST_LOG"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
