// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

/// Exit status for a failed build or verification.
pub const EXIT_FAILURE: i32 = 1;

/// Exit status for unusable configuration (recipe, overrides, arguments).
pub const EXIT_CONFIG: i32 = 2;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn config(message: impl fmt::Display) -> Self {
        Self::new(EXIT_CONFIG, message.to_string())
    }

    pub fn failure(message: impl fmt::Display) -> Self {
        Self::new(EXIT_FAILURE, message.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
