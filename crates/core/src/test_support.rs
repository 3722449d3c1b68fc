// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{BaseImage, DependencyManifest, ExecutionIdentity};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core model types.
pub mod strategies {
    use crate::ExecutionIdentity;
    use proptest::prelude::*;

    pub fn arb_username() -> impl Strategy<Value = String> {
        "[a-z_][a-z0-9_-]{0,15}".prop_filter("root is not an execution identity", |s| s != "root")
    }

    pub fn arb_identity() -> impl Strategy<Value = ExecutionIdentity> {
        (arb_username(), proptest::option::of(1000u32..60000)).prop_map(|(name, uid)| {
            let identity = ExecutionIdentity::new(name);
            match uid {
                Some(uid) => identity.uid(uid),
                None => identity,
            }
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

pub fn python_slim() -> BaseImage {
    BaseImage {
        registry: None,
        runtime: "python".to_string(),
        version: "3.13".to_string(),
        variant: Some("slim".to_string()),
        digest: None,
    }
}

pub fn xero() -> ExecutionIdentity {
    ExecutionIdentity::new("xero")
}

pub fn manifest(entries: &[&str]) -> DependencyManifest {
    DependencyManifest::parse("requirements.txt", &entries.join("\n"))
}
