// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod build;
pub mod plan;
pub mod render;
pub mod verify;

use keel_core::BaseImage;
use keel_recipe::{load_recipe, BuildSpec};
use std::path::{Path, PathBuf};

use crate::env;
use crate::exit_error::ExitError;

/// A loaded build context: where it lives and what it builds.
#[derive(Debug)]
pub struct Context {
    pub dir: PathBuf,
    pub recipe: PathBuf,
    pub spec: BuildSpec,
}

impl Context {
    /// Load the recipe for `dir`.
    ///
    /// `explicit` (the `--recipe` flag) wins over `KEEL_RECIPE`; a relative
    /// recipe path is taken relative to `dir`. `KEEL_BASE_IMAGE` replaces the
    /// recipe's base before validation.
    pub fn load(dir: &Path, explicit: Option<&Path>) -> Result<Self, ExitError> {
        if !dir.is_dir() {
            return Err(ExitError::config(format!("build context {} is not a directory", dir.display())));
        }
        let explicit = explicit.map(Path::to_path_buf).or_else(env::recipe_path).map(|p| dir.join(p));
        let (path, mut recipe) = load_recipe(dir, explicit.as_deref()).map_err(ExitError::config)?;

        if let Some(reference) = env::base_image() {
            recipe.base = BaseImage::parse(&reference)
                .map_err(|e| ExitError::config(format!("KEEL_BASE_IMAGE: {e}")))?;
            tracing::info!(base = %recipe.base, "base image overridden from environment");
        }

        let spec = recipe.validate().map_err(ExitError::config)?;
        tracing::debug!(recipe = %path.display(), identity = %spec.identity.username, "build context loaded");
        Ok(Self { dir: dir.to_path_buf(), recipe: path, spec })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
