// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipe file discovery

use crate::recipe::{parse_recipe_with_format, Format, Recipe, RecipeError};
use std::path::{Path, PathBuf};

/// File names searched for in the build context, in precedence order.
pub const RECIPE_FILE_NAMES: [&str; 3] = ["keel.toml", "keel.hcl", "keel.json"];

/// Locate the single recipe file at the top of the build context.
pub fn find_recipe(context: &Path) -> Result<PathBuf, RecipeError> {
    let found: Vec<PathBuf> = RECIPE_FILE_NAMES
        .iter()
        .map(|name| context.join(name))
        .filter(|path| path.is_file())
        .collect();

    match found.as_slice() {
        [] => Err(RecipeError::NotFound(context.to_path_buf())),
        [single] => Ok(single.clone()),
        many => Err(RecipeError::Ambiguous {
            dir: context.to_path_buf(),
            found: many
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Load the recipe at `explicit`, or discover it in `context`.
pub fn load_recipe(context: &Path, explicit: Option<&Path>) -> Result<(PathBuf, Recipe), RecipeError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_recipe(context)?,
    };
    let format = format_for_path(&path).ok_or_else(|| RecipeError::UnsupportedFormat(path.clone()))?;
    let content = std::fs::read_to_string(&path).map_err(|source| RecipeError::Io { path: path.clone(), source })?;
    let recipe = parse_recipe_with_format(&content, format)?;
    tracing::debug!(path = %path.display(), %format, "loaded recipe");
    Ok((path, recipe))
}

pub fn format_for_path(path: &Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Some(Format::Toml),
        Some("hcl") => Some(Format::Hcl),
        Some("json") => Some(Format::Json),
        _ => None,
    }
}

#[cfg(test)]
#[path = "find_tests.rs"]
mod tests;
