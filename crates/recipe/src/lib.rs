// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! keel-recipe: build recipe parsing, discovery, and validation

mod find;
mod recipe;

pub use find::{find_recipe, format_for_path, load_recipe, RECIPE_FILE_NAMES};
pub use recipe::{
    load_manifest, parse_recipe_with_format, BuildSpec, DependenciesSection, Format, IdentitySection,
    ImageSection, Layering, Recipe, RecipeError, RenderSection, WorkspaceSection,
};
