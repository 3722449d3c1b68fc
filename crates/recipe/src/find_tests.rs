// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use tempfile::TempDir;

const TOML_RECIPE: &str = r#"
base = "python:3.13-slim"

[identity]
name = "xero"
"#;

const JSON_RECIPE: &str = r#"{"base": "python:3.13-slim", "identity": {"name": "xero"}}"#;

#[test]
fn find_single_recipe() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("keel.toml"), TOML_RECIPE).unwrap();

    let path = find_recipe(tmp.path()).unwrap();
    assert_eq!(path, tmp.path().join("keel.toml"));
}

#[test]
fn find_reports_missing_recipe() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("requirements.txt"), "flask\n").unwrap();

    let err = find_recipe(tmp.path()).unwrap_err();
    assert!(matches!(err, RecipeError::NotFound(_)));
}

#[test]
fn find_rejects_multiple_recipes() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("keel.toml"), TOML_RECIPE).unwrap();
    fs::write(tmp.path().join("keel.json"), JSON_RECIPE).unwrap();

    let err = find_recipe(tmp.path()).unwrap_err();
    match err {
        RecipeError::Ambiguous { found, .. } => assert_eq!(found, "keel.toml, keel.json"),
        other => panic!("expected Ambiguous, got {other:?}"),
    }
}

#[test]
fn find_ignores_directories_named_like_recipes() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("keel.hcl")).unwrap();
    fs::write(tmp.path().join("keel.json"), JSON_RECIPE).unwrap();

    assert_eq!(find_recipe(tmp.path()).unwrap(), tmp.path().join("keel.json"));
}

#[test]
fn load_discovered_recipe() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("keel.json"), JSON_RECIPE).unwrap();

    let (path, recipe) = load_recipe(tmp.path(), None).unwrap();
    assert_eq!(path, tmp.path().join("keel.json"));
    assert_eq!(recipe.identity.name, "xero");
}

#[test]
fn load_explicit_recipe_wins_over_discovery() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("keel.toml"), TOML_RECIPE).unwrap();
    fs::write(tmp.path().join("keel.json"), JSON_RECIPE).unwrap();
    let other = tmp.path().join("ci.toml");
    fs::write(&other, TOML_RECIPE.replace("xero", "ci")).unwrap();

    let (_, recipe) = load_recipe(tmp.path(), Some(&other)).unwrap();
    assert_eq!(recipe.identity.name, "ci");
}

#[test]
fn load_rejects_unknown_extension() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("keel.yaml");
    fs::write(&path, "base: python:3.13").unwrap();

    let err = load_recipe(tmp.path(), Some(&path)).unwrap_err();
    assert!(matches!(err, RecipeError::UnsupportedFormat(_)));
}

#[yare::parameterized(
    toml = { "keel.toml", Some(Format::Toml) },
    hcl  = { "keel.hcl",  Some(Format::Hcl) },
    json = { "keel.json", Some(Format::Json) },
    yaml = { "keel.yaml", None },
    none = { "Keelfile",  None },
)]
fn formats_by_extension(name: &str, expected: Option<Format>) {
    assert_eq!(format_for_path(Path::new(name)), expected);
}
