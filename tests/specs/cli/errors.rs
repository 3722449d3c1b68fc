//! Exit codes for configuration and input errors.

use crate::prelude::*;

#[test]
fn missing_recipe_exits_with_config_error() {
    let project = Project::empty();
    project.keel().args(["render"]).fails_with(2).stderr_has("no recipe found");
}

#[test]
fn ambiguous_recipes_exit_with_config_error() {
    let project = Project::xero();
    project.file("keel.json", r#"{ "base": "python:3.13-slim", "identity": { "name": "xero" } }"#);
    project.keel().args(["plan"]).fails_with(2).stderr_has("--recipe");
}

#[test]
fn explicit_recipe_resolves_ambiguity() {
    let project = Project::xero();
    project.file("keel.json", r#"{ "base": "python:3.13-slim", "identity": { "name": "other" } }"#);
    project.keel().args(["--recipe", "keel.json", "plan"]).passes().stdout_has("USER other");
}

#[test]
fn floating_base_tag_is_rejected() {
    let project = Project::xero();
    project.file("keel.toml", "base = \"python:latest\"\n[identity]\nname = \"xero\"\n");
    project.keel().args(["render"]).fails_with(2).stderr_has("error:");
}

#[test]
fn root_identity_is_rejected() {
    let project = Project::xero();
    project.file("keel.toml", "base = \"python:3.13-slim\"\n[identity]\nname = \"root\"\n");
    project.keel().args(["plan"]).fails_with(2).stderr_has("invalid recipe");
}

#[test]
fn unknown_recipe_keys_are_rejected() {
    let project = Project::xero();
    project.file("keel.toml", &format!("{XERO_RECIPE}\nsudo = true\n"));
    project.keel().args(["plan"]).fails_with(2).stderr_has("failed to parse TOML recipe");
}

#[test]
fn malformed_requirement_fails_before_stages() {
    let project = Project::xero();
    project.file("requirements.txt", "flask===\n");
    project.keel().args(["verify"]).fails_with(1).stderr_has("requirements.txt");
}
