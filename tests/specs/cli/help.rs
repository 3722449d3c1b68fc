//! CLI help output specs

use crate::prelude::*;

#[test]
fn keel_no_args_shows_usage() {
    cli().fails_with(2).stderr_has("Usage:");
}

#[test]
fn keel_help_lists_commands() {
    cli()
        .args(["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("render")
        .stdout_has("plan")
        .stdout_has("verify")
        .stdout_has("build");
}

#[test]
fn keel_build_help_shows_tag() {
    cli().args(["build", "--help"]).passes().stdout_has("--tag").stdout_has("--dry-run");
}

#[test]
fn keel_version_shows_version() {
    cli().args(["--version"]).passes().stdout_has("0.1");
}
