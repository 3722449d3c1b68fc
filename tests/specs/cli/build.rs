//! Specs for `keel build`.

use crate::prelude::*;

#[test]
fn dry_run_resolves_then_builds() {
    let project = Project::xero();
    let run = project.keel().args(["build", "-t", "xero-api:test", "--dry-run"]).passes();
    run.stdout_has("dry run: resolve python:3.13-slim\n");
    run.stdout_has("dry run: build xero-api:test ");
}

#[test]
fn build_requires_a_tag() {
    let project = Project::xero();
    project.keel().args(["build"]).fails_with(2).stderr_has("--tag");
}

#[test]
fn failed_verification_stops_the_build() {
    let project = Project::xero();
    project.file("keel.toml", &format!("{XERO_RECIPE}\n[dependencies]\npython = \"python9\"\n"));
    project
        .keel()
        .env("KEEL_DOCKER", "/nonexistent/docker")
        .args(["build", "-t", "xero-api:test"])
        .fails_with(1)
        .stdout_has("FAILED")
        .stderr_has("verification failed");
}

#[test]
fn missing_container_engine_fails() {
    let project = Project::xero();
    project
        .keel()
        .env("KEEL_DOCKER", "/nonexistent/docker")
        .args(["build", "-t", "xero-api:test"])
        .fails_with(1)
        .stderr_has("error:");
}

#[test]
fn dry_run_accepts_hash_pinned_and_url_requirements() {
    let project = Project::xero();
    project.file(
        "requirements.txt",
        "flask==3.0.0 \\\n    --hash=sha256:2112aa \\\n    --hash=sha256:ce0b11\nmylib @ git+https://github.com/acme/mylib@v1.0\n",
    );
    project
        .keel()
        .args(["build", "--tag", "x:1", "--dry-run"])
        .passes()
        .stdout_has("dry run: build x:1 ");
}

#[test]
fn build_logs_the_recipe_it_used() {
    let project = Project::xero();
    project
        .keel()
        .env("KEEL_LOG", "info")
        .args(["build", "--tag", "x:1", "--dry-run"])
        .passes()
        .stderr_has("keel.toml")
        .stderr_has("verification passed");
}
