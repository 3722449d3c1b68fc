//! Specs for `keel render`.

use crate::prelude::*;

#[test]
fn render_prints_the_dockerfile() {
    let project = Project::xero();
    let run = project.keel().args(["render"]).passes();
    run.stdout_has("FROM python:3.13-slim\n")
        .stdout_has("USER xero\n")
        .stdout_has("COPY --chown=xero:xero . /home/xero/project\n")
        .stdout_has("ENV PATH=\"/home/xero/.local/bin:${PATH}\"\n")
        .stdout_has("CMD [\"python\", \"xero_api_test.py\"]\n");

    let lines: Vec<&str> = run.stdout.lines().collect();
    let position = |prefix: &str| lines.iter().position(|l| l.starts_with(prefix));
    assert!(position("RUN useradd") < position("USER xero"));
    assert!(position("USER xero") < position("COPY"));
}

#[test]
fn render_writes_output_file() {
    let project = Project::xero();
    let target = project.path().join("out/Dockerfile");
    std::fs::create_dir_all(project.path().join("out")).ok();
    project.keel().args(["render", "-o"]).arg(&target).passes();
    assert!(project.read("out/Dockerfile").starts_with("# syntax=docker/dockerfile:1\n"));
}

#[test]
fn render_matches_across_recipe_formats() {
    let toml = Project::xero();
    let json = Project::xero();
    std::fs::remove_file(json.path().join("keel.toml")).ok();
    json.file(
        "keel.json",
        r#"{
  "base": "python:3.13-slim",
  "timezone": "America/Los_Angeles",
  "identity": { "name": "xero", "comment": "Xero API user" },
  "image": { "command": ["python", "xero_api_test.py"] }
}"#,
    );

    let expected = toml.keel().args(["render"]).passes().stdout.clone();
    let actual = json.keel().args(["render"]).passes().stdout.clone();
    similar_asserts::assert_eq!(expected, actual);
}

#[test]
fn render_without_checks() {
    let project = Project::xero();
    project.file("keel.toml", &format!("{XERO_RECIPE}\n[render]\nchecks = false\n"));
    project.keel().args(["render"]).passes().stdout_lacks("ownership check failed");
}

#[test]
fn base_image_override_from_environment() {
    let project = Project::xero();
    project
        .keel()
        .env("KEEL_BASE_IMAGE", "python:3.12-slim")
        .args(["render"])
        .passes()
        .stdout_has("FROM python:3.12-slim\n");
}
