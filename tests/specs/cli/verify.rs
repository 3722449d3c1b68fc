//! Specs for `keel verify`.

use crate::prelude::*;

#[test]
fn verify_reports_every_stage() {
    let project = Project::xero();
    project
        .keel()
        .args(["verify"])
        .passes()
        .stdout_has("Base Runtime Resolver")
        .stdout_has("Dependency Installer")
        .stdout_has("user:    xero")
        .stdout_has("workdir: /home/xero/project")
        .stdout_has("cmd:     python xero_api_test.py");
}

#[test]
fn verify_as_json() {
    let project = Project::xero();
    let report = project.keel().args(["verify", "--format", "json"]).passes().json();
    assert_eq!(report["ok"], true);
    assert_eq!(report["stages"].as_array().map(Vec::len), Some(7));
    assert_eq!(report["stages"][3]["user"], "root");
    assert_eq!(report["stages"][4]["user"], "xero");
    assert_eq!(report["image"]["config"]["user"], "xero");
    assert!(report.get("error").is_none());
}

#[test]
fn verify_fails_on_missing_interpreter() {
    let project = Project::xero();
    project.file("keel.toml", &format!("{XERO_RECIPE}\n[dependencies]\npython = \"python9\"\n"));
    let run = project.keel().args(["verify", "--format", "json"]).fails_with(1);
    run.stderr_has("verification failed (command_failed)");

    let report = run.json();
    assert_eq!(report["ok"], false);
    assert_eq!(report["error"]["class"], "command_failed");
    assert_eq!(report["error"]["stage"], "dependencies");
    assert!(report.get("image").is_none());
}

#[test]
fn verify_requires_the_manifest() {
    let project = Project::xero();
    std::fs::remove_file(project.path().join("requirements.txt")).ok();
    project.keel().args(["verify"]).fails_with(1).stderr_has("requirements.txt not found");
}

#[test]
fn verify_rejects_contradictory_constraints() {
    let project = Project::xero();
    project.file("requirements.txt", "flask==3.0.0,!=3.0.0\nrequests>3,<2\n");
    let report = project.keel().args(["verify", "--format", "json"]).fails_with(1).json();
    assert_eq!(report["ok"], false);
    assert_eq!(report["error"]["class"], "dependency_resolution");
    assert_eq!(report["error"]["stage"], "dependencies");
}
