//! Specs for `keel plan`.

use crate::prelude::*;

#[test]
fn plan_lists_stages_in_order() {
    let project = Project::xero();
    let run = project.keel().args(["plan"]).passes();
    let headings: Vec<&str> = run.stdout.lines().filter(|l| !l.is_empty() && !l.starts_with(' ')).collect();
    assert_eq!(
        headings,
        vec![
            "1. Base Runtime Resolver [elevated]",
            "2. System Configuration [elevated]",
            "3. Identity Provisioner [elevated]",
            "4. Workspace Initializer [elevated]",
            "5. Privilege Dropper [elevated]",
            "6. Artifact Materializer [restricted]",
            "7. Dependency Installer [restricted]",
        ]
    );
    run.stdout_has("    USER xero\n");
}

#[test]
fn plan_as_json() {
    let project = Project::xero();
    let plans = project.keel().args(["plan", "--format", "json"]).passes().json();
    let plans = plans.as_array().cloned().unwrap_or_default();
    assert_eq!(plans.len(), 7);
    assert_eq!(plans[0]["stage"], "base_runtime");
    assert_eq!(plans[4]["requires"], "elevated");
    assert_eq!(plans[5]["requires"], "restricted");
    assert_eq!(plans[6]["stage"], "dependencies");
}
