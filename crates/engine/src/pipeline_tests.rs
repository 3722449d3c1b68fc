// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::stages::PIP_ALREADY_CURRENT;
use crate::test_helpers::xero_spec;
use keel_core::{BenignExit, FakeClock, PostCondition, Privilege, PrivilegeError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Host double that records calls and answers from scripted tables.
#[derive(Clone, Default)]
struct FakeHost {
    log: Arc<Mutex<Vec<String>>>,
    // Instruction name (or command name for RUN) -> scripted result
    results: HashMap<&'static str, Applied>,
    errors: HashMap<&'static str, fn() -> HostError>,
    violated: Option<PostCondition>,
}

impl FakeHost {
    fn answer(mut self, name: &'static str, applied: Applied) -> Self {
        self.results.insert(name, applied);
        self
    }

    fn error(mut self, name: &'static str, make: fn() -> HostError) -> Self {
        self.errors.insert(name, make);
        self
    }

    fn violate(mut self, check: PostCondition) -> Self {
        self.violated = Some(check);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

fn key(instruction: &Instruction) -> &'static str {
    match instruction {
        Instruction::Run { command, .. } => command.name(),
        other => other.name(),
    }
}

impl Host for FakeHost {
    type Output = usize;

    fn begin_stage(&mut self, plan: &StagePlan) {
        self.log.lock().push(format!("stage {}", plan.stage));
    }

    fn apply(&mut self, instruction: &Instruction) -> Result<Applied, HostError> {
        let name = key(instruction);
        self.log.lock().push(format!("apply {name}"));
        if let Some(make) = self.errors.get(name) {
            return Err(make());
        }
        Ok(self.results.get(name).cloned().unwrap_or_default())
    }

    fn verify(&mut self, check: &PostCondition) -> Result<Verdict, HostError> {
        self.log.lock().push(format!("verify {check}"));
        if self.violated.as_ref() == Some(check) {
            return Ok(Verdict::Violated("nope".to_string()));
        }
        Ok(Verdict::Holds)
    }

    fn finish(self) -> Result<usize, HostError> {
        let mut log = self.log.lock();
        log.push("finish".to_string());
        Ok(log.len())
    }
}

fn exit(code: i32, stdout: &str, stderr: &str) -> Applied {
    Applied { exit_code: code, stdout: stdout.to_string(), stderr: stderr.to_string() }
}

fn run(host: FakeHost) -> Result<BuildReport<usize>, BuildFailure> {
    Pipeline::standard(&xero_spec()).run(host, &FakeClock::new())
}

fn run_err(host: FakeHost) -> BuildFailure {
    match run(host) {
        Ok(_) => panic!("pipeline unexpectedly succeeded"),
        Err(failure) => failure,
    }
}

#[test]
fn stages_run_in_order_then_publish() {
    let host = FakeHost::default();
    let log = host.log.clone();
    let report = run(host).unwrap();

    let stages: Vec<StageKind> = report.stages.iter().map(|r| r.stage).collect();
    assert_eq!(stages, StageKind::ALL.to_vec());
    let calls = log.lock().clone();
    assert_eq!(calls.first().map(String::as_str), Some("stage base_runtime"));
    assert_eq!(calls.last().map(String::as_str), Some("finish"));
    assert_eq!(report.output, calls.len());
}

#[test]
fn checks_run_after_instructions() {
    let host = FakeHost::default();
    let log = host.log.clone();
    run(host).unwrap();
    let calls = log.lock().clone();
    let identity = calls.iter().position(|c| c == "stage identity").unwrap();
    assert_eq!(calls[identity + 1], "apply create_user");
    assert_eq!(calls[identity + 2], "verify owned_by(/home/xero, xero)");
}

#[test]
fn records_count_instructions() {
    let report = run(FakeHost::default()).unwrap();
    let counts: Vec<usize> = report.stages.iter().map(|r| r.instructions).collect();
    assert_eq!(counts, vec![1, 1, 1, 3, 1, 1, 4]);
}

#[test]
fn benign_self_check_is_tolerated() {
    let noise = format!("{PIP_ALREADY_CURRENT} in /usr/local/lib/python3.13/site-packages (24.0)");
    let report = run(FakeHost::default().answer("pip_self_upgrade", exit(1, &noise, ""))).unwrap();
    let deps = report.stages.last().unwrap();
    assert_eq!(deps.tolerated, vec!["package manager already current".to_string()]);
    assert!(deps.outcome.is_completed());
}

#[yare::parameterized(
    other_exit_code = { 2, PIP_ALREADY_CURRENT },
    other_output    = { 1, "ERROR: network unreachable" },
)]
fn unmatched_failure_aborts(code: i32, output: &str) {
    let host = FakeHost::default().answer("pip_self_upgrade", exit(code, "", output));
    let calls = host.log.clone();
    let failure = run_err(host);

    let BuildError::CommandFailed { stage, exit_code, command, diagnostics } = &failure.error else {
        panic!("expected command failure, got {:?}", failure.error);
    };
    assert_eq!(*stage, StageKind::Dependencies);
    assert_eq!(*exit_code, code);
    assert!(command.starts_with("python -m pip install --user --upgrade"));
    assert_eq!(diagnostics, output);
    assert!(!calls.lock().iter().any(|c| c == "apply pip_install"));
    assert!(!calls.lock().iter().any(|c| c == "finish"));
}

#[test]
fn install_failure_is_dependency_resolution() {
    let stderr = "ERROR: No matching distribution found for flask==99";
    let failure = run_err(FakeHost::default().answer("pip_install", exit(1, "", stderr)));
    let BuildError::DependencyResolution { manifest, diagnostics } = &failure.error else {
        panic!("expected dependency resolution, got {:?}", failure.error);
    };
    assert_eq!(manifest, &PathBuf::from("requirements.txt"));
    assert_eq!(diagnostics, stderr);
}

#[test]
fn create_user_failure_is_identity_conflict() {
    let failure = run_err(FakeHost::default().answer("create_user", exit(9, "", "useradd: user 'xero' already exists")));
    assert!(matches!(&failure.error, BuildError::IdentityConflict { username, .. } if username == "xero"));
    assert_eq!(failure.stages.len(), 3);
    assert!(matches!(failure.stages[2].outcome, StageOutcome::Failed(_)));
}

#[test]
fn unknown_base_is_resolution() {
    let failure = run_err(FakeHost::default().error("from", || HostError::UnknownImage {
        image: "python:3.13-slim".to_string(),
        message: "pull access denied".to_string(),
    }));
    assert!(matches!(&failure.error, BuildError::Resolution { diagnostics, .. } if diagnostics == "pull access denied"));
}

#[test]
fn other_host_errors_keep_their_stage() {
    let failure = run_err(FakeHost::default().error("copy", || HostError::MissingSource(PathBuf::from("."))));
    assert!(matches!(failure.error, BuildError::Host { stage: StageKind::Artifacts, .. }));
}

#[test]
fn violated_check_fails_its_stage() {
    let check = PostCondition::Absent { path: PathBuf::from("/home/xero/.cache/pip") };
    let host = FakeHost::default().violate(check);
    let calls = host.log.clone();
    let failure = run_err(host);

    let BuildError::Postcondition { stage, check, detail } = &failure.error else {
        panic!("expected post-condition failure, got {:?}", failure.error);
    };
    assert_eq!(*stage, StageKind::Dependencies);
    assert_eq!(check, "absent(/home/xero/.cache/pip)");
    assert_eq!(detail, "nope");
    assert!(!calls.lock().iter().any(|c| c == "finish"));
}

#[test]
fn warnings_are_recorded() {
    let stderr = "WARNING: You are using pip version 24.0; however, version 24.2 is available.\n";
    let report = run(FakeHost::default().answer("pip_install", exit(0, "Successfully installed flask-3.0.3\n", stderr))).unwrap();
    let deps = report.stages.last().unwrap();
    assert_eq!(
        deps.warnings,
        vec!["WARNING: You are using pip version 24.0; however, version 24.2 is available.".to_string()]
    );
}

#[test]
fn stage_timings_come_from_the_clock() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(5_000);
    clock.set_tick_ms(10);
    let report = Pipeline::standard(&xero_spec()).run(FakeHost::default(), &clock).unwrap();

    let first = &report.stages[0];
    assert_eq!(first.started_at_ms, 5_000);
    assert_eq!(first.finished_at_ms, Some(5_010));
    assert_eq!(first.elapsed_ms(), Some(10));
    assert_eq!(report.stages[1].started_at_ms, 5_020);
}

fn plan(stage: StageKind, requires: Privilege, instructions: Vec<Instruction>) -> StagePlan {
    StagePlan { stage, requires, instructions, checks: Vec::new() }
}

fn privilege_error(failure: &BuildFailure) -> &PrivilegeError {
    match &failure.error {
        BuildError::Privilege { source, .. } => source,
        other => panic!("expected privilege error, got {other:?}"),
    }
}

#[test]
fn restricted_stage_before_drop_is_rejected() {
    let pipeline = Pipeline::new(vec![plan(
        StageKind::Artifacts,
        Privilege::Restricted,
        vec![Instruction::Cmd { argv: vec!["true".to_string()] }],
    )]);
    let failure = match pipeline.run(FakeHost::default(), &FakeClock::new()) {
        Ok(_) => panic!("restricted stage must not run as root"),
        Err(failure) => failure,
    };
    assert_eq!(
        privilege_error(&failure),
        &PrivilegeError::Mismatch { required: Privilege::Restricted, current: Privilege::Elevated }
    );
}

#[test]
fn re_escalation_is_rejected() {
    let host = FakeHost::default();
    let calls = host.log.clone();
    let pipeline = Pipeline::new(vec![
        plan(StageKind::PrivilegeDrop, Privilege::Elevated, vec![Instruction::User { name: "xero".to_string() }]),
        plan(StageKind::Dependencies, Privilege::Restricted, vec![Instruction::User { name: "root".to_string() }]),
    ]);
    let failure = match pipeline.run(host, &FakeClock::new()) {
        Ok(_) => panic!("re-escalation must fail"),
        Err(failure) => failure,
    };
    assert!(matches!(privilege_error(&failure), PrivilegeError::Escalation { .. }));
    assert_eq!(failure.error.stage(), Some(StageKind::Dependencies));
    // The offending USER never reaches the host
    assert_eq!(calls.lock().iter().filter(|c| *c == "apply user").count(), 1);
}

#[test]
fn elevated_stage_after_drop_is_rejected() {
    let pipeline = Pipeline::new(vec![
        plan(StageKind::PrivilegeDrop, Privilege::Elevated, vec![Instruction::User { name: "xero".to_string() }]),
        plan(
            StageKind::SystemConfig,
            Privilege::Elevated,
            vec![Instruction::run(Command::LinkTimezone { zone: "UTC".to_string() })],
        ),
    ]);
    let failure = match pipeline.run(FakeHost::default(), &FakeClock::new()) {
        Ok(_) => panic!("elevated stage after the drop must fail"),
        Err(failure) => failure,
    };
    assert!(matches!(privilege_error(&failure), PrivilegeError::Mismatch { .. }));
    assert_eq!(failure.stages.len(), 2);
    assert_eq!(failure.stages[0].user, "xero");
}

#[test]
fn benign_list_is_per_instruction() {
    let pipeline = Pipeline::new(vec![plan(
        StageKind::SystemConfig,
        Privilege::Elevated,
        vec![Instruction::Run {
            command: Command::LinkTimezone { zone: "UTC".to_string() },
            benign: vec![BenignExit::new(3, "already linked", "link exists")],
        }],
    )]);
    let host = FakeHost::default().answer("link_timezone", exit(3, "", "already linked"));
    let report = pipeline.run(host, &FakeClock::new()).unwrap();
    assert_eq!(report.stages[0].tolerated, vec!["link exists".to_string()]);
}

#[test]
fn format_fields_joins_pairs() {
    let instruction = Instruction::User { name: "xero".to_string() };
    assert_eq!(format_fields(&instruction), "name=xero");
    let copy = Instruction::Copy { source: PathBuf::from("."), dest: PathBuf::from("/w"), chown: None };
    assert_eq!(format_fields(&copy), "source=. dest=/w chown=");
}

#[test]
fn calls_helper_snapshots_log() {
    let host = FakeHost::default();
    let mut clone = host.clone();
    clone.apply(&Instruction::Cmd { argv: Vec::new() }).unwrap();
    assert_eq!(host.calls(), vec!["apply cmd".to_string()]);
}
