// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{spec_from, xero_spec, XERO_RECIPE};
use keel_core::Command;
use std::path::PathBuf;

const XERO_DOCKERFILE: &str = r##"# syntax=docker/dockerfile:1

# Base Runtime Resolver (elevated)
FROM python:3.13-slim

# System Configuration (elevated)
RUN ln -snf /usr/share/zoneinfo/America/Los_Angeles /etc/localtime && echo America/Los_Angeles > /etc/timezone

# Identity Provisioner (elevated)
RUN useradd --create-home --home-dir /home/xero --shell /bin/bash --comment 'Xero API user' xero
RUN bad="$(find /home/xero ! -user xero -print -quit)"; if [ -n "$bad" ]; then echo "ownership check failed: $bad is not owned by "xero >&2; exit 1; fi

# Workspace Initializer (elevated)
RUN mkdir -p /home/xero/project
WORKDIR /home/xero/project
RUN chown -R xero:xero /home/xero
RUN bad="$(find /home/xero ! -user xero -print -quit)"; if [ -n "$bad" ]; then echo "ownership check failed: $bad is not owned by "xero >&2; exit 1; fi

# Privilege Dropper (elevated)
USER xero

# Artifact Materializer (restricted)
COPY --chown=xero:xero . /home/xero/project
RUN bad="$(find /home/xero/project ! -user xero -print -quit)"; if [ -n "$bad" ]; then echo "ownership check failed: $bad is not owned by "xero >&2; exit 1; fi

# Dependency Installer (restricted)
ENV PATH="/home/xero/.local/bin:${PATH}"
RUN out="$(python -m pip install --user --upgrade --no-cache-dir --disable-pip-version-check pip 2>&1)"; rc=$?; printf '%s\n' "$out"; [ "$rc" -eq 0 ] || { [ "$rc" -eq 1 ] && printf '%s\n' "$out" | grep -qF 'Requirement already satisfied: pip'; } || exit "$rc"
RUN python -m pip install --user --no-cache-dir --no-warn-script-location -r requirements.txt
CMD ["python", "xero_api_test.py"]
RUN bad="$(find /home/xero ! -user xero -print -quit)"; if [ -n "$bad" ]; then echo "ownership check failed: $bad is not owned by "xero >&2; exit 1; fi
RUN if [ -e /home/xero/.cache/pip ]; then echo "unexpected path: "/home/xero/.cache/pip >&2; exit 1; fi
"##;

fn render(spec: &BuildSpec) -> String {
    match render_dockerfile(spec) {
        Ok(report) => report.output,
        Err(failure) => panic!("render failed: {}", failure.error),
    }
}

#[test]
fn renders_xero_dockerfile() {
    similar_asserts::assert_eq!(render(&xero_spec()).as_str(), XERO_DOCKERFILE);
}

#[test]
fn rendering_is_deterministic() {
    assert_eq!(render(&xero_spec()), render(&xero_spec()));
}

#[test]
fn checks_can_be_disabled() {
    let spec = spec_from(&format!("{XERO_RECIPE}\n[render]\nchecks = false\n"));
    let rendered = render(&spec);
    assert!(!rendered.contains("find "));
    assert!(!rendered.contains("unexpected path"));
    assert!(rendered.contains("USER xero\n"));
}

#[test]
fn report_records_every_stage() {
    let report = render_dockerfile(&xero_spec()).unwrap();
    assert_eq!(report.stages.len(), 7);
    assert!(report.stages.iter().all(|r| r.outcome.is_completed()));
}

#[test]
fn user_precedes_every_restricted_instruction() {
    let rendered = render(&xero_spec());
    let user = rendered.find("USER xero").unwrap();
    assert!(rendered.find("COPY").unwrap() > user);
    assert!(rendered.find("pip install").unwrap() > user);
    assert!(rendered.find("useradd").unwrap() < user);
}

#[yare::parameterized(
    literal = { EnvValue::Literal("a \"b\" $HOME\\x".to_string()), r#"ENV K="a \"b\" \$HOME\\x""# },
    prepend = { EnvValue::Prepend { entry: "/opt/bin".to_string(), var: "PATH".to_string() }, r#"ENV K="/opt/bin:${PATH}""# },
)]
fn env_values_are_escaped(value: EnvValue, expected: &str) {
    assert_eq!(render_instruction(&Instruction::Env { key: "K".to_string(), value }), expected);
}

#[test]
fn copy_without_owner() {
    let copy = Instruction::Copy { source: PathBuf::from("app"), dest: PathBuf::from("/srv"), chown: None };
    assert_eq!(render_instruction(&copy), "COPY app /srv");
}

#[test]
fn cmd_is_exec_form() {
    let cmd = Instruction::Cmd { argv: vec!["python".to_string(), "say \"hi\".py".to_string()] };
    assert_eq!(render_instruction(&cmd), r#"CMD ["python", "say \"hi\".py"]"#);
}

#[test]
fn guard_joins_several_benign_exits() {
    let run = Instruction::Run {
        command: Command::MakeDir { path: PathBuf::from("/x") },
        benign: vec![BenignExit::new(1, "exists", "a"), BenignExit::new(2, "busy", "b")],
    };
    let rendered = render_instruction(&run);
    assert!(rendered.contains(
        r#"|| { [ "$rc" -eq 1 ] && printf '%s\n' "$out" | grep -qF exists; } || { [ "$rc" -eq 2 ] && printf '%s\n' "$out" | grep -qF busy; } || exit "$rc""#
    ));
}

#[test]
fn quoted_paths_in_checks() {
    let check = PostCondition::Absent { path: PathBuf::from("/home/my app/.cache") };
    assert_eq!(
        render_check(&check),
        r#"if [ -e '/home/my app/.cache' ]; then echo "unexpected path: "'/home/my app/.cache' >&2; exit 1; fi"#
    );
}
