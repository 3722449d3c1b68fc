// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! keel-core: data model for the keel image provisioning pipeline

pub mod macros;

pub mod clock;
pub mod identity;
pub mod image;
pub mod instruction;
pub mod manifest;
pub mod privilege;
pub mod stage;
pub mod workspace;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use identity::{ExecutionIdentity, IdentityError};
pub use image::{BaseImage, ImageRefError};
pub use instruction::{BenignExit, Command, EnvValue, Instruction, PostCondition};
pub use manifest::{Constraint, DependencyManifest, Op, Requirement, RequirementError};
pub use privilege::{Privilege, PrivilegeError, PrivilegeToken, ROOT_USER};
pub use stage::{StageKind, StageOutcome, StageRecord};
pub use workspace::{Workspace, WorkspaceError};
