// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipe model and validation into a [`BuildSpec`]

use keel_core::{BaseImage, DependencyManifest, ExecutionIdentity, Workspace};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Recipe file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Hcl,
    Json,
}

keel_core::simple_display! {
    Format {
        Toml => "TOML",
        Hcl => "HCL",
        Json => "JSON",
    }
}

/// Errors from loading or validating a recipe
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("no recipe found in {0} (expected keel.toml, keel.hcl, or keel.json)")]
    NotFound(PathBuf),
    #[error("multiple recipes in {dir}: {found}; use --recipe <file>")]
    Ambiguous { dir: PathBuf, found: String },
    #[error("unsupported recipe format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("failed to parse {format} recipe: {message}")]
    Parse { format: Format, message: String },
    #[error("invalid recipe: {0}")]
    Invalid(String),
    #[error("dependency manifest {0} not found in the build context")]
    ManifestMissing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Layer ordering for application files and dependency installation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layering {
    /// Copy the whole tree, then install
    #[default]
    Tree,
    /// Copy only the manifest, install, then copy the whole tree
    ManifestFirst,
}

keel_core::simple_display! {
    Layering {
        Tree => "tree",
        ManifestFirst => "manifest-first",
    }
}

/// Parsed recipe file, before validation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    pub base: BaseImage,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub identity: IdentitySection,
    #[serde(default)]
    pub workspace: WorkspaceSection,
    #[serde(default)]
    pub dependencies: DependenciesSection,
    #[serde(default)]
    pub image: ImageSection,
    #[serde(default)]
    pub render: RenderSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentitySection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSection {
    /// Relative to the identity's home, or absolute inside it
    #[serde(default = "default_workspace_dir")]
    pub dir: PathBuf,
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self { dir: default_workspace_dir() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DependenciesSection {
    /// Relative to the build context
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    /// Interpreter used to run `-m pip`
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default)]
    pub layering: Layering,
}

impl Default for DependenciesSection {
    fn default() -> Self {
        Self { manifest: default_manifest(), python: default_python(), layering: Layering::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSection {
    /// Render post-condition checks as RUN lines
    #[serde(default = "default_true")]
    pub checks: bool,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self { checks: true }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from("project")
}

fn default_manifest() -> PathBuf {
    PathBuf::from("requirements.txt")
}

fn default_python() -> String {
    "python".to_string()
}

fn default_true() -> bool {
    true
}

/// Validated build inputs, in core types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSpec {
    pub base: BaseImage,
    pub timezone: String,
    pub identity: ExecutionIdentity,
    pub workspace: Workspace,
    /// Manifest path relative to the build context
    pub manifest: PathBuf,
    pub python: String,
    pub layering: Layering,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    pub render_checks: bool,
}

/// Parse recipe content in the given format.
pub fn parse_recipe_with_format(content: &str, format: Format) -> Result<Recipe, RecipeError> {
    let parsed = match format {
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        Format::Hcl => hcl::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| RecipeError::Parse { format, message })
}

impl Recipe {
    /// Resolve the recipe into a [`BuildSpec`].
    pub fn validate(&self) -> Result<BuildSpec, RecipeError> {
        self.base.validate().map_err(|e| RecipeError::Invalid(format!("base: {e}")))?;

        if !is_valid_timezone(&self.timezone) {
            return Err(RecipeError::Invalid(format!(
                "timezone: `{}` is not a zoneinfo name",
                self.timezone
            )));
        }

        let section = &self.identity;
        let mut identity = ExecutionIdentity::new(section.name.clone());
        if let Some(home) = &section.home {
            identity = identity.home(home.clone());
        }
        if let Some(shell) = &section.shell {
            identity = identity.shell(shell.clone());
        }
        if let Some(comment) = &section.comment {
            identity = identity.comment(comment.clone());
        }
        if let Some(uid) = section.uid {
            identity = identity.uid(uid);
        }
        identity.validate().map_err(|e| RecipeError::Invalid(format!("identity: {e}")))?;

        let workspace = Workspace::resolve(&identity, &self.workspace.dir)
            .map_err(|e| RecipeError::Invalid(format!("workspace: {e}")))?;

        let deps = &self.dependencies;
        if !is_relative_normal(&deps.manifest) {
            return Err(RecipeError::Invalid(format!(
                "dependencies: manifest `{}` must be a relative path inside the build context",
                deps.manifest.display()
            )));
        }
        if deps.python.is_empty() || deps.python.contains(char::is_whitespace) {
            return Err(RecipeError::Invalid(format!(
                "dependencies: python `{}` must be a single command word",
                deps.python
            )));
        }

        if let Some(command) = &self.image.command {
            if command.is_empty() || command[0].is_empty() {
                return Err(RecipeError::Invalid("image: command must not be empty".to_string()));
            }
        }

        tracing::debug!(
            base = %self.base,
            identity = %identity.username,
            workspace = %workspace.path().display(),
            layering = %deps.layering,
            "recipe validated"
        );

        Ok(BuildSpec {
            base: self.base.clone(),
            timezone: self.timezone.clone(),
            identity,
            workspace,
            manifest: deps.manifest.clone(),
            python: deps.python.clone(),
            layering: deps.layering,
            command: self.image.command.clone(),
            render_checks: self.render.checks,
        })
    }
}

/// Read the dependency manifest named by `spec` from the build context.
pub fn load_manifest(context: &Path, spec: &BuildSpec) -> Result<DependencyManifest, RecipeError> {
    let path = context.join(&spec.manifest);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RecipeError::ManifestMissing(spec.manifest.clone()))
        }
        Err(source) => return Err(RecipeError::Io { path, source }),
    };
    let manifest = DependencyManifest::parse(spec.manifest.clone(), &content);
    tracing::debug!(path = %path.display(), entries = manifest.entries.len(), "loaded manifest");
    Ok(manifest)
}

fn is_valid_timezone(zone: &str) -> bool {
    !zone.is_empty()
        && !zone.starts_with('/')
        && zone.split('/').all(|part| !part.is_empty() && part != "." && part != "..")
        && zone
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b'_' | b'-' | b'+'))
}

fn is_relative_normal(path: &Path) -> bool {
    path.components().next().is_some() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
#[path = "recipe_tests.rs"]
mod tests;
