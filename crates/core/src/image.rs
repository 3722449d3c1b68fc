// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pinned base runtime image references.
//!
//! Recipes accept two forms:
//!
//! Short form:
//! ```toml
//! base = "python:3.13-slim"
//! ```
//!
//! Block form:
//! ```hcl
//! base {
//!   runtime = "python"
//!   version = "3.13"
//!   variant = "slim"
//! }
//! ```
//!
//! Either way the reference must be pinned: a numeric `major.minor[.patch]`
//! version is required and floating tags such as `latest` are rejected.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced while parsing or validating a base image reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageRefError {
    #[error("empty image reference")]
    Empty,
    #[error("image reference `{reference}` is not pinned: {reason}")]
    Floating { reference: String, reason: String },
    #[error("invalid image name `{0}`")]
    InvalidName(String),
    #[error("invalid digest `{0}`: expected sha256:<64 lowercase hex chars>")]
    InvalidDigest(String),
}

/// An exact base image: (runtime, version, variant) plus optional registry and digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BaseImage {
    /// Registry and namespace prefix (e.g. "ghcr.io/acme")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    /// Runtime repository name (e.g. "python")
    pub runtime: String,
    /// Pinned runtime version (e.g. "3.13")
    pub version: String,
    /// Minimality variant (e.g. "slim", "slim-bookworm")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Content digest (e.g. "sha256:...")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl BaseImage {
    /// Build a reference from parts and validate it.
    pub fn new(
        runtime: impl Into<String>,
        version: impl Into<String>,
        variant: Option<String>,
    ) -> Result<Self, ImageRefError> {
        let image = Self {
            registry: None,
            runtime: runtime.into(),
            version: version.into(),
            variant,
            digest: None,
        };
        image.validate()?;
        Ok(image)
    }

    /// Parse a `[registry/]runtime:version[-variant][@sha256:digest]` reference.
    pub fn parse(reference: &str) -> Result<Self, ImageRefError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ImageRefError::Empty);
        }

        let (name_tag, digest) = match reference.split_once('@') {
            Some((n, d)) => (n, Some(d.to_string())),
            None => (reference, None),
        };

        // The tag separator is the last ':' after the last '/', so that
        // registry ports ("host:5000/python:3.13") are not mistaken for tags.
        let last_slash = name_tag.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match name_tag[last_slash..].rfind(':') {
            Some(i) => (&name_tag[..last_slash + i], &name_tag[last_slash + i + 1..]),
            None => {
                return Err(ImageRefError::Floating {
                    reference: reference.to_string(),
                    reason: "no tag given".to_string(),
                })
            }
        };

        let (registry, runtime) = match name.rsplit_once('/') {
            Some((r, n)) => (Some(r.to_string()), n),
            None => (None, name),
        };

        let (version, variant) = match tag.split_once('-') {
            Some((v, rest)) => (v, Some(rest.to_string())),
            None => (tag, None),
        };

        let image = Self {
            registry,
            runtime: runtime.to_string(),
            version: version.to_string(),
            variant,
            digest,
        };
        image.validate()?;
        Ok(image)
    }

    /// Check that the reference is well-formed and pinned.
    pub fn validate(&self) -> Result<(), ImageRefError> {
        if !is_valid_name(&self.runtime) {
            return Err(ImageRefError::InvalidName(self.runtime.clone()));
        }
        if let Some(registry) = &self.registry {
            if registry.is_empty() || registry.split('/').any(str::is_empty) {
                return Err(ImageRefError::InvalidName(registry.clone()));
            }
        }
        if self.version == "latest" || self.variant.as_deref() == Some("latest") {
            return Err(self.floating("`latest` is a floating tag"));
        }
        let parts: Vec<&str> = self.version.split('.').collect();
        if parts.len() < 2 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
            return Err(self.floating("version must be numeric major.minor[.patch]"));
        }
        if let Some(variant) = &self.variant {
            if variant.is_empty() || !variant.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.' || b == b'_') {
                return Err(ImageRefError::InvalidName(self.tag()));
            }
        }
        if let Some(digest) = &self.digest {
            let hex = digest.strip_prefix("sha256:").unwrap_or("");
            if hex.len() != 64 || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
                return Err(ImageRefError::InvalidDigest(digest.clone()));
            }
        }
        Ok(())
    }

    /// Tag portion of the reference: `version[-variant]`.
    pub fn tag(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{}-{}", self.version, variant),
            None => self.version.clone(),
        }
    }

    /// `major.minor` of the runtime version, as used in site-packages paths.
    pub fn runtime_minor(&self) -> String {
        self.version.split('.').take(2).collect::<Vec<_>>().join(".")
    }

    fn floating(&self, reason: &str) -> ImageRefError {
        ImageRefError::Floating { reference: self.to_string(), reason: reason.to_string() }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'_' | b'-'))
}

impl fmt::Display for BaseImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}:{}", self.runtime, self.tag())?;
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for BaseImage {
    type Err = ImageRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for BaseImage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Short(String),
            Block {
                #[serde(default)]
                registry: Option<String>,
                runtime: String,
                version: String,
                #[serde(default)]
                variant: Option<String>,
                #[serde(default)]
                digest: Option<String>,
            },
        }

        let image = match Helper::deserialize(deserializer)? {
            Helper::Short(reference) => {
                return BaseImage::parse(&reference).map_err(serde::de::Error::custom)
            }
            Helper::Block { registry, runtime, version, variant, digest } => {
                BaseImage { registry, runtime, version, variant, digest }
            }
        };
        image.validate().map_err(serde::de::Error::custom)?;
        Ok(image)
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
