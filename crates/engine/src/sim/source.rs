// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build context contents available to `COPY`

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Relative path to file content, in path order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTree {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl SourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Read every regular file under `dir`. Symlinks are not followed.
    pub fn from_dir(dir: &Path) -> std::io::Result<Self> {
        let mut files = BTreeMap::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            for entry in std::fs::read_dir(&current)? {
                let entry = entry?;
                let file_type = entry.file_type()?;
                let path = entry.path();
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file() {
                    let relative = path.strip_prefix(dir).unwrap_or(&path).to_path_buf();
                    files.insert(relative, std::fs::read(&path)?);
                }
            }
        }
        tracing::debug!(dir = %dir.display(), files = files.len(), "loaded build context");
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files selected by a `COPY` source, keyed relative to the source.
    ///
    /// `.` selects everything; a file path selects that file (keyed by an
    /// empty path); a directory path selects its contents.
    pub fn select(&self, source: &Path) -> Option<Vec<(PathBuf, &[u8])>> {
        let source: PathBuf = source.components().filter(|c| !matches!(c, Component::CurDir)).collect();
        if source.as_os_str().is_empty() {
            return Some(self.files.iter().map(|(p, c)| (p.clone(), c.as_slice())).collect());
        }
        if let Some(content) = self.files.get(&source) {
            return Some(vec![(PathBuf::new(), content.as_slice())]);
        }
        let selected: Vec<(PathBuf, &[u8])> = self
            .files
            .iter()
            .filter_map(|(p, c)| p.strip_prefix(&source).ok().map(|rel| (rel.to_path_buf(), c.as_slice())))
            .collect();
        if selected.is_empty() {
            None
        } else {
            Some(selected)
        }
    }
}
