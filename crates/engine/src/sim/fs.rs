// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory image filesystem with ownership

use keel_core::ROOT_USER;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Dir,
    File(Vec<u8>),
    Symlink(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub owner: String,
}

impl Node {
    pub fn dir(owner: &str) -> Self {
        Self { kind: NodeKind::Dir, owner: owner.to_string() }
    }

    pub fn file(owner: &str, content: impl Into<Vec<u8>>) -> Self {
        Self { kind: NodeKind::File(content.into()), owner: owner.to_string() }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Dir)
    }
}

/// Why a filesystem write was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    PermissionDenied(PathBuf),
    NotADirectory(PathBuf),
    Exists(PathBuf),
    NotFound(PathBuf),
}

impl FsError {
    /// Message in the style of coreutils for `tool`.
    pub fn message(&self, tool: &str) -> String {
        match self {
            FsError::PermissionDenied(p) => format!("{tool}: {}: Permission denied", p.display()),
            FsError::NotADirectory(p) => format!("{tool}: {}: Not a directory", p.display()),
            FsError::Exists(p) => format!("{tool}: {}: File exists", p.display()),
            FsError::NotFound(p) => format!("{tool}: {}: No such file or directory", p.display()),
        }
    }

    /// Python `OSError` rendering, e.g. `[Errno 13] Permission denied: '/home/xero'`.
    pub fn os_error(&self) -> String {
        let (errno, text, path) = match self {
            FsError::PermissionDenied(p) => (13, "Permission denied", p),
            FsError::NotADirectory(p) => (20, "Not a directory", p),
            FsError::Exists(p) => (17, "File exists", p),
            FsError::NotFound(p) => (2, "No such file or directory", p),
        };
        format!("[Errno {errno}] {text}: '{}'", path.display())
    }
}

/// Path-keyed tree. Keys are absolute and normalized; `/` is always present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Fs {
    nodes: BTreeMap<PathBuf, Node>,
}

impl Fs {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), Node::dir(ROOT_USER));
        Self { nodes }
    }

    pub fn get(&self, path: &Path) -> Option<&Node> {
        self.nodes.get(path)
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn read(&self, path: &Path) -> Option<&[u8]> {
        match self.nodes.get(path).map(|n| &n.kind) {
            Some(NodeKind::File(content)) => Some(content),
            _ => None,
        }
    }

    /// Insert without permission checks (image construction, COPY).
    pub fn insert(&mut self, path: impl Into<PathBuf>, node: Node) {
        self.nodes.insert(path.into(), node);
    }

    pub fn remove(&mut self, path: &Path) -> Option<Node> {
        self.nodes.remove(path)
    }

    /// `path` and every entry below it.
    pub fn walk<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = (&'a PathBuf, &'a Node)> + 'a {
        self.nodes.range(root.to_path_buf()..).take_while(move |(p, _)| p.starts_with(root))
    }

    /// Create `path` and missing parents as `user`.
    ///
    /// Creating an entry requires `user` to be root or to own the parent
    /// directory. Existing directories are left untouched.
    pub fn create_dir_all(&mut self, path: &Path, user: &str) -> Result<(), FsError> {
        let mut current = PathBuf::from("/");
        for component in path.components().skip(1) {
            let Component::Normal(name) = component else {
                continue;
            };
            let parent = current.clone();
            current.push(name);
            match self.nodes.get(&current) {
                Some(node) if node.is_dir() => continue,
                Some(_) => return Err(FsError::NotADirectory(current)),
                None => {
                    self.check_writable(&parent, user)?;
                    self.nodes.insert(current.clone(), Node::dir(user));
                }
            }
        }
        Ok(())
    }

    /// Create or replace a file as `user`, creating parents.
    pub fn write_file(&mut self, path: &Path, content: impl Into<Vec<u8>>, user: &str) -> Result<(), FsError> {
        let parent = path.parent().unwrap_or(Path::new("/"));
        self.create_dir_all(parent, user)?;
        match self.nodes.get(path) {
            Some(node) if node.is_dir() => return Err(FsError::Exists(path.to_path_buf())),
            Some(node) if user != ROOT_USER && node.owner != user => {
                return Err(FsError::PermissionDenied(path.to_path_buf()))
            }
            Some(_) => {}
            None => self.check_writable(parent, user)?,
        }
        self.nodes.insert(path.to_path_buf(), Node::file(user, content));
        Ok(())
    }

    pub fn check_writable(&self, dir: &Path, user: &str) -> Result<(), FsError> {
        match self.nodes.get(dir) {
            None => Err(FsError::NotFound(dir.to_path_buf())),
            Some(node) if !node.is_dir() => Err(FsError::NotADirectory(dir.to_path_buf())),
            Some(node) if user == ROOT_USER || node.owner == user => Ok(()),
            Some(_) => Err(FsError::PermissionDenied(dir.to_path_buf())),
        }
    }

    /// Reassign ownership of `path`, and of everything below it when `recursive`.
    pub fn chown(&mut self, path: &Path, owner: &str, recursive: bool) -> Result<usize, FsError> {
        if !self.exists(path) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        let mut changed = 0;
        for (p, node) in self.nodes.range_mut(path.to_path_buf()..) {
            if !p.starts_with(path) || (!recursive && p != path) {
                break;
            }
            node.owner = owner.to_string();
            changed += 1;
        }
        Ok(changed)
    }

    /// Content digest of the change set between `before` and `self`.
    pub fn delta_digest(&self, before: &Fs, salt: &[u8]) -> (String, usize) {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        let mut changes = 0;
        for (path, node) in &self.nodes {
            if before.nodes.get(path) != Some(node) {
                changes += 1;
                hasher.update(b"+");
                hash_entry(&mut hasher, path, node);
            }
        }
        for path in before.nodes.keys() {
            if !self.nodes.contains_key(path) {
                changes += 1;
                hasher.update(b"-");
                hasher.update(path.to_string_lossy().as_bytes());
                hasher.update([0]);
            }
        }
        (format!("sha256:{}", hex(&hasher.finalize())), changes)
    }
}

fn hash_entry(hasher: &mut Sha256, path: &Path, node: &Node) {
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update([0]);
    hasher.update(node.owner.as_bytes());
    hasher.update([0]);
    match &node.kind {
        NodeKind::Dir => hasher.update(b"d"),
        NodeKind::File(content) => {
            hasher.update(b"f");
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(content);
        }
        NodeKind::Symlink(target) => {
            hasher.update(b"l");
            hasher.update(target.to_string_lossy().as_bytes());
        }
    }
    hasher.update([0]);
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
