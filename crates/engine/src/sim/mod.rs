// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated host: applies instructions to an in-memory image.
//!
//! Commands are modeled on the tools they stand for (coreutils, useradd,
//! pip) closely enough to exercise ownership, privilege, caching, and
//! resolution failures. Every instruction that writes the filesystem
//! produces a layer whose digest covers its change set; an instruction
//! that fails leaves no trace.

mod fs;
mod index;
mod source;

pub use fs::{Fs, FsError, Node, NodeKind};
pub use index::{PackageIndex, Release, Resolved};
pub use source::SourceTree;

use crate::host::{Applied, Host, HostError, Verdict};
use crate::stages::StagePlan;
use keel_core::manifest::{compare_versions, normalize_name};
use keel_core::{
    BaseImage, Command, DependencyManifest, ExecutionIdentity, Instruction, PostCondition, StageKind,
    ROOT_USER,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

const DEFAULT_PATH: &str = "/usr/local/bin:/usr/local/sbin:/usr/sbin:/usr/bin:/sbin:/bin";
const FIRST_UID: u32 = 1000;

/// Package manager versions of the base image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipState {
    pub installed: String,
    pub latest: String,
    /// Self-upgrade exits 1 while reporting the package manager as current
    pub self_check_noise: bool,
}

impl Default for PipState {
    fn default() -> Self {
        Self { installed: "24.0".to_string(), latest: "24.2".to_string(), self_check_noise: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub uid: u32,
    pub home: PathBuf,
    pub shell: String,
}

/// One filesystem layer of the simulated image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageKind>,
    pub instruction: String,
    pub digest: String,
    pub changes: usize,
}

/// Runtime configuration of the produced image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageConfig {
    pub user: String,
    pub workdir: PathBuf,
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,
}

/// Published result of a simulated build
#[derive(Debug, Clone, Serialize)]
pub struct SimImage {
    pub base: BaseImage,
    pub config: ImageConfig,
    pub layers: Vec<Layer>,
    #[serde(skip)]
    pub fs: Fs,
    #[serde(skip)]
    pub accounts: BTreeMap<String, Account>,
}

impl SimImage {
    pub fn owner_of(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.fs.get(path.as_ref()).map(|n| n.owner.as_str())
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.fs.exists(path.as_ref())
    }

    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.fs.read(path.as_ref()).map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Entries under `root` not owned by `owner`.
    pub fn foreign_entries(&self, root: impl AsRef<Path>, owner: &str) -> Vec<PathBuf> {
        self.fs
            .walk(root.as_ref())
            .filter(|(_, node)| node.owner != owner)
            .map(|(p, _)| p.clone())
            .collect()
    }
}

/// In-memory [`Host`]
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    // Base image catalog. None resolves every pinned reference.
    catalog: Option<BTreeSet<String>>,
    seed_accounts: Vec<ExecutionIdentity>,
    seed_dirs: Vec<PathBuf>,
    source: SourceTree,
    index: PackageIndex,
    pip: PipState,

    base: Option<BaseImage>,
    fs: Fs,
    accounts: BTreeMap<String, Account>,
    env: BTreeMap<String, String>,
    workdir: PathBuf,
    user: String,
    cmd: Option<Vec<String>>,
    stage: Option<StageKind>,
    layers: Vec<Layer>,
}

impl SimulatedHost {
    pub fn new(source: SourceTree, index: PackageIndex) -> Self {
        Self {
            catalog: None,
            seed_accounts: Vec::new(),
            seed_dirs: Vec::new(),
            source,
            index,
            pip: PipState::default(),
            base: None,
            fs: Fs::new(),
            accounts: BTreeMap::new(),
            env: BTreeMap::new(),
            workdir: PathBuf::from("/"),
            user: ROOT_USER.to_string(),
            cmd: None,
            stage: None,
            layers: Vec::new(),
        }
    }

    /// Restrict resolvable base images to `references`.
    pub fn with_images<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.catalog = Some(references.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_pip(mut self, pip: PipState) -> Self {
        self.pip = pip;
        self
    }

    /// An account that already exists in the base image.
    pub fn with_base_account(mut self, identity: ExecutionIdentity) -> Self {
        self.seed_accounts.push(identity);
        self
    }

    /// A root-owned directory that already exists in the base image.
    pub fn with_base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_dirs.push(path.into());
        self
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() { path.to_path_buf() } else { self.workdir.join(path) };
        let mut out = PathBuf::from("/");
        for component in joined.components() {
            match component {
                Component::Normal(name) => out.push(name),
                Component::ParentDir => {
                    out.pop();
                }
                _ => {}
            }
        }
        out
    }

    fn home_of(&self, user: &str) -> Result<PathBuf, HostError> {
        self.accounts
            .get(user)
            .map(|a| a.home.clone())
            .ok_or_else(|| HostError::UnknownUser(user.to_string()))
    }

    fn on_path(&self, dir: &Path) -> bool {
        self.env
            .get("PATH")
            .is_some_and(|path| path.split(':').any(|entry| Path::new(entry) == dir))
    }

    fn find_executable(&self, name: &str) -> bool {
        if name.starts_with('/') {
            return matches!(self.fs.get(Path::new(name)).map(|n| &n.kind), Some(NodeKind::File(_)));
        }
        let path = self.env.get("PATH").map(String::as_str).unwrap_or(DEFAULT_PATH);
        path.split(':')
            .map(|dir| Path::new(dir).join(name))
            .any(|p| matches!(self.fs.get(&p).map(|n| &n.kind), Some(NodeKind::File(_))))
    }

    fn runtime_minor(&self) -> Result<String, HostError> {
        self.base.as_ref().map(BaseImage::runtime_minor).ok_or(HostError::NoBase)
    }

    fn start_from(&mut self, image: &BaseImage) -> Result<Applied, HostError> {
        let reference = image.to_string();
        if let Some(catalog) = &self.catalog {
            if !catalog.contains(&reference) {
                return Err(HostError::UnknownImage {
                    image: reference.clone(),
                    message: format!("manifest for {reference} not found: manifest unknown"),
                });
            }
        }

        let minor = image.runtime_minor();
        let mut fs = Fs::new();
        for dir in [
            "/bin", "/etc", "/home", "/root", "/tmp", "/usr", "/usr/bin", "/usr/local", "/usr/local/bin",
            "/usr/local/lib", "/usr/share", "/usr/share/zoneinfo", "/var",
        ] {
            fs.insert(dir, Node::dir(ROOT_USER));
        }
        fs.insert("/etc/passwd", Node::file(ROOT_USER, "root:x:0:0:root:/root:/bin/bash\n"));
        fs.insert(
            "/etc/localtime",
            Node { kind: NodeKind::Symlink(PathBuf::from("/usr/share/zoneinfo/Etc/UTC")), owner: ROOT_USER.to_string() },
        );
        fs.insert("/etc/timezone", Node::file(ROOT_USER, "Etc/UTC\n"));
        fs.insert("/bin/sh", Node::file(ROOT_USER, "ELF"));

        if image.runtime == "python" {
            for exe in ["python".to_string(), "python3".to_string(), format!("python{minor}"), "pip".to_string()] {
                fs.insert(format!("/usr/local/bin/{exe}"), Node::file(ROOT_USER, format!("{exe} {}", image.version)));
            }
            let site = PathBuf::from(format!("/usr/local/lib/python{minor}/site-packages"));
            fs.insert(site.parent().unwrap_or(Path::new("/")).to_path_buf(), Node::dir(ROOT_USER));
            fs.insert(site.clone(), Node::dir(ROOT_USER));
            fs.insert(site.join("pip"), Node::dir(ROOT_USER));
            fs.insert(site.join("pip/__init__.py"), Node::file(ROOT_USER, format!("__version__ = \"{}\"\n", self.pip.installed)));
        }

        let mut accounts = BTreeMap::new();
        accounts.insert(
            ROOT_USER.to_string(),
            Account { uid: 0, home: PathBuf::from("/root"), shell: "/bin/bash".to_string() },
        );
        for (offset, identity) in self.seed_accounts.iter().enumerate() {
            let uid = identity.uid.unwrap_or(FIRST_UID + offset as u32);
            fs.insert(identity.home.clone(), Node::dir(&identity.username));
            accounts.insert(
                identity.username.clone(),
                Account { uid, home: identity.home.clone(), shell: identity.shell.clone() },
            );
        }
        for dir in &self.seed_dirs {
            if let Err(e) = fs.create_dir_all(dir, ROOT_USER) {
                tracing::warn!(error = ?e, "ignoring base directory");
            }
        }

        let mut env = BTreeMap::new();
        env.insert("PATH".to_string(), DEFAULT_PATH.to_string());
        env.insert("LANG".to_string(), "C.UTF-8".to_string());
        if image.runtime == "python" {
            env.insert("PYTHON_VERSION".to_string(), image.version.clone());
        }

        self.fs = fs;
        self.accounts = accounts;
        self.env = env;
        self.workdir = PathBuf::from("/");
        self.user = ROOT_USER.to_string();
        self.cmd = None;
        self.base = Some(image.clone());
        tracing::debug!(image = %reference, "base image resolved");
        Ok(Applied::ok())
    }

    fn run(&mut self, command: &Command) -> Result<Applied, HostError> {
        match command {
            Command::LinkTimezone { zone } => Ok(self.link_timezone(zone)),
            Command::CreateUser { identity } => Ok(self.create_user(identity)),
            Command::MakeDir { path } => {
                let path = self.resolve_path(path);
                Ok(match self.fs.create_dir_all(&path, &self.user) {
                    Ok(()) => Applied::ok(),
                    Err(e) => fail(1, e.message("mkdir")),
                })
            }
            Command::Chown { owner, path, recursive } => Ok(self.chown(owner, path, *recursive)),
            Command::PipSelfUpgrade { python } => self.pip_self_upgrade(python),
            Command::PipInstall { python, manifest, user, no_cache, quiet_script_location } => {
                self.pip_install(python, manifest, *user, *no_cache, *quiet_script_location)
            }
        }
    }

    fn link_timezone(&mut self, zone: &str) -> Applied {
        if self.user != ROOT_USER {
            return fail(1, "ln: failed to create symbolic link '/etc/localtime': Permission denied".to_string());
        }
        let target = PathBuf::from("/usr/share/zoneinfo").join(zone);
        self.fs.insert("/etc/localtime", Node { kind: NodeKind::Symlink(target), owner: ROOT_USER.to_string() });
        self.fs.insert("/etc/timezone", Node::file(ROOT_USER, format!("{zone}\n")));
        Applied::ok()
    }

    fn create_user(&mut self, identity: &ExecutionIdentity) -> Applied {
        if self.user != ROOT_USER {
            return fail(1, "useradd: Permission denied.\nuseradd: cannot lock /etc/passwd; try again later.".to_string());
        }
        if self.accounts.contains_key(&identity.username) {
            return fail(9, format!("useradd: user '{}' already exists", identity.username));
        }
        if let Some(uid) = identity.uid {
            if self.accounts.values().any(|a| a.uid == uid) {
                return fail(4, format!("useradd: UID {uid} is not unique"));
            }
        }
        if self.fs.exists(&identity.home) {
            return fail(12, format!("useradd: home directory {} already exists", identity.home.display()));
        }

        let uid = identity.uid.unwrap_or_else(|| {
            let taken: BTreeSet<u32> = self.accounts.values().map(|a| a.uid).collect();
            (FIRST_UID..).find(|uid| !taken.contains(uid)).unwrap_or(FIRST_UID)
        });
        let parent = identity.home.parent().unwrap_or(Path::new("/"));
        if let Err(e) = self.fs.create_dir_all(parent, ROOT_USER) {
            return fail(12, e.message("useradd"));
        }
        let name = identity.username.as_str();
        self.fs.insert(identity.home.clone(), Node::dir(name));
        self.fs.insert(identity.home.join(".bashrc"), Node::file(name, "# ~/.bashrc\n"));
        self.fs.insert(identity.home.join(".profile"), Node::file(name, "# ~/.profile\n"));

        let mut passwd = self.fs.read(Path::new("/etc/passwd")).map(<[u8]>::to_vec).unwrap_or_default();
        passwd.extend_from_slice(
            format!("{name}:x:{uid}:{uid}:{}:{}:{}\n", identity.comment, identity.home.display(), identity.shell)
                .as_bytes(),
        );
        self.fs.insert("/etc/passwd", Node::file(ROOT_USER, passwd));
        self.accounts.insert(
            name.to_string(),
            Account { uid, home: identity.home.clone(), shell: identity.shell.clone() },
        );
        Applied::ok()
    }

    fn chown(&mut self, owner: &str, path: &Path, recursive: bool) -> Applied {
        let display = path.display();
        if self.user != ROOT_USER {
            return fail(1, format!("chown: changing ownership of '{display}': Operation not permitted"));
        }
        let name = owner.split(':').next().unwrap_or(owner);
        if !self.accounts.contains_key(name) {
            return fail(1, format!("chown: invalid user: '{owner}'"));
        }
        let path = self.resolve_path(path);
        match self.fs.chown(&path, name, recursive) {
            Ok(_) => Applied::ok(),
            Err(_) => fail(1, format!("chown: cannot access '{display}': No such file or directory")),
        }
    }

    fn pip_self_upgrade(&mut self, python: &str) -> Result<Applied, HostError> {
        if !self.find_executable(python) {
            return Ok(fail(127, format!("/bin/sh: 1: {python}: not found")));
        }
        let minor = self.runtime_minor()?;
        let current = format!(
            "Requirement already satisfied: pip in /usr/local/lib/python{minor}/site-packages ({})\n",
            self.pip.installed
        );
        if self.pip.self_check_noise {
            return Ok(Applied { exit_code: 1, stdout: current, stderr: String::new() });
        }
        if compare_versions(&self.pip.installed, &self.pip.latest) != Ordering::Less {
            return Ok(Applied { exit_code: 0, stdout: current, stderr: String::new() });
        }

        let minor_script = format!("pip{}", minor);
        let pip = Resolved {
            name: "pip".to_string(),
            version: self.pip.latest.clone(),
            scripts: vec!["pip".to_string(), "pip3".to_string(), minor_script],
        };
        let applied = self.install(&[pip], true, true, false)?;
        if applied.success() {
            self.pip.installed = self.pip.latest.clone();
        }
        Ok(applied)
    }

    fn pip_install(
        &mut self,
        python: &str,
        manifest: &Path,
        user_site: bool,
        no_cache: bool,
        quiet: bool,
    ) -> Result<Applied, HostError> {
        if !self.find_executable(python) {
            return Ok(fail(127, format!("/bin/sh: 1: {python}: not found")));
        }
        let Some(content) = self.fs.read(&self.resolve_path(manifest)) else {
            return Ok(fail(
                1,
                format!(
                    "ERROR: Could not open requirements file: [Errno 2] No such file or directory: '{}'",
                    manifest.display()
                ),
            ));
        };
        let content = String::from_utf8_lossy(content).into_owned();
        let parsed = DependencyManifest::parse(manifest, &content);
        let requirements = match parsed.requirements() {
            Ok(requirements) => requirements,
            Err(e) => return Ok(fail(1, format!("ERROR: Invalid requirement: {e}"))),
        };
        for entry in parsed.unsupported() {
            tracing::warn!(entry, "skipping requirement the index cannot resolve");
        }
        let resolved = match self.index.resolve(&requirements) {
            Ok(resolved) => resolved,
            Err(diagnostics) => return Ok(fail(1, diagnostics)),
        };

        let mut applied = self.install(&resolved, user_site, no_cache, quiet)?;
        if applied.success() && compare_versions(&self.pip.installed, &self.pip.latest) == Ordering::Less {
            applied.stderr.push_str(&format!(
                "WARNING: You are using pip version {}; however, version {} is available.\n",
                self.pip.installed, self.pip.latest
            ));
        }
        Ok(applied)
    }

    /// Write packages into the site directory as the current user.
    fn install(
        &mut self,
        packages: &[Resolved],
        user_site: bool,
        no_cache: bool,
        quiet: bool,
    ) -> Result<Applied, HostError> {
        let user = self.user.clone();
        let minor = self.runtime_minor()?;
        let home = self.home_of(&user)?;
        let (site, bin) = if user_site {
            (home.join(format!(".local/lib/python{minor}/site-packages")), home.join(".local/bin"))
        } else {
            (PathBuf::from(format!("/usr/local/lib/python{minor}/site-packages")), PathBuf::from("/usr/local/bin"))
        };

        let mut stderr = String::new();
        let result = (|| -> Result<(), FsError> {
            self.fs.create_dir_all(&site, &user)?;
            for package in packages {
                let module = normalize_name(&package.name).replace('-', "_");
                self.fs.write_file(
                    &site.join(&module).join("__init__.py"),
                    format!("__version__ = \"{}\"\n", package.version),
                    &user,
                )?;
                self.fs.write_file(
                    &site.join(format!("{module}-{}.dist-info", package.version)).join("METADATA"),
                    format!("Metadata-Version: 2.1\nName: {}\nVersion: {}\n", package.name, package.version),
                    &user,
                )?;
                for script in &package.scripts {
                    self.fs.write_file(
                        &bin.join(script),
                        format!("#!/usr/bin/env python\n# {} {}\n", package.name, package.version),
                        &user,
                    )?;
                }
                if !no_cache {
                    let wheel = format!("{module}-{}-py3-none-any.whl", package.version);
                    self.fs.write_file(&home.join(".cache/pip/wheels").join(wheel), "wheel", &user)?;
                }
            }
            Ok(())
        })();
        if let Err(e) = result {
            return Ok(fail(1, format!("ERROR: Could not install packages due to an OSError: {}", e.os_error())));
        }

        if !quiet && !self.on_path(&bin) {
            for package in packages.iter().filter(|p| !p.scripts.is_empty()) {
                stderr.push_str(&script_location_warning(&package.scripts, &bin));
            }
        }

        let installed: Vec<String> = packages.iter().map(|p| format!("{}-{}", p.name, p.version)).collect();
        Ok(Applied {
            exit_code: 0,
            stdout: format!("Successfully installed {}\n", installed.join(" ")),
            stderr,
        })
    }

    fn copy(&mut self, source: &Path, dest: &Path, chown: Option<&str>) -> Result<Applied, HostError> {
        let owner = match chown {
            Some(spec) => {
                let name = spec.split(':').next().unwrap_or(spec);
                if !self.accounts.contains_key(name) {
                    return Err(HostError::UnknownUser(name.to_string()));
                }
                name.to_string()
            }
            None => ROOT_USER.to_string(),
        };
        let files: Vec<(PathBuf, Vec<u8>)> = self
            .source
            .select(source)
            .ok_or_else(|| HostError::MissingSource(source.to_path_buf()))?
            .into_iter()
            .map(|(rel, content)| (rel, content.to_vec()))
            .collect();

        let dest = self.resolve_path(dest);
        let dest_is_dir = self.fs.get(&dest).is_some_and(Node::is_dir);
        if source_is_tree(source, &files) {
            self.ensure_dirs(&dest, &owner);
        }
        for (rel, content) in files {
            let target = if rel.as_os_str().is_empty() {
                match (dest_is_dir, source.file_name()) {
                    (true, Some(name)) => dest.join(name),
                    _ => dest.clone(),
                }
            } else {
                dest.join(&rel)
            };
            if let Some(parent) = target.parent() {
                self.ensure_dirs(parent, &owner);
            }
            self.fs.insert(target, Node::file(&owner, content));
        }
        Ok(Applied::ok())
    }

    // Daemon-side directory creation: no permission checks.
    fn ensure_dirs(&mut self, path: &Path, owner: &str) {
        let mut current = PathBuf::from("/");
        for component in path.components().skip(1) {
            current.push(component);
            if !self.fs.exists(&current) {
                self.fs.insert(current.clone(), Node::dir(owner));
            }
        }
    }

    fn apply_inner(&mut self, instruction: &Instruction) -> Result<Applied, HostError> {
        if self.base.is_none() && !matches!(instruction, Instruction::From { .. }) {
            return Err(HostError::NoBase);
        }
        match instruction {
            Instruction::From { image } => self.start_from(image),
            Instruction::Run { command, .. } => self.run(command),
            Instruction::Env { key, value } => {
                let resolved = value.resolve(self.env.get(key).map(String::as_str));
                self.env.insert(key.clone(), resolved);
                Ok(Applied::ok())
            }
            Instruction::Workdir { path } => {
                let path = self.resolve_path(path);
                if !self.fs.exists(&path) {
                    self.ensure_dirs(&path, ROOT_USER);
                }
                self.workdir = path;
                Ok(Applied::ok())
            }
            Instruction::User { name } => {
                let name = name.split(':').next().unwrap_or(name);
                if !self.accounts.contains_key(name) {
                    return Err(HostError::UnknownUser(name.to_string()));
                }
                self.user = name.to_string();
                Ok(Applied::ok())
            }
            Instruction::Copy { source, dest, chown } => self.copy(source, dest, chown.as_deref()),
            Instruction::Cmd { argv } => {
                self.cmd = Some(argv.clone());
                Ok(Applied::ok())
            }
        }
    }
}

impl Host for SimulatedHost {
    type Output = SimImage;

    fn begin_stage(&mut self, plan: &StagePlan) {
        self.stage = Some(plan.stage);
    }

    fn apply(&mut self, instruction: &Instruction) -> Result<Applied, HostError> {
        let before = self.fs.clone();
        let accounts = self.accounts.clone();
        let restore = |host: &mut Self| {
            host.fs = before.clone();
            host.accounts = accounts.clone();
        };

        let applied = match self.apply_inner(instruction) {
            Ok(applied) => applied,
            Err(e) => {
                restore(self);
                return Err(e);
            }
        };

        let tolerated = match instruction {
            Instruction::Run { benign, .. } => {
                benign.iter().any(|b| b.matches(applied.exit_code, &applied.stdout, &applied.stderr))
            }
            _ => false,
        };
        if !applied.success() && !tolerated {
            restore(self);
            return Ok(applied);
        }

        let salt = serde_json::to_vec(instruction).unwrap_or_default();
        let (digest, changes) = self.fs.delta_digest(&before, &salt);
        if changes > 0 || instruction.writes_filesystem() {
            self.layers.push(Layer { stage: self.stage, instruction: describe(instruction), digest, changes });
        }
        Ok(applied)
    }

    fn verify(&mut self, check: &PostCondition) -> Result<Verdict, HostError> {
        Ok(match check {
            PostCondition::OwnedBy { root, owner } => {
                let owner = owner.split(':').next().unwrap_or(owner);
                if !self.fs.exists(root) {
                    Verdict::Violated(format!("{} does not exist", root.display()))
                } else {
                    match self.fs.walk(root).find(|(_, node)| node.owner != owner) {
                        Some((path, node)) => Verdict::Violated(format!(
                            "{} is owned by {}, expected {}",
                            path.display(),
                            node.owner,
                            owner
                        )),
                        None => Verdict::Holds,
                    }
                }
            }
            PostCondition::Absent { path } => {
                if self.fs.exists(path) {
                    Verdict::Violated(format!("{} exists", path.display()))
                } else {
                    Verdict::Holds
                }
            }
        })
    }

    fn finish(self) -> Result<SimImage, HostError> {
        let base = self.base.ok_or(HostError::NoBase)?;
        Ok(SimImage {
            base,
            config: ImageConfig { user: self.user, workdir: self.workdir, env: self.env, cmd: self.cmd },
            layers: self.layers,
            fs: self.fs,
            accounts: self.accounts,
        })
    }
}

fn fail(exit_code: i32, stderr: String) -> Applied {
    Applied { exit_code, stdout: String::new(), stderr: format!("{stderr}\n") }
}

fn source_is_tree(source: &Path, files: &[(PathBuf, Vec<u8>)]) -> bool {
    !(files.len() == 1 && files[0].0.as_os_str().is_empty()) || source == Path::new(".")
}

fn script_location_warning(scripts: &[String], bin: &Path) -> String {
    let bin = bin.display();
    match scripts {
        [single] => format!("WARNING: The script {single} is installed in '{bin}' which is not on PATH.\n"),
        [rest @ .., last] => format!(
            "WARNING: The scripts {} and {last} are installed in '{bin}' which is not on PATH.\n",
            rest.join(", ")
        ),
        [] => String::new(),
    }
}

fn describe(instruction: &Instruction) -> String {
    match instruction {
        Instruction::Run { command, .. } => format!("run {}", command.name()),
        Instruction::From { image } => format!("from {image}"),
        Instruction::Copy { source, dest, .. } => format!("copy {} {}", source.display(), dest.display()),
        other => other.name().to_string(),
    }
}

#[cfg(test)]
#[path = "sim_tests.rs"]
mod tests;
