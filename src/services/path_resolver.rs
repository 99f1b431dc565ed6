//! Module references between an importing file and a root's reporter stub.
//!
//! Everything here is lexical: paths are compared component by component,
//! nothing is canonicalized, and the only filesystem access is
//! [`RootLayout::discover`] deciding whether a root is a package or a script.

use crate::domain::constants::PACKAGE_ENTRY_POINT;
use crate::domain::errors::{GraftError, Result};
use crate::domain::models::{AddressingMode, ModuleReference};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Where a root lives on disk and what it is called on `sys.path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootLayout {
    pub root_path: String,
    /// Directory the stub path is relative to: the package itself, or the
    /// directory containing a script root.
    pub base_dir: PathBuf,
    /// Dotted package name of `base_dir`; empty for script roots.
    pub package: Vec<String>,
    pub entry_point: PathBuf,
    pub is_script: bool,
}

impl RootLayout {
    pub fn discover(repository: &Path, root_path: &str) -> Result<Self> {
        let full = if root_path == "." {
            repository.to_path_buf()
        } else {
            repository.join(root_path)
        };
        if full.is_dir() {
            return Ok(Self {
                root_path: root_path.to_string(),
                entry_point: full.join(PACKAGE_ENTRY_POINT),
                base_dir: full,
                package: root_path
                    .split('/')
                    .filter(|s| !s.is_empty() && *s != ".")
                    .map(str::to_string)
                    .collect(),
                is_script: false,
            });
        }
        if full.is_file() {
            let base_dir = full
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| repository.to_path_buf());
            return Ok(Self {
                root_path: root_path.to_string(),
                base_dir,
                package: vec![],
                entry_point: full,
                is_script: true,
            });
        }
        Err(GraftError::TargetNotFound(full))
    }

    pub fn stub_path(&self, reporter_filepath: &str) -> PathBuf {
        normalized(&self.base_dir.join(reporter_filepath))
    }
}

/// Computes how `target` should import `stub`.
///
/// Relative references are specific to the importing file's directory and
/// must be recomputed for every insertion site.
pub fn resolve_reference(
    target: &Path,
    stub: &Path,
    layout: &RootLayout,
    mode: AddressingMode,
) -> Result<ModuleReference> {
    let target = normalized(target);
    let stub = normalized(stub);
    if target == stub {
        return Err(GraftError::SelfReference(target));
    }

    let base = normalized(&layout.base_dir);
    let stub_rel = stub
        .strip_prefix(&base)
        .map_err(|_| GraftError::unresolvable(&target, &stub, "stub lies outside the root"))?;
    let stem = stub
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| GraftError::unresolvable(&target, &stub, "stub has no file name"))?;

    let reference = match mode {
        AddressingMode::Absolute => {
            let mut segments = layout.package.clone();
            segments.extend(dir_segments(stub_rel.parent()));
            segments.push(stem);
            ModuleReference::Absolute(segments)
        }
        AddressingMode::Relative => {
            if layout.is_script {
                return Err(GraftError::unresolvable(
                    &target,
                    &stub,
                    "a script root has no package to import relative to",
                ));
            }
            let target_dir = target.parent().unwrap_or(Path::new(""));
            if !target_dir.starts_with(&base) {
                return Err(GraftError::unresolvable(
                    &target,
                    &stub,
                    "importing file is outside the root's package",
                ));
            }
            let from: Vec<OsString> = components(target_dir);
            let to: Vec<OsString> = components(stub.parent().unwrap_or(Path::new("")));
            let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
            let mut segments: Vec<String> = to[common..]
                .iter()
                .map(|s| s.to_string_lossy().into_owned())
                .collect();
            segments.push(stem);
            ModuleReference::Relative {
                parents: from.len() - common,
                segments,
            }
        }
    };

    let segments = match &reference {
        ModuleReference::Absolute(s) => s,
        ModuleReference::Relative { segments, .. } => segments,
    };
    if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
        return Err(GraftError::unresolvable(
            &target,
            &stub,
            format!("{:?} is not a valid Python identifier", bad),
        ));
    }
    Ok(reference)
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn dir_segments(dir: Option<&Path>) -> Vec<String> {
    dir.map(components)
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.to_string_lossy().into_owned())
        .collect()
}

fn components(p: &Path) -> Vec<OsString> {
    p.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_os_string()),
            _ => None,
        })
        .collect()
}

/// Drops `.` and folds `..` into its parent where possible.
pub fn normalized(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
