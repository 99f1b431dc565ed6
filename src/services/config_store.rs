//! Persistence and validation of `graft.json`.

use crate::domain::constants::{CONFIG_FILENAME, PYTHON_EXTENSION};
use crate::domain::errors::{GraftError, Result};
use crate::domain::models::{ConfigDocument, IntegrationRoot, RootEntry, ValidationReport};
use crate::services::storage::{create_file, replace_file};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

pub fn default_config_file(repository: &Path) -> PathBuf {
    repository.join(CONFIG_FILENAME)
}

pub fn load(path: &Path) -> Result<ConfigDocument> {
    let raw = std::fs::read_to_string(path).map_err(|e| GraftError::ConfigRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| GraftError::ConfigRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Loads the document and refuses it if `validate` finds errors.
/// Warnings are logged.
pub fn load_valid(path: &Path) -> Result<ConfigDocument> {
    let doc = load(path)?;
    let report = validate(&doc);
    for w in &report.warnings {
        warn!(config = %path.display(), "{}", w);
    }
    if !report.is_valid() {
        return Err(GraftError::ConfigInvalid {
            path: path.to_path_buf(),
            errors: report.errors,
        });
    }
    Ok(doc)
}

fn render(doc: &ConfigDocument) -> Result<String> {
    let mut out = serde_json::to_string_pretty(doc).map_err(|e| {
        GraftError::write(
            CONFIG_FILENAME,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;
    out.push('\n');
    Ok(out)
}

pub fn save(path: &Path, doc: &ConfigDocument) -> Result<()> {
    replace_file(path, render(doc)?.as_bytes())?;
    info!(config = %path.display(), roots = doc.roots.len(), "configuration saved");
    Ok(())
}

pub fn initialize(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(GraftError::ConfigExists(path.to_path_buf()));
    }
    create_file(path, render(&ConfigDocument::default())?.as_bytes()).map_err(|e| match e {
        GraftError::Write { source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists => {
            GraftError::ConfigExists(path.to_path_buf())
        }
        other => other,
    })?;
    info!(config = %path.display(), "configuration initialized");
    Ok(())
}

pub fn validate(doc: &ConfigDocument) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (key, entry) in &doc.roots {
        validate_entry(key, entry, &mut report);
    }
    report
}

fn validate_entry(key: &str, entry: &RootEntry, report: &mut ValidationReport) {
    match entry.python_root.as_deref() {
        None | Some("") => report
            .errors
            .push(format!("{}: no Python root specified", key)),
        Some(root) if root != key => report.errors.push(format!(
            "{}: key does not match python_root ({})",
            key, root
        )),
        Some(_) => {}
    }

    if entry.relative_imports.is_none() {
        report.errors.push(format!(
            "{}: does not specify whether or not to use relative imports",
            key
        ));
    }

    match entry.project_name.as_deref() {
        None => report.warnings.push(format!(
            "{}: no project name; reports will be tagged {}",
            key,
            default_project_name(key)
        )),
        Some("") => report.errors.push(format!("{}: project name is empty", key)),
        Some(_) => {}
    }

    match entry.reporter_token.as_deref() {
        None | Some("") => report
            .warnings
            .push(format!("{}: no reporter token found", key)),
        Some(_) => {}
    }

    if let Some(stub) = entry.reporter_filepath.as_deref() {
        if let Err(reason) = check_reporter_filepath(stub) {
            report
                .errors
                .push(format!("{}: invalid reporter_filepath {}: {}", key, stub, reason));
        }
    }
}

/// A stub path must be a relative `.py` file that stays under its root.
pub fn check_reporter_filepath(raw: &str) -> std::result::Result<(), &'static str> {
    let p = Path::new(raw);
    if p.extension().and_then(|e| e.to_str()) != Some(PYTHON_EXTENSION) {
        return Err("not a .py file");
    }
    for c in p.components() {
        match c {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err("leaves the Python root"),
            Component::RootDir | Component::Prefix(_) => return Err("must be relative"),
        }
    }
    Ok(())
}

/// Last path segment of the root; the repository itself is `.`.
pub fn default_project_name(root_path: &str) -> String {
    root_path
        .rsplit('/')
        .find(|s| !s.is_empty() && *s != ".")
        .unwrap_or(root_path)
        .to_string()
}

/// Turns a user supplied root (absolute, `./`-prefixed, trailing slash...)
/// into the repository-relative key used in the document.
pub fn normalize_root(repository: &Path, raw: &str) -> Result<String> {
    let candidate = Path::new(raw);
    let relative = if candidate.is_absolute() {
        strip_repository(repository, candidate)
            .ok_or_else(|| GraftError::RootNotFound(raw.to_string()))?
    } else {
        candidate.to_path_buf()
    };

    let mut segments: Vec<String> = Vec::new();
    for c in relative.components() {
        match c {
            Component::Normal(s) => segments.push(s.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(GraftError::RootNotFound(raw.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(GraftError::RootNotFound(raw.to_string()))
            }
        }
    }
    if segments.is_empty() {
        return Ok(".".to_string());
    }
    Ok(segments.join("/"))
}

fn strip_repository(repository: &Path, candidate: &Path) -> Option<PathBuf> {
    if let Ok(rest) = candidate.strip_prefix(repository) {
        return Some(rest.to_path_buf());
    }
    let repo = repository.canonicalize().ok()?;
    let cand = candidate.canonicalize().ok()?;
    cand.strip_prefix(repo).ok().map(Path::to_path_buf)
}

/// Resolves a registered entry. The document is expected to have passed `validate`.
pub fn root(doc: &ConfigDocument, key: &str) -> Result<IntegrationRoot> {
    let entry = doc
        .roots
        .get(key)
        .ok_or_else(|| GraftError::RootNotFound(key.to_string()))?;
    Ok(IntegrationRoot {
        root_path: key.to_string(),
        project_name: entry
            .project_name
            .clone()
            .unwrap_or_else(|| default_project_name(key)),
        relative_imports: entry.relative_imports.unwrap_or(false),
        reporter_token: entry.reporter_token.clone().filter(|t| !t.is_empty()),
        reporter_filepath: entry.reporter_filepath.clone(),
    })
}

/// Adds or updates a root. Token and stub path of an existing entry survive.
pub fn register_root<'a>(
    doc: &'a mut ConfigDocument,
    key: &str,
    project_name: Option<&str>,
    relative_imports: bool,
) -> &'a mut RootEntry {
    let entry = doc.roots.entry(key.to_string()).or_default();
    entry.python_root = Some(key.to_string());
    entry.project_name = Some(
        project_name
            .map(str::to_string)
            .or_else(|| entry.project_name.clone())
            .unwrap_or_else(|| default_project_name(key)),
    );
    entry.relative_imports = Some(relative_imports);
    entry
}

/// Sets the token, registering the root with defaults when it is new.
pub fn set_reporter_token<'a>(
    doc: &'a mut ConfigDocument,
    key: &str,
    token: &str,
) -> &'a mut RootEntry {
    if !doc.roots.contains_key(key) {
        register_root(doc, key, None, false);
    }
    let entry = doc.roots.entry(key.to_string()).or_default();
    entry.reporter_token = Some(token.to_string());
    entry
}
