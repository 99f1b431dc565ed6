//! The two instrumentation use cases: registering a root's reporter and
//! adding a report call to one more module.
//!
//! Registration walks `Unconfigured → StubRendered → StubWritten →
//! EntryPointPatched → Persisted`. There is no rollback: each step is either
//! idempotent or refuses to run twice, so re-running after a failure is the
//! recovery path.

use crate::context::Context;
use crate::domain::constants::DEFAULT_REPORTER_FILENAME;
use crate::domain::errors::{GraftError, Result};
use crate::domain::models::{RegistrationReport, RegistrationStage, ReportInsertion};
use crate::services::config_store::{self, check_reporter_filepath, normalize_root};
use crate::services::path_resolver::{normalized, resolve_reference, RootLayout};
use crate::services::patcher::{entry_point_for, insert_activation, prepare_target};
use crate::services::storage::create_file;
use crate::services::template::activation_for;
use std::path::Path;
use tracing::{debug, info};

fn advance(root: &str, from: RegistrationStage, to: RegistrationStage) -> RegistrationStage {
    debug!(root, ?from, ?to, "registration stage");
    to
}

fn choose_reporter_filepath(
    root: &str,
    requested: Option<&str>,
    recorded: Option<&str>,
) -> Result<String> {
    match (requested, recorded) {
        (Some(req), Some(rec)) if normalized(Path::new(req)) != normalized(Path::new(rec)) => {
            Err(GraftError::ReporterPathConflict {
                root: root.to_string(),
                recorded: rec.to_string(),
                requested: req.to_string(),
            })
        }
        (Some(req), _) => Ok(req.to_string()),
        (None, Some(rec)) => Ok(rec.to_string()),
        (None, None) => Ok(DEFAULT_REPORTER_FILENAME.to_string()),
    }
}

pub fn add_reporter(
    ctx: &Context,
    raw_root: &str,
    requested: Option<&str>,
) -> Result<RegistrationReport> {
    let key = normalize_root(&ctx.repository, raw_root)?;
    let mut doc = config_store::load_valid(&ctx.config_file)?;
    let root = config_store::root(&doc, &key)?;
    let reporter_filepath =
        choose_reporter_filepath(&key, requested, root.reporter_filepath.as_deref())?;
    let layout = RootLayout::discover(&ctx.repository, &key)?;
    let stub = layout.stub_path(&reporter_filepath);
    if let Err(reason) = check_reporter_filepath(&reporter_filepath) {
        return Err(GraftError::unresolvable(&layout.entry_point, &stub, reason));
    }

    let mut stage = RegistrationStage::Unconfigured;
    let token = root
        .reporter_token
        .as_deref()
        .ok_or_else(|| GraftError::MissingToken(key.clone()))?;
    let contents = ctx.template.render(&root.project_name, token)?;
    stage = advance(&key, stage, RegistrationStage::StubRendered);

    // Resolved before anything is written so that a bad reference touches no files.
    let reference = resolve_reference(
        &layout.entry_point,
        &stub,
        &layout,
        root.addressing_mode(),
    )?;

    if stub.exists() {
        return Err(GraftError::StubAlreadyExists(stub));
    }
    create_file(&stub, contents.as_bytes()).map_err(|e| match e {
        GraftError::Write { source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists => {
            GraftError::StubAlreadyExists(stub.clone())
        }
        other => other,
    })?;
    info!(root = %key, stub = %stub.display(), "reporter stub written");
    stage = advance(&key, stage, RegistrationStage::StubWritten);

    let entry_point = prepare_target(&layout.entry_point)?;
    let patch = insert_activation(&entry_point, &activation_for(&reference))?;
    stage = advance(&key, stage, RegistrationStage::EntryPointPatched);

    if let Some(entry) = doc.roots.get_mut(&key) {
        entry.reporter_filepath = Some(reporter_filepath.clone());
    }
    config_store::save(&ctx.config_file, &doc)?;
    stage = advance(&key, stage, RegistrationStage::Persisted);

    Ok(RegistrationReport {
        root: key,
        stage,
        reporter_filepath,
        stub,
        entry_point,
        reference,
        patch,
    })
}

/// Patches `submodule` (relative to the root; the root's entry point when
/// `None`) to activate the already registered stub. The configuration is not written.
pub fn add_system_report(
    ctx: &Context,
    raw_root: &str,
    submodule: Option<&Path>,
) -> Result<ReportInsertion> {
    let key = normalize_root(&ctx.repository, raw_root)?;
    let doc = config_store::load_valid(&ctx.config_file)?;
    let root = config_store::root(&doc, &key)?;
    let reporter_filepath = root
        .reporter_filepath
        .as_deref()
        .ok_or_else(|| GraftError::ReporterNotRegistered(key.clone()))?;
    let layout = RootLayout::discover(&ctx.repository, &key)?;
    let stub = layout.stub_path(reporter_filepath);
    if !stub.is_file() {
        return Err(GraftError::StubMissing(stub));
    }

    let requested = match submodule {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => layout.base_dir.join(p),
        None => layout.entry_point.clone(),
    };
    let target = normalized(&entry_point_for(&requested));
    let inside = if layout.is_script {
        target == normalized(&layout.entry_point)
    } else {
        target.starts_with(normalized(&layout.base_dir))
    };
    if !inside {
        return Err(GraftError::unresolvable(
            &target,
            &stub,
            "target lies outside the root",
        ));
    }
    let reference = resolve_reference(&target, &stub, &layout, root.addressing_mode())?;
    let target = prepare_target(&target)?;
    let patch = insert_activation(&target, &activation_for(&reference))?;

    Ok(ReportInsertion {
        root: key,
        target,
        reference,
        patch,
    })
}
