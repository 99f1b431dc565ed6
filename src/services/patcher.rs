//! Insertion of activation statements after the top-level import block.

use crate::domain::constants::PACKAGE_ENTRY_POINT;
use crate::domain::errors::{GraftError, Result};
use crate::domain::models::{ActivationStatement, PatchOutcome};
use crate::services::python_scan::{insertion_line, scan, source_lines, ScanError};
use crate::services::storage::{create_file, replace_file};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BOM: char = '\u{feff}';

/// The file a requested target stands for: a directory means its `__init__.py`.
pub fn entry_point_for(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(PACKAGE_ENTRY_POINT)
    } else {
        path.to_path_buf()
    }
}

/// Maps a requested target onto the file that should be patched.
///
/// A package's `__init__.py` is created empty when missing.
pub fn prepare_target(path: &Path) -> Result<PathBuf> {
    let entry_point = entry_point_for(path);
    if entry_point.is_file() {
        return Ok(entry_point);
    }
    let creatable = entry_point.file_name().and_then(|n| n.to_str()) == Some(PACKAGE_ENTRY_POINT)
        && entry_point.parent().map(Path::is_dir).unwrap_or(false);
    if !creatable {
        return Err(GraftError::TargetNotFound(entry_point));
    }
    if !entry_point.exists() {
        match create_file(&entry_point, b"") {
            Ok(()) => info!(file = %entry_point.display(), "created empty package entry point"),
            Err(GraftError::Write { source, .. })
                if source.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }
    Ok(entry_point)
}

fn block_position(lines: &[&str], block: &[String], limit: usize) -> Option<usize> {
    if block.is_empty() || lines.len() < block.len() {
        return None;
    }
    let last_start = limit.min(lines.len() - block.len());
    (0..=last_start).find(|&s| {
        block
            .iter()
            .enumerate()
            .all(|(t, want)| line_text(lines[s + t]) == want)
    })
}

fn line_text(line: &str) -> &str {
    line.trim_start_matches(BOM).trim_end_matches(['\r', '\n'])
}

/// Lines that must stay first in the file: a `#!` line and a PEP 263
/// encoding declaration on the first or second line.
fn header_lines(lines: &[&str]) -> usize {
    let mut header = 0;
    for (i, raw) in lines.iter().take(2).enumerate() {
        let line = line_text(raw);
        let shebang = i == 0 && line.starts_with("#!");
        let cookie = line.trim_start().starts_with('#')
            && (line.contains("coding:") || line.contains("coding="));
        if !(shebang || cookie) {
            break;
        }
        header = i + 1;
    }
    header
}

/// Pure form of [`insert_activation`]: returns the outcome and, when the
/// activation was not already there, the new file contents.
pub fn apply_activation(
    source: &str,
    activation: &ActivationStatement,
) -> std::result::Result<(PatchOutcome, Option<String>), ScanError> {
    let statements = scan(source)?;
    let lines = source_lines(source);
    let at = insertion_line(&statements).max(header_lines(&lines));

    if let Some(line) = block_position(&lines, &activation.lines, at) {
        return Ok((PatchOutcome::AlreadyApplied { line }, None));
    }

    let newline = match lines.first() {
        Some(l) if l.ends_with("\r\n") => "\r\n",
        _ => "\n",
    };
    let mut out = String::with_capacity(source.len() + activation.text().len() + 2);
    for l in &lines[..at] {
        out.push_str(l);
    }
    if at > 0 && !lines[at - 1].ends_with('\n') {
        out.push_str(newline);
    }
    let mut rest = lines[at..].iter().copied();
    let bom_first = at == 0 && lines.first().is_some_and(|l| l.starts_with(BOM));
    if bom_first {
        out.push(BOM);
    }
    for l in &activation.lines {
        out.push_str(l);
        out.push_str(newline);
    }
    if bom_first {
        if let Some(first) = rest.next() {
            out.push_str(first.trim_start_matches(BOM));
        }
    }
    for l in rest {
        out.push_str(l);
    }
    Ok((PatchOutcome::Inserted { line: at }, Some(out)))
}

pub fn insert_activation(target: &Path, activation: &ActivationStatement) -> Result<PatchOutcome> {
    let bytes = std::fs::read(target).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GraftError::TargetNotFound(target.to_path_buf()),
        _ => GraftError::Parse {
            path: target.to_path_buf(),
            line: 0,
            message: e.to_string(),
        },
    })?;
    let source = String::from_utf8(bytes).map_err(|e| GraftError::Parse {
        path: target.to_path_buf(),
        line: 0,
        message: format!("not valid UTF-8: {}", e.utf8_error()),
    })?;

    let (outcome, patched) =
        apply_activation(&source, activation).map_err(|e| GraftError::Parse {
            path: target.to_path_buf(),
            line: e.line,
            message: e.message,
        })?;

    match patched {
        Some(contents) => {
            replace_file(target, contents.as_bytes())?;
            info!(file = %target.display(), line = outcome.line() + 1, "activation inserted");
        }
        None => {
            debug!(file = %target.display(), line = outcome.line() + 1, "activation already present")
        }
    }
    Ok(outcome)
}
