//! Read-only listing of the modules in a root that activate its reporter.

use crate::context::Context;
use crate::domain::constants::{PYTHON_EXTENSION, SYSTEM_REPORT_CALL};
use crate::domain::errors::Result;
use crate::domain::models::{AddressingMode, ReportSite};
use crate::services::config_store::{self, normalize_root};
use crate::services::path_resolver::{normalized, resolve_reference, RootLayout};
use crate::services::python_scan::{call_lines, scan, source_lines, StatementKind};
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn list_system_reports(ctx: &Context, raw_root: &str) -> Result<Vec<ReportSite>> {
    let key = normalize_root(&ctx.repository, raw_root)?;
    let doc = config_store::load_valid(&ctx.config_file)?;
    let root = config_store::root(&doc, &key)?;
    let Some(reporter_filepath) = root.reporter_filepath.as_deref() else {
        return Ok(vec![]);
    };
    let layout = RootLayout::discover(&ctx.repository, &key)?;
    let stub = layout.stub_path(reporter_filepath);

    let files = if layout.is_script {
        vec![layout.entry_point.clone()]
    } else {
        let mut found = vec![];
        collect_python_files(&layout.base_dir, &mut found);
        found.sort();
        found
    };

    let mut sites = vec![];
    for file in files {
        let file = normalized(&file);
        if file == stub {
            continue;
        }
        let source = match std::fs::read_to_string(&file) {
            Ok(s) => s,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping unreadable module");
                continue;
            }
        };
        let names: Vec<String> = [AddressingMode::Absolute, AddressingMode::Relative]
            .into_iter()
            .filter_map(|mode| resolve_reference(&file, &stub, &layout, mode).ok())
            .map(|r| r.to_string())
            .collect();
        if let Some(site) = inspect_module(&source, &names) {
            sites.push(ReportSite {
                file: file
                    .strip_prefix(&ctx.repository)
                    .map(Path::to_path_buf)
                    .unwrap_or(file),
                ..site
            });
        }
    }
    Ok(sites)
}

/// Unreadable directories are skipped, like unreadable modules.
fn collect_python_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name == "__pycache__" {
            continue;
        }
        if path.is_dir() {
            collect_python_files(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some(PYTHON_EXTENSION) {
            out.push(path);
        }
    }
}

/// Returns a site (without its file) when `source` imports one of `names` at top level.
fn inspect_module(source: &str, names: &[String]) -> Option<ReportSite> {
    let statements = match scan(source) {
        Ok(s) => s,
        Err(e) => {
            warn!(line = e.line, message = %e.message, "skipping module that does not scan");
            return None;
        }
    };
    let lines = source_lines(source);
    let import_lines: Vec<usize> = statements
        .iter()
        .filter(|s| s.kind == StatementKind::Import)
        .filter(|s| {
            let text: String = lines[s.start..=s.end].concat();
            imported_modules(&text).iter().any(|m| names.contains(m))
        })
        .map(|s| s.start + 1)
        .collect();
    if import_lines.is_empty() {
        return None;
    }
    Some(ReportSite {
        file: PathBuf::new(),
        import_lines,
        call_lines: call_lines(source, SYSTEM_REPORT_CALL)
            .into_iter()
            .map(|l| l + 1)
            .collect(),
    })
}

fn bound_names<'a>(rest: impl Iterator<Item = &'a str>) -> Vec<String> {
    rest.collect::<Vec<_>>()
        .join(" ")
        .split(',')
        .filter_map(|item| item.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Every module name an import statement could bind, including
/// `from a import b` naming the submodule `a.b`.
fn imported_modules(statement: &str) -> Vec<String> {
    let cleaned: String = statement
        .lines()
        .map(|l| l.split('#').next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['\\', '(', ')'], " ");
    let mut tokens = cleaned.split_whitespace();
    match tokens.next() {
        Some("import") => bound_names(tokens),
        Some("from") => {
            let Some(module) = tokens.next() else {
                return vec![];
            };
            if tokens.next() != Some("import") {
                return vec![];
            }
            let mut out = vec![module.to_string()];
            for name in bound_names(tokens) {
                if module.ends_with('.') {
                    out.push(format!("{}{}", module, name));
                } else {
                    out.push(format!("{}.{}", module, name));
                }
            }
            out
        }
        _ => vec![],
    }
}
