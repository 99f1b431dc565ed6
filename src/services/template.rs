//! Reporter stub rendering and activation statement generation.

use crate::domain::constants::{
    PROJECT_NAME_PLACEHOLDER, REPORTER_OBJECT, REPORTER_TOKEN_PLACEHOLDER, SYSTEM_REPORT_CALL,
};
use crate::domain::errors::{GraftError, Result};
use crate::domain::models::{ActivationStatement, ModuleReference};
use crate::services::python_scan::scan;
use std::path::Path;
use tracing::warn;

pub const BUILTIN_TEMPLATE: &str = include_str!("../../templates/report.py.template");

/// Holds the stub skeleton loaded at startup.
///
/// A skeleton that failed to load is kept as `None` together with the reason,
/// so that only the operations that actually render fail.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    skeleton: Option<String>,
    origin: String,
}

impl TemplateRenderer {
    pub fn builtin() -> Self {
        Self {
            skeleton: Some(BUILTIN_TEMPLATE.to_string()),
            origin: "built-in template".to_string(),
        }
    }

    /// Loads a replacement skeleton, or the built-in one when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };
        let origin = path.display().to_string();
        let skeleton = match std::fs::read_to_string(path) {
            Ok(raw) => match check_skeleton(&raw) {
                Ok(()) => Some(raw),
                Err(reason) => {
                    warn!(template = %origin, "could not load reporter template: {}", reason);
                    None
                }
            },
            Err(e) => {
                warn!(template = %origin, "could not load reporter template: {}", e);
                None
            }
        };
        Self { skeleton, origin }
    }

    pub fn is_loaded(&self) -> bool {
        self.skeleton.is_some()
    }

    pub fn render(&self, project_name: &str, reporter_token: &str) -> Result<String> {
        let skeleton = self
            .skeleton
            .as_deref()
            .ok_or_else(|| GraftError::TemplateMissing(self.origin.clone()))?;
        check_value("project name", project_name)?;
        check_value("reporter token", reporter_token)?;

        let rendered = substitute(
            skeleton,
            &[
                (PROJECT_NAME_PLACEHOLDER, project_name),
                (REPORTER_TOKEN_PLACEHOLDER, reporter_token),
            ],
        );
        scan(&rendered).map_err(|e| {
            GraftError::TemplateRender(format!(
                "rendered stub is not valid Python (line {}: {})",
                e.line, e.message
            ))
        })?;
        Ok(rendered)
    }
}

/// Single pass over the skeleton: substituted values are never rescanned, so
/// a value spelling a placeholder stays literal.
fn substitute(skeleton: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(skeleton.len());
    let mut rest = skeleton;
    loop {
        let next = values
            .iter()
            .filter_map(|(placeholder, value)| {
                rest.find(placeholder).map(|at| (at, *placeholder, *value))
            })
            .min_by_key(|(at, _, _)| *at);
        let Some((at, placeholder, value)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + placeholder.len()..];
    }
}

fn check_skeleton(raw: &str) -> std::result::Result<(), String> {
    for placeholder in [PROJECT_NAME_PLACEHOLDER, REPORTER_TOKEN_PLACEHOLDER] {
        let count = raw.matches(placeholder).count();
        if count != 1 {
            return Err(format!(
                "expected {} exactly once, found it {} times",
                placeholder, count
            ));
        }
    }
    Ok(())
}

/// Values land inside Python string literals.
fn check_value(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GraftError::TemplateRender(format!("{} is empty", what)));
    }
    if let Some(c) = value.chars().find(|c| matches!(c, '"' | '\\' | '\n' | '\r')) {
        return Err(GraftError::TemplateRender(format!(
            "{} contains {:?}, which cannot appear in a Python string literal",
            what, c
        )));
    }
    Ok(())
}

pub fn activation_for(reference: &ModuleReference) -> ActivationStatement {
    let lines = match reference {
        ModuleReference::Absolute(_) => vec![
            format!("import {}", reference),
            format!("{}.{}.{}()", reference, REPORTER_OBJECT, SYSTEM_REPORT_CALL),
        ],
        ModuleReference::Relative { .. } => vec![
            format!("from {} import {}", reference, REPORTER_OBJECT),
            format!("{}.{}()", REPORTER_OBJECT, SYSTEM_REPORT_CALL),
        ],
    };
    ActivationStatement { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn render_is_deterministic_and_fills_both_points() {
        let t = TemplateRenderer::builtin();
        let a = t.render("a_package", "T").unwrap();
        let b = t.render("a_package", "T").unwrap();
        assert_eq!(a, b);
        assert!(a.contains("PROJECT_NAME = \"a_package\""));
        assert!(a.contains("REPORTER_TOKEN = \"T\""));
        assert!(!a.contains(PROJECT_NAME_PLACEHOLDER));
        assert!(a.contains("reporter = HumbugReporter("));
    }

    #[test]
    fn empty_values_are_refused() {
        let t = TemplateRenderer::builtin();
        assert!(matches!(t.render("", "T"), Err(GraftError::TemplateRender(_))));
        assert!(matches!(t.render("p", "  "), Err(GraftError::TemplateRender(_))));
    }

    #[test]
    fn values_that_break_the_literal_are_refused() {
        let t = TemplateRenderer::builtin();
        assert!(t.render("evil\" + exec('x') + \"", "T").is_err());
        assert!(t.render("p", "line\nbreak").is_err());
    }

    #[test]
    fn placeholder_text_in_a_value_is_not_substituted() {
        let out = TemplateRenderer::builtin()
            .render("{reporter_token}", "SECRET")
            .unwrap();
        assert!(out.contains("PROJECT_NAME = \"{reporter_token}\""));
        assert!(out.contains("REPORTER_TOKEN = \"SECRET\""));
        assert_eq!(out.matches("SECRET").count(), 1);

        let out = TemplateRenderer::builtin()
            .render("p", "{project_name}")
            .unwrap();
        assert!(out.contains("PROJECT_NAME = \"p\""));
        assert!(out.contains("REPORTER_TOKEN = \"{project_name}\""));
    }

    #[test]
    fn missing_template_file_fails_only_on_render() {
        let tmp = TempDir::new().unwrap();
        let t = TemplateRenderer::load(Some(&tmp.path().join("nope.template")));
        assert!(!t.is_loaded());
        let err = t.render("p", "T").unwrap_err();
        assert_eq!(err.code(), "TEMPLATE_MISSING");
    }

    #[test]
    fn template_without_placeholders_counts_as_missing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.py.template");
        std::fs::write(&path, "reporter = None\n").unwrap();
        assert!(!TemplateRenderer::load(Some(&path)).is_loaded());
    }

    #[test]
    fn custom_template_is_used() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.py.template");
        std::fs::write(
            &path,
            "NAME = \"{project_name}\"\nTOKEN = \"{reporter_token}\"\nreporter = object()\n",
        )
        .unwrap();
        let out = TemplateRenderer::load(Some(&path)).render("p", "T").unwrap();
        assert_eq!(out, "NAME = \"p\"\nTOKEN = \"T\"\nreporter = object()\n");
    }

    #[test]
    fn activation_lines_per_mode() {
        let abs = activation_for(&ModuleReference::Absolute(vec![
            "a_package".to_string(),
            "report".to_string(),
        ]));
        assert_eq!(
            abs.lines,
            vec!["import a_package.report", "a_package.report.reporter.system_report()"]
        );

        let rel = activation_for(&ModuleReference::Relative {
            parents: 1,
            segments: vec!["report".to_string()],
        });
        assert_eq!(
            rel.lines,
            vec!["from ..report import reporter", "reporter.system_report()"]
        );
    }
}
