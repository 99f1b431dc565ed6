use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

/// One entry of `graft.json`, exactly as stored.
///
/// Every field is optional here so that a document with mistakes still loads
/// and can be reported on by `validate`; [`IntegrationRoot`] is the checked form.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RootEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_imports: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_token: Option<String>,
    /// Relative to `python_root`. Set once, when the stub is first written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_filepath: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConfigDocument {
    pub roots: BTreeMap<String, RootEntry>,
}

/// A validated configuration entry.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct IntegrationRoot {
    pub root_path: String,
    pub project_name: String,
    pub relative_imports: bool,
    pub reporter_token: Option<String>,
    pub reporter_filepath: Option<String>,
}

impl IntegrationRoot {
    pub fn addressing_mode(&self) -> AddressingMode {
        if self.relative_imports {
            AddressingMode::Relative
        } else {
            AddressingMode::Absolute
        }
    }
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    Absolute,
    Relative,
}

/// Dotted Python module reference from an importing file to the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleReference {
    Absolute(Vec<String>),
    /// `parents` counts directory levels above the importing file's own package.
    Relative { parents: usize, segments: Vec<String> },
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleReference::Absolute(segments) => write!(f, "{}", segments.join(".")),
            ModuleReference::Relative { parents, segments } => {
                write!(f, "{}{}", ".".repeat(parents + 1), segments.join("."))
            }
        }
    }
}

impl Serialize for ModuleReference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Import of the stub followed by a call of its report capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationStatement {
    pub lines: Vec<String>,
}

impl ActivationStatement {
    pub fn text(&self) -> String {
        self.lines.iter().map(|l| format!("{}\n", l)).collect()
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// Activation now occupies lines `line..line + k` (0-based).
    Inserted { line: usize },
    AlreadyApplied { line: usize },
}

impl PatchOutcome {
    pub fn line(&self) -> usize {
        match self {
            PatchOutcome::Inserted { line } | PatchOutcome::AlreadyApplied { line } => *line,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStage {
    Unconfigured,
    StubRendered,
    StubWritten,
    EntryPointPatched,
    Persisted,
}

#[derive(Debug, Serialize)]
pub struct RegistrationReport {
    pub root: String,
    pub stage: RegistrationStage,
    pub reporter_filepath: String,
    pub stub: PathBuf,
    pub entry_point: PathBuf,
    pub reference: ModuleReference,
    pub patch: PatchOutcome,
}

#[derive(Debug, Serialize)]
pub struct ReportInsertion {
    pub root: String,
    pub target: PathBuf,
    pub reference: ModuleReference,
    pub patch: PatchOutcome,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ReportSite {
    pub file: PathBuf,
    /// 1-based line numbers, matching what editors show.
    pub import_lines: Vec<usize>,
    pub call_lines: Vec<usize>,
}

#[derive(Serialize)]
pub struct RootSummary {
    pub root: String,
    pub project_name: String,
    pub relative_imports: bool,
    pub has_token: bool,
    pub reporter_filepath: Option<String>,
}
