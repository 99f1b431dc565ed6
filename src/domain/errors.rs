use std::path::PathBuf;

/// Every failure the core can report.
///
/// Variants map one-to-one onto the stable codes returned by [`GraftError::code`],
/// which is what `--json` output exposes to callers.
#[derive(thiserror::Error, Debug)]
pub enum GraftError {
    #[error("could not read configuration {path}: {reason}")]
    ConfigRead { path: PathBuf, reason: String },
    #[error("pre-existing configuration found: {0}")]
    ConfigExists(PathBuf),
    #[error("invalid configuration {path}:\n{}", bullet_list(.errors))]
    ConfigInvalid { path: PathBuf, errors: Vec<String> },
    #[error("root {0} is not registered in the configuration")]
    RootNotFound(String),
    #[error("root {0} has no reporter token; run `graft token {0} <TOKEN>` first")]
    MissingToken(String),
    #[error("reporter template could not be loaded at startup ({0})")]
    TemplateMissing(String),
    #[error("cannot render reporter template: {0}")]
    TemplateRender(String),
    #[error("{0} is the reporter stub itself and cannot import it")]
    SelfReference(PathBuf),
    #[error("cannot reference {stub} from {target}: {reason}")]
    UnresolvableReference {
        target: PathBuf,
        stub: PathBuf,
        reason: String,
    },
    #[error("object already exists at reporter path: {0}")]
    StubAlreadyExists(PathBuf),
    #[error("reporter stub is registered but missing on disk: {0}")]
    StubMissing(PathBuf),
    #[error("root {root} expects its reporter at {recorded}, not {requested}")]
    ReporterPathConflict {
        root: String,
        recorded: String,
        requested: String,
    },
    #[error("no reporter registered for root {0}; run `graft add-reporter {0}` first")]
    ReporterNotRegistered(String),
    #[error("target not found: {0}")]
    TargetNotFound(PathBuf),
    #[error("cannot parse {path}: line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("write failed for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraftError {
    pub fn code(&self) -> &'static str {
        match self {
            GraftError::ConfigRead { .. } => "CONFIG_READ",
            GraftError::ConfigExists(_) => "CONFIG_EXISTS",
            GraftError::ConfigInvalid { .. } => "CONFIG_INVALID",
            GraftError::RootNotFound(_) => "ROOT_NOT_FOUND",
            GraftError::MissingToken(_) => "MISSING_TOKEN",
            GraftError::TemplateMissing(_) => "TEMPLATE_MISSING",
            GraftError::TemplateRender(_) => "TEMPLATE_RENDER",
            GraftError::SelfReference(_) => "SELF_REFERENCE",
            GraftError::UnresolvableReference { .. } => "UNRESOLVABLE_REFERENCE",
            GraftError::StubAlreadyExists(_) => "STUB_EXISTS",
            GraftError::StubMissing(_) => "STUB_MISSING",
            GraftError::ReporterPathConflict { .. } => "REPORTER_PATH_CONFLICT",
            GraftError::ReporterNotRegistered(_) => "REPORTER_NOT_REGISTERED",
            GraftError::TargetNotFound(_) => "TARGET_NOT_FOUND",
            GraftError::Parse { .. } => "PARSE",
            GraftError::Write { .. } => "WRITE",
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn unresolvable(
        target: impl Into<PathBuf>,
        stub: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvableReference {
            target: target.into(),
            stub: stub.into(),
            reason: reason.into(),
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, GraftError>;
