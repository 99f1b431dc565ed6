use crate::cli::Cli;
use crate::services::config_store::default_config_file;
use crate::services::template::TemplateRenderer;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process-wide state, built once from the command line and passed down.
#[derive(Debug, Clone)]
pub struct Context {
    pub repository: PathBuf,
    pub config_file: PathBuf,
    pub template: TemplateRenderer,
    pub json: bool,
}

impl Context {
    pub fn new(repository: &Path, template: TemplateRenderer, json: bool) -> Self {
        Self {
            repository: repository.to_path_buf(),
            config_file: default_config_file(repository),
            template,
            json,
        }
    }

    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let repository = if cli.repository.is_absolute() {
            cli.repository.clone()
        } else {
            std::env::current_dir()?.join(&cli.repository)
        };
        if !repository.is_dir() {
            anyhow::bail!("repository is not a directory: {}", repository.display());
        }
        let template = TemplateRenderer::load(cli.template.as_deref());
        debug!(
            repository = %repository.display(),
            template_loaded = template.is_loaded(),
            "context ready"
        );
        Ok(Self::new(&repository, template, cli.json))
    }

    /// Name used for a root registered at the repository itself.
    pub fn repository_name(&self) -> String {
        self.repository
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .last()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string())
    }
}
