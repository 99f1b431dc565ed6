use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "graft",
    version,
    about = "Retrofit usage and crash reporting into Python code bases"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        short = 'r',
        long,
        global = true,
        env = "GRAFT_REPOSITORY",
        default_value = ".",
        help = "Repository holding graft.json and the Python roots"
    )]
    pub repository: PathBuf,
    #[arg(
        long,
        global = true,
        env = "GRAFT_TEMPLATE",
        help = "Reporter stub template (the built-in one when omitted)"
    )]
    pub template: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty graft.json in the repository
    Init,
    /// Register a Python root (package directory or script)
    Register {
        root: String,
        #[arg(long)]
        project_name: Option<String>,
        #[arg(long, default_value_t = false)]
        relative_imports: bool,
    },
    /// Set the reporter token of a root, registering it when new
    Token { root: String, token: String },
    /// Check graft.json for errors and warnings
    Validate,
    /// Show every registered root
    Show,
    /// Write the reporter stub of a root and activate it from the entry point
    AddReporter {
        root: String,
        #[arg(long, short = 'o', help = "Stub path relative to the root")]
        reporter_file: Option<String>,
    },
    /// Activate a root's reporter from one more module
    AddReport {
        root: String,
        #[arg(long, help = "Module or package relative to the root")]
        submodule: Option<PathBuf>,
    },
    /// List the modules that activate a root's reporter
    ListReports { root: String },
}
