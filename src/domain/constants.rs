pub const CONFIG_FILENAME: &str = "graft.json";
pub const DEFAULT_REPORTER_FILENAME: &str = "report.py";
pub const PACKAGE_ENTRY_POINT: &str = "__init__.py";
pub const PYTHON_EXTENSION: &str = "py";

pub const PROJECT_NAME_PLACEHOLDER: &str = "{project_name}";
pub const REPORTER_TOKEN_PLACEHOLDER: &str = "{reporter_token}";

/// Name of the object the stub template defines.
pub const REPORTER_OBJECT: &str = "reporter";
pub const SYSTEM_REPORT_CALL: &str = "system_report";
