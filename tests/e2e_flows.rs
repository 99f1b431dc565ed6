mod common;

use common::{TestEnv, CLI_SOURCE, SCRIPT_SOURCE};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn e2e_package_registration_flow() {
    let env = TestEnv::new();

    env.run_json(&["init"]);
    assert_eq!(env.config(), json!({}));

    let token = env.run_json(&["token", "a_package", "T"]);
    assert_eq!(
        token["data"],
        json!({
            "root": "a_package",
            "project_name": "a_package",
            "relative_imports": false,
            "has_token": true,
            "reporter_filepath": null
        })
    );

    let registration = env.run_json(&["add-reporter", "a_package"]);
    let data = &registration["data"];
    assert_eq!(data["stage"], "persisted");
    assert_eq!(data["reporter_filepath"], "report.py");
    assert_eq!(data["reference"], "a_package.report");
    assert_eq!(data["patch"], json!({"status": "inserted", "line": 0}));

    let stub = env.read("a_package/report.py");
    assert!(stub.contains("PROJECT_NAME = \"a_package\""));
    assert!(stub.contains("REPORTER_TOKEN = \"T\""));
    assert_eq!(
        env.read("a_package/__init__.py"),
        "import a_package.report\na_package.report.reporter.system_report()\n"
    );
    assert_eq!(
        env.config(),
        json!({
            "a_package": {
                "python_root": "a_package",
                "project_name": "a_package",
                "relative_imports": false,
                "reporter_token": "T",
                "reporter_filepath": "report.py"
            }
        })
    );

    assert_eq!(env.error_code(&["add-reporter", "a_package"]), "STUB_EXISTS");
    assert_eq!(env.read("a_package/report.py"), stub);
}

#[test]
fn e2e_add_report_is_idempotent_and_listed() {
    let env = TestEnv::new();
    env.run_json(&["init"]);
    env.run_json(&["token", "a_package", "T"]);
    env.run_json(&["add-reporter", "a_package"]);

    let first = env.run_json(&["add-report", "a_package", "--submodule", "cli.py"]);
    assert_eq!(first["data"]["patch"], json!({"status": "inserted", "line": 2}));
    let patched = env.read("a_package/cli.py");
    assert_eq!(
        patched,
        format!(
            "import argparse\nimport sys\nimport a_package.report\na_package.report.reporter.system_report()\n{}",
            &CLI_SOURCE["import argparse\nimport sys\n".len()..]
        )
    );

    let second = env.run_json(&["add-report", "a_package", "--submodule", "cli.py"]);
    assert_eq!(
        second["data"]["patch"],
        json!({"status": "already_applied", "line": 2})
    );
    assert_eq!(env.read("a_package/cli.py"), patched);

    let listed = env.run_json(&["list-reports", "a_package"]);
    assert_eq!(
        listed["data"],
        json!([
            {"file": "a_package/__init__.py", "import_lines": [1], "call_lines": [2]},
            {"file": "a_package/cli.py", "import_lines": [3], "call_lines": [4]}
        ])
    );
}

#[test]
fn e2e_relative_imports_mode() {
    let env = TestEnv::new();
    env.run_json(&["init"]);
    env.run_json(&["register", "a_package", "--relative-imports", "--project-name", "demo"]);
    env.run_json(&["token", "a_package", "T"]);

    let registration = env.run_json(&["add-reporter", "a_package", "--reporter-file", "telemetry.py"]);
    assert_eq!(registration["data"]["reference"], ".telemetry");
    assert!(env.read("a_package/telemetry.py").contains("PROJECT_NAME = \"demo\""));
    assert_eq!(
        env.read("a_package/__init__.py"),
        "from .telemetry import reporter\nreporter.system_report()\n"
    );

    env.run_json(&["add-report", "a_package", "--submodule", "cli.py"]);
    assert!(env
        .read("a_package/cli.py")
        .starts_with("import argparse\nimport sys\nfrom .telemetry import reporter\nreporter.system_report()\n"));
}

#[test]
fn e2e_script_root() {
    let env = TestEnv::new();
    env.run_json(&["init"]);
    env.run_json(&["token", "a_script.py", "T"]);

    let registration = env.run_json(&["add-reporter", "a_script.py"]);
    assert_eq!(registration["data"]["reference"], "report");
    assert!(env.path("report.py").is_file());
    assert_eq!(
        env.read("a_script.py"),
        format!(
            "import sys\nimport report\nreport.reporter.system_report()\n{}",
            &SCRIPT_SOURCE["import sys\n".len()..]
        )
    );
}

#[test]
fn e2e_missing_token_leaves_sources_alone() {
    let env = TestEnv::new();
    env.run_json(&["init"]);
    env.run_json(&["register", "a_package"]);

    assert_eq!(env.error_code(&["add-reporter", "a_package"]), "MISSING_TOKEN");
    assert!(!env.path("a_package/report.py").exists());
    assert!(!env.path("a_package/__init__.py").exists());
    assert_eq!(env.read("a_package/cli.py"), CLI_SOURCE);
}

#[test]
fn e2e_repository_root_is_named_after_the_repository() {
    let env = TestEnv::new();
    env.run_json(&["init"]);
    let absolute = env.repo.to_str().expect("utf8 repo path").to_string();

    let token = env.run_json(&["token", &absolute, "T"]);
    assert_eq!(token["data"]["root"], ".");
    assert_eq!(token["data"]["project_name"], "sample_repo");

    let shown = env.run_json(&["show"]);
    assert_eq!(shown["data"].as_array().map(Vec::len), Some(1));
}
