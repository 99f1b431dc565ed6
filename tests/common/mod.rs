#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub repo: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let repo = tmp.path().join("sample_repo");
        make_fixture_repo(&repo);
        Self { _tmp: tmp, repo }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("graft");
        cmd.env_remove("GRAFT_REPOSITORY")
            .env_remove("GRAFT_TEMPLATE")
            .env_remove("GRAFT_LOG")
            .arg("-r")
            .arg(&self.repo);
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn run_json_failure(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json error envelope")
    }

    /// Error code of a failing `--json` invocation.
    pub fn error_code(&self, args: &[&str]) -> String {
        let v = self.run_json_failure(args);
        assert_eq!(v["ok"], false);
        v["error"]["code"]
            .as_str()
            .expect("error code string")
            .to_string()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.repo.join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read fixture file")
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let p = self.path(rel);
        fs::create_dir_all(p.parent().expect("parent dir")).expect("create parent dir");
        fs::write(p, contents).expect("write fixture file");
    }

    pub fn config(&self) -> Value {
        serde_json::from_str(&self.read("graft.json")).expect("graft.json is json")
    }
}

pub const CLI_SOURCE: &str = "import argparse\nimport sys\n\n\ndef main():\n    parser = argparse.ArgumentParser()\n    parser.parse_args(sys.argv[1:])\n";

pub const SCRIPT_SOURCE: &str = "import sys\n\nprint(sys.argv)\n";

fn make_fixture_repo(repo: &Path) {
    fs::create_dir_all(repo.join("a_package")).expect("create a_package");
    fs::write(repo.join("a_package/cli.py"), CLI_SOURCE).expect("write cli.py");
    fs::write(repo.join("a_script.py"), SCRIPT_SOURCE).expect("write a_script.py");
}
