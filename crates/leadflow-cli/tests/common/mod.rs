#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;
use url::Url;

pub const TEST_COLLECTION: &str = "leads";

/// An isolated HOME plus a file store, both inside one temp dir.
pub struct TestEnv {
    _dir: TempDir,
    pub home: PathBuf,
    pub store_path: PathBuf,
    pub store_url: String,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let store_path = dir.path().join("store");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::create_dir_all(&store_path).unwrap();
        let store_url = file_store_url(&store_path);
        Self {
            _dir: dir,
            home,
            store_path,
            store_url,
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_leadflow"));
        cmd.args(args);
        cmd.env("HOME", &self.home);
        cmd.env("XDG_DATA_HOME", self.home.join("data"));
        cmd.env_remove("LEADFLOW_STORE");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run the CLI with arguments.
    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .stdin(Stdio::null())
            .output()
            .expect("Failed to execute CLI")
    }

    /// Run the CLI, feeding `input` on stdin.
    pub fn run_with_input(&self, args: &[&str], input: &str) -> Output {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn CLI");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        child.wait_with_output().expect("Failed to wait for CLI")
    }

    /// Run the CLI and expect success.
    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Save a profile pointing at this env's store.
    pub fn login(&self, actor: &str, role: &str) {
        self.run_success(&[
            "profile",
            "set",
            "--store",
            &self.store_url,
            "--actor",
            actor,
            "--role",
            role,
        ]);
    }

    /// Create a record and return its id.
    pub fn create(&self, fields: &[&str], extra: &[&str]) -> String {
        let mut args = vec!["create", TEST_COLLECTION];
        for field in fields {
            args.push("--field");
            args.push(field);
        }
        args.extend_from_slice(extra);
        let stdout = self.run_success(&args);
        stdout
            .lines()
            .next()
            .expect("create prints the new id")
            .trim()
            .to_string()
    }

    /// List records as parsed JSON lines.
    pub fn list(&self, extra: &[&str]) -> Vec<serde_json::Value> {
        let mut args = vec!["list", TEST_COLLECTION];
        args.extend_from_slice(extra);
        self.run_success(&args)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("list prints JSON lines"))
            .collect()
    }
}

pub fn file_store_url(path: &Path) -> String {
    Url::from_directory_path(path)
        .expect("Failed to convert path to file URL")
        .to_string()
}
