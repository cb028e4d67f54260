//! Test helpers for integration tests

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use tempfile::TempDir;

/// A throwaway monorepo with a `packages/` directory
pub struct TestMonorepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestMonorepo {
  /// Create an empty monorepo with `packages/`
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    std::fs::create_dir_all(path.join("packages"))?;
    Ok(Self { _root: root, path })
  }

  /// Add `packages/<name>/package.json`
  pub fn add_package(&self, name: &str, version: &str, deps: &[(&str, &str)]) -> Result<PathBuf> {
    let dir = self.path.join("packages").join(name);
    std::fs::create_dir_all(&dir)?;

    let dependencies: serde_json::Map<String, Value> = deps
      .iter()
      .map(|(dep, constraint)| (dep.to_string(), Value::String(constraint.to_string())))
      .collect();
    let manifest = json!({
      "name": name,
      "version": version,
      "description": format!("{} package", name),
      "dependencies": dependencies,
    });
    std::fs::write(dir.join("package.json"), serde_json::to_string_pretty(&manifest)?)?;

    Ok(dir)
  }

  /// Write `mpublish.toml` at the repo root
  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("mpublish.toml"), content)?;
    Ok(())
  }

  /// Parsed `packages/<name>/package.json`
  pub fn read_manifest(&self, name: &str) -> Result<Value> {
    let path = self.path.join("packages").join(name).join("package.json");
    let content = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
  }

  /// Raw `packages/<name>/package.json`
  pub fn read_manifest_text(&self, name: &str) -> Result<String> {
    Ok(std::fs::read_to_string(
      self.path.join("packages").join(name).join("package.json"),
    )?)
  }
}

/// Run mpublish and require success
pub fn run_mpublish(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_mpublish_unchecked(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "mpublish command failed: mpublish {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run mpublish without checking the exit status
pub fn run_mpublish_unchecked(cwd: &Path, args: &[&str]) -> Result<Output> {
  let mpublish_bin = env!("CARGO_BIN_EXE_mpublish");

  Command::new(mpublish_bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run mpublish")
}

/// Start mpublish in the background with captured output
pub fn spawn_mpublish(cwd: &Path, args: &[&str]) -> Result<Child> {
  Command::new(env!("CARGO_BIN_EXE_mpublish"))
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .context("Failed to start mpublish")
}
