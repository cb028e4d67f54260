//! Run context - build once in main, pass to the command
//!
//! ```text
//! main.rs:
//!   RunContext::build(cwd, --path) -> &RunContext
//!   |
//!   v
//! commands/publish.rs:
//!   fn run_publish(ctx: &RunContext, ..)
//! ```

use crate::core::config::MpublishConfig;
use crate::core::error::PublishResult;
use crate::manifest::{ManifestStore, package_json};
use std::path::{Path, PathBuf};

/// Working directory, configuration and packages root for one invocation.
#[derive(Debug, Clone)]
pub struct RunContext {
  /// Directory mpublish was started in (absolute path)
  pub root: PathBuf,

  /// Loaded configuration (defaults when no file exists)
  pub config: MpublishConfig,

  /// Directory whose immediate subdirectories are packages
  pub packages_dir: PathBuf,
}

impl RunContext {
  /// Build the context for `root`.
  ///
  /// `path_override` (from `--path`) beats `publish.path` from the config.
  /// Relative paths are resolved against `root`.
  pub fn build(root: &Path, path_override: Option<&Path>) -> PublishResult<Self> {
    let root = root.to_path_buf();
    let config = MpublishConfig::load(&root)?;
    let packages_path = path_override.unwrap_or(&config.publish.path);
    let packages_dir = root.join(packages_path);

    Ok(Self {
      root,
      config,
      packages_dir,
    })
  }

  /// Discover every package under the packages root
  pub fn load_manifests(&self) -> PublishResult<ManifestStore> {
    package_json::discover(&self.packages_dir)
  }
}
