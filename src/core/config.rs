use crate::core::error::{ConfigError, PublishError, PublishResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for mpublish
/// Searched in order: mpublish.toml, .mpublish.toml, .config/mpublish.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MpublishConfig {
  #[serde(default)]
  pub publish: PublishConfig,
}

/// `[publish]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
  /// Packages root, relative to the directory mpublish runs in (default: "packages")
  #[serde(default = "default_path")]
  pub path: PathBuf,

  /// Prerelease tag applied to every bumped version
  #[serde(default)]
  pub tag: Option<String>,

  /// Drop existing tags when bumping
  #[serde(default)]
  pub no_tag: bool,

  /// Write mode (default: true)
  #[serde(default = "default_write")]
  pub write: bool,

  /// Command run in each package directory before publishing (default: "npm install")
  #[serde(default = "default_install_command")]
  pub install_command: String,

  /// Command that publishes a package (default: "npm publish")
  #[serde(default = "default_publish_command")]
  pub publish_command: String,
}

fn default_path() -> PathBuf {
  PathBuf::from("packages")
}

fn default_write() -> bool {
  true
}

fn default_install_command() -> String {
  "npm install".to_string()
}

fn default_publish_command() -> String {
  "npm publish".to_string()
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      path: default_path(),
      tag: None,
      no_tag: false,
      write: default_write(),
      install_command: default_install_command(),
      publish_command: default_publish_command(),
    }
  }
}

impl PublishConfig {
  /// Validate publish configuration
  pub fn validate(&self) -> PublishResult<()> {
    if self.publish_command.trim().is_empty() {
      return Err(PublishError::Config(ConfigError::InvalidValue {
        field: "publish.publish_command".to_string(),
        value: self.publish_command.clone(),
        reason: "a publish command is required".to_string(),
      }));
    }

    if let Some(tag) = &self.tag
      && tag.trim().is_empty()
    {
      return Err(PublishError::Config(ConfigError::InvalidValue {
        field: "publish.tag".to_string(),
        value: tag.clone(),
        reason: "remove the key instead of setting an empty tag".to_string(),
      }));
    }

    Ok(())
  }
}

impl MpublishConfig {
  /// Find config file in search order: mpublish.toml, .mpublish.toml, .config/mpublish.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("mpublish.toml"),
      path.join(".mpublish.toml"),
      path.join(".config").join("mpublish.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from `path`, falling back to defaults when no file exists
  pub fn load(path: &Path) -> PublishResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };
    Self::load_file(&config_path)
  }

  /// Load and validate a specific config file
  pub fn load_file(config_path: &Path) -> PublishResult<Self> {
    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: MpublishConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .publish
      .validate()
      .with_context(|| format!("Invalid [publish] configuration in {}", config_path.display()))?;

    log::debug!("loaded config from {}", config_path.display());
    Ok(config)
  }
}
