//! Bump and run directives
//!
//! One immutable value carries every option that influences a release run.
//! It is built once (config file + CLI) and passed by reference to each
//! stage of the engine.

use crate::core::error::{ConfigError, PublishResult};
use serde::Serialize;

/// Caller-supplied instructions for a release run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directives {
  /// Replace the minor segment (patch resets to 0) when it differs
  pub minor_override: Option<String>,
  /// Replace the major segment when it differs
  pub major_override: Option<String>,
  /// Prerelease tag to append, replacing any existing one
  pub tag: Option<String>,
  /// Drop existing tags instead of carrying them forward
  pub no_tag: bool,
  /// Compute and report everything, run no install/publish, write nothing
  pub dry_run: bool,
  /// Bump and persist new versions (false = list current versions only)
  pub write_mode: bool,
}

impl Default for Directives {
  fn default() -> Self {
    Self {
      minor_override: None,
      major_override: None,
      tag: None,
      no_tag: false,
      dry_run: false,
      write_mode: true,
    }
  }
}

impl Directives {
  /// Versions are bumped in write mode, and also for a dry run so the
  /// would-be versions can be reviewed.
  pub fn bumps_versions(&self) -> bool {
    self.write_mode || self.dry_run
  }

  /// Manifests are only persisted by a real write-mode run.
  pub fn persists_manifests(&self) -> bool {
    self.write_mode && !self.dry_run
  }

  /// Overrides must be plain numbers and a tag must be non-empty.
  pub fn validate(&self) -> PublishResult<()> {
    for (field, value) in [("--major", &self.major_override), ("--minor", &self.minor_override)] {
      if let Some(value) = value
        && (value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()))
      {
        return Err(
          ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.clone(),
            reason: "expected a non-negative integer".to_string(),
          }
          .into(),
        );
      }
    }

    if let Some(tag) = &self.tag
      && (tag.is_empty() || tag.contains(char::is_whitespace))
    {
      return Err(
        ConfigError::InvalidValue {
          field: "--tag".to_string(),
          value: tag.clone(),
          reason: "tags cannot be empty or contain whitespace".to_string(),
        }
        .into(),
      );
    }

    Ok(())
  }
}
