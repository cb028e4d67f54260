//! Error types for mpublish with contextual messages and exit codes
//!
//! Every fatal error names the offending package(s) and, where there is an
//! obvious next step, carries a help line for the user.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for mpublish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (I/O, install/publish process)
  System = 2,
  /// Validation failure (dependency cycle)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Which external step of a package release failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalStep {
  Install,
  Publish,
}

impl fmt::Display for ExternalStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExternalStep::Install => write!(f, "install"),
      ExternalStep::Publish => write!(f, "publish"),
    }
  }
}

/// Main error type for mpublish
#[derive(Debug)]
pub enum PublishError {
  /// Configuration errors
  Config(ConfigError),

  /// A version string the bump policy cannot advance
  MalformedVersion {
    package: String,
    version: String,
    reason: String,
  },

  /// Circular dependency between packages in the publish set
  Cycle { packages: Vec<String> },

  /// Install or publish failed for one package; the run stops there
  ExternalStep {
    package: String,
    step: ExternalStep,
    stderr: String,
    published: Vec<String>,
  },

  /// The run was cancelled between two packages
  Cancelled { published: Vec<String> },

  /// Nothing to do: no targets were given
  NoTargets,

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl PublishError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    PublishError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    PublishError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      PublishError::Message { message, context, help } => PublishError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      PublishError::Io(err) => PublishError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      PublishError::Config(_) => ExitCode::User,
      PublishError::MalformedVersion { .. } => ExitCode::User,
      PublishError::Cycle { .. } => ExitCode::Validation,
      PublishError::ExternalStep { .. } => ExitCode::System,
      PublishError::Cancelled { .. } => ExitCode::System,
      PublishError::NoTargets => ExitCode::User,
      PublishError::Io(_) => ExitCode::System,
      PublishError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      PublishError::Config(e) => e.help_message(),
      PublishError::MalformedVersion { .. } => {
        Some("Versions must look like MAJOR.MINOR.PATCH with an optional -tag, e.g. 1.4.2-beta".to_string())
      }
      PublishError::Cycle { .. } => {
        Some("Remove one of the dependencies on the cycle; packages cannot be published in a loop.".to_string())
      }
      PublishError::ExternalStep { published, .. } if !published.is_empty() => Some(format!(
        "Already published in this run: {}. Re-run with only the remaining packages as targets.",
        published.join(", ")
      )),
      PublishError::Cancelled { published } if !published.is_empty() => {
        Some(format!("Already published before cancellation: {}", published.join(", ")))
      }
      PublishError::NoTargets => Some("Pass one or more package names, or `all`.".to_string()),
      PublishError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishError::Config(e) => write!(f, "{}", e),
      PublishError::MalformedVersion {
        package,
        version,
        reason,
      } => write!(f, "Malformed version '{}' in package '{}': {}", version, package, reason),
      PublishError::Cycle { packages } => {
        write!(f, "Dependency cycle detected between packages: {}", packages.join(", "))
      }
      PublishError::ExternalStep {
        package, step, stderr, ..
      } => {
        write!(f, "{} step failed for package '{}'", step, package)?;
        if !stderr.trim().is_empty() {
          write!(f, "\n{}", stderr.trim_end())?;
        }
        Ok(())
      }
      PublishError::Cancelled { .. } => write!(f, "Publish run cancelled"),
      PublishError::NoTargets => write!(f, "No target packages given"),
      PublishError::Io(e) => write!(f, "I/O error: {}", e),
      PublishError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for PublishError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      PublishError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for PublishError {
  fn from(err: io::Error) -> Self {
    PublishError::Io(err)
  }
}

impl From<String> for PublishError {
  fn from(msg: String) -> Self {
    PublishError::message(msg)
  }
}

impl From<&str> for PublishError {
  fn from(msg: &str) -> Self {
    PublishError::message(msg)
  }
}

impl From<ConfigError> for PublishError {
  fn from(err: ConfigError) -> Self {
    PublishError::Config(err)
  }
}

impl From<serde_json::Error> for PublishError {
  fn from(err: serde_json::Error) -> Self {
    PublishError::message(format!("JSON error: {}", err))
  }
}

impl From<toml_edit::de::Error> for PublishError {
  fn from(err: toml_edit::de::Error) -> Self {
    PublishError::message(format!("TOML deserialization error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Packages directory does not exist
  PackagesDirNotFound { path: PathBuf },

  /// A field holds a value mpublish cannot use
  InvalidValue { field: String, value: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::PackagesDirNotFound { .. } => {
        Some("Point --path (or `path` in mpublish.toml) at the directory holding your packages.".to_string())
      }
      ConfigError::InvalidValue { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::PackagesDirNotFound { path } => {
        write!(f, "Packages directory not found: {}", path.display())
      }
      ConfigError::InvalidValue { field, value, reason } => {
        write!(f, "Invalid value '{}' for {}: {}", value, field, reason)
      }
    }
  }
}

/// Result type alias for mpublish
pub type PublishResult<T> = Result<T, PublishError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> PublishResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> PublishResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<PublishError>,
{
  fn context(self, ctx: impl Into<String>) -> PublishResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> PublishResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &PublishError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

impl From<anyhow::Error> for PublishError {
  fn from(err: anyhow::Error) -> Self {
    PublishError::message(err.to_string())
  }
}
