//! Executing a release plan: install, then publish, one package at a time
//!
//! Packages are processed strictly in plan order and never concurrently: a
//! dependent must not reach the registry before its dependencies. The first
//! failing step stops the run.

use super::plan::{PlanId, PublishAction, ReleasePlan};
use crate::core::error::{ExternalStep, PublishError, PublishResult};
use crate::ui::progress::PublishProgress;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs the external install and publish steps for one package directory.
pub trait PublishRunner {
  fn install(&self, directory: &Path) -> PublishResult<()>;
  fn publish(&self, directory: &Path) -> PublishResult<()>;
}

/// Runs configured shell-free commands (`npm install`, `npm publish` by
/// default) with the package directory as working directory.
#[derive(Debug, Clone)]
pub struct CommandRunner {
  install: Vec<String>,
  publish: Vec<String>,
}

impl CommandRunner {
  /// Build a runner from whitespace-separated command lines. An empty
  /// command line turns that step into a no-op.
  pub fn new(install: &str, publish: &str) -> Self {
    Self {
      install: split_command(install),
      publish: split_command(publish),
    }
  }

  fn run(&self, argv: &[String], step: ExternalStep, directory: &Path) -> PublishResult<()> {
    let Some((program, args)) = argv.split_first() else {
      debug!("no {} command configured; skipping", step);
      return Ok(());
    };

    debug!("{}: running `{}`", directory.display(), argv.join(" "));
    let output = platform_command(program)
      .args(args)
      .current_dir(directory)
      .output()
      .map_err(|e| {
        PublishError::with_help(
          format!("Failed to run `{}`: {}", argv.join(" "), e),
          format!("Check {}_command in mpublish.toml, or leave it empty to skip the step", step),
        )
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      let stderr = if stderr.is_empty() {
        format!("`{}` exited with {}", argv.join(" "), output.status)
      } else {
        stderr
      };
      return Err(PublishError::message(stderr));
    }

    Ok(())
  }
}

impl Default for CommandRunner {
  fn default() -> Self {
    Self::new("npm install", "npm publish")
  }
}

impl PublishRunner for CommandRunner {
  fn install(&self, directory: &Path) -> PublishResult<()> {
    self.run(&self.install, ExternalStep::Install, directory)
  }

  fn publish(&self, directory: &Path) -> PublishResult<()> {
    self.run(&self.publish, ExternalStep::Publish, directory)
  }
}

fn split_command(line: &str) -> Vec<String> {
  line.split_whitespace().map(String::from).collect()
}

/// npm ships as a `.cmd` shim on Windows, which `CreateProcess` will not run directly.
#[cfg(windows)]
fn platform_command(program: &str) -> Command {
  let mut cmd = Command::new("cmd");
  cmd.arg("/C").arg(program);
  cmd
}

#[cfg(not(windows))]
fn platform_command(program: &str) -> Command {
  Command::new(program)
}

/// Cooperative cancellation flag, checked between packages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }

  /// Cancel on the first Ctrl-C; a second Ctrl-C exits at once with 130.
  ///
  /// The listener runs on its own thread with a single-threaded runtime, so
  /// the publish loop itself stays synchronous.
  pub fn cancel_on_ctrl_c(&self) -> PublishResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let token = self.clone();

    std::thread::Builder::new()
      .name("ctrl-c".to_string())
      .spawn(move || {
        runtime.block_on(async move {
          if tokio::signal::ctrl_c().await.is_err() {
            return;
          }
          token.cancel();
          eprintln!("\nInterrupted, stopping before the next package (Ctrl-C again to abort now)...");

          if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
          }
        });
      })?;

    Ok(())
  }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub plan_id: PlanId,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  /// Packages installed and published, in order
  pub published: Vec<String>,
  /// Packages reported only
  pub skipped: Vec<String>,
}

/// Execute `plan` with `runner`.
///
/// # Errors
/// - `ExternalStep` for the first failing install or publish, listing what
///   was already published
/// - `Cancelled` when `cancel` fires before a package starts
pub fn execute(
  plan: &ReleasePlan,
  runner: &dyn PublishRunner,
  cancel: &CancelToken,
  mut progress: Option<&mut PublishProgress>,
) -> PublishResult<RunReport> {
  let started_at = Utc::now();
  let mut published = Vec::new();
  let mut skipped = Vec::new();

  for package in &plan.packages {
    if cancel.is_cancelled() {
      return Err(PublishError::Cancelled { published });
    }

    match &package.action {
      PublishAction::Skip { reason } => {
        debug!("{}: skipped ({})", package.name, reason);
        skipped.push(package.name.clone());
      }
      PublishAction::Publish => {
        let step_error = |step: ExternalStep, published: &[String], err: PublishError| PublishError::ExternalStep {
          package: package.name.clone(),
          step,
          stderr: err.to_string(),
          published: published.to_vec(),
        };

        info!("{}: installing", package.name);
        runner
          .install(&package.directory)
          .map_err(|e| step_error(ExternalStep::Install, &published, e))?;

        info!("{}: publishing {}", package.name, package.version);
        runner
          .publish(&package.directory)
          .map_err(|e| step_error(ExternalStep::Publish, &published, e))?;

        published.push(package.name.clone());
      }
    }

    if let Some(bar) = progress.as_deref_mut() {
      bar.inc();
    }
  }

  Ok(RunReport {
    plan_id: plan.id.clone(),
    started_at,
    finished_at: Utc::now(),
    published,
    skipped,
  })
}
