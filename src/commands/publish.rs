//! Publish command implementation
//!
//! Loads the packages, plans the run, writes bumped manifests back, then
//! installs and publishes each package in dependency order.

use crate::core::config::PublishConfig;
use crate::core::context::RunContext;
use crate::core::error::{PublishResult, ResultExt};
use crate::manifest::{ManifestStore, package_json};
use crate::release::{
  CancelToken, CommandRunner, Directives, PlanMode, PublishAction, ReleaseOrchestrator, ReleasePlan, RunReport,
  Targets, execute,
};
use crate::ui::progress::PublishProgress;
use log::{info, warn};
use serde::Serialize;

/// Values from the command line; `None` means "not given, use config".
#[derive(Debug, Clone, Default)]
pub struct PublishArgs {
  pub targets: Vec<String>,
  pub major: Option<String>,
  pub minor: Option<String>,
  pub tag: Option<String>,
  pub no_tag: Option<bool>,
  pub dry_run: bool,
  pub write: Option<bool>,
  pub verbose: bool,
  pub json: bool,
}

impl PublishArgs {
  /// Merge command line over config: CLI wins, config fills the gaps.
  pub fn directives(&self, config: &PublishConfig) -> Directives {
    Directives {
      minor_override: self.minor.clone(),
      major_override: self.major.clone(),
      tag: self.tag.clone().or_else(|| config.tag.clone()),
      no_tag: self.no_tag.unwrap_or(config.no_tag),
      dry_run: self.dry_run,
      write_mode: self.write.unwrap_or(config.write),
    }
  }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
  plan: &'a ReleasePlan,
  report: &'a RunReport,
}

/// Run the publish command
pub fn run_publish(ctx: &RunContext, args: PublishArgs, cancel: &CancelToken) -> PublishResult<()> {
  let directives = args.directives(&ctx.config.publish);
  directives.validate()?;
  let targets = Targets::from_args(args.targets.clone());

  let manifests = ctx.load_manifests()?;
  let packages_dir = ctx.packages_dir.strip_prefix(&ctx.root).unwrap_or(&ctx.packages_dir);
  if manifests.is_empty() {
    warn!("no package.json found under {}", packages_dir.display());
  }
  info!("{} package(s) in {}", manifests.len(), packages_dir.display());
  if args.verbose && !args.json {
    print_manifests(&manifests);
  }

  let plan = ReleaseOrchestrator::new(&directives).plan(manifests, &targets)?;
  info!("release plan {} ({} package(s))", plan.id, plan.packages.len());

  if !args.json {
    for warning in &plan.warnings {
      println!("⚠️  {}", warning);
    }
    if args.verbose {
      print_plan(&plan);
    }
  }

  for manifest in &plan.writes {
    package_json::write_manifest(manifest)
      .with_context(|| format!("Failed to write manifest for package '{}'", manifest.name))?;
  }
  if !plan.writes.is_empty() && !args.json {
    println!("✏️  Updated {} package.json file(s)", plan.writes.len());
  }

  let runner = CommandRunner::new(
    &ctx.config.publish.install_command,
    &ctx.config.publish.publish_command,
  );
  let mut progress = if args.json || args.verbose {
    None
  } else {
    PublishProgress::for_terminal(plan.publish_count(), "Publishing")
  };
  let report = execute(&plan, &runner, cancel, progress.as_mut())?;

  if args.json {
    let output = JsonOutput {
      plan: &plan,
      report: &report,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
  } else {
    display_results(&plan, &report);
  }

  Ok(())
}

fn print_manifests(manifests: &ManifestStore) {
  println!("📦 Packages:");
  for manifest in manifests.iter() {
    println!("   {}@{} ({})", manifest.name, manifest.version, manifest.directory.display());
    for (dependency, constraint) in &manifest.dependencies {
      println!("      └─ {} {}", dependency, constraint);
    }
  }
  println!();
}

fn print_plan(plan: &ReleasePlan) {
  println!("📊 Plan {} ({})", plan.id, plan_mode_label(plan.mode));
  println!("   Order: {}", plan.order().join(" → "));
  let excluded = plan.excluded();
  if !excluded.is_empty() {
    println!("   Excluded: {}", excluded.join(", "));
  }
  for rewrite in &plan.rewrites {
    println!(
      "   {}: {} {} → {}",
      rewrite.package, rewrite.dependency, rewrite.from, rewrite.to
    );
  }
  println!();
}

fn plan_mode_label(mode: PlanMode) -> &'static str {
  match mode {
    PlanMode::Bump => "bump",
    PlanMode::List => "current versions",
  }
}

fn display_results(plan: &ReleasePlan, report: &RunReport) {
  if plan.is_empty() {
    println!("ℹ️  Nothing to publish");
    return;
  }

  let skipped_dry = plan
    .packages
    .iter()
    .any(|p| matches!(&p.action, PublishAction::Skip { .. }));

  let title = if skipped_dry {
    format!("Dry run: {} packages would be published", plan.packages.len())
  } else {
    format!("Published {} packages", report.published.len())
  };

  println!();
  println!("{}", title);
  println!("{}", "=".repeat(title.len()));
  for package in &plan.packages {
    println!("{} => {}", package.name, package.version);
  }
  println!();
}
