mod commands;
mod core;
mod manifest;
mod release;
mod ui;

use clap::{CommandFactory, Parser};
use commands::PublishArgs;
use crate::core::context::RunContext;
use crate::core::error::{PublishError, ResultExt, print_error};
use crate::release::CancelToken;
use log::warn;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Examples:
  mpublish all                  bump and publish every package
  mpublish core                 bump core, its dependents, and publish them in order
  mpublish -m 4 -t beta ui      1.2.3 -> 1.4.0-beta for ui and its dependents
  mpublish -d all               show what would be published, change nothing
  mpublish -w off all           publish every package at its current version";

/// Bump and publish the npm packages of a monorepo in dependency order
#[derive(Parser)]
#[command(name = "mpublish")]
#[command(version, about, long_about = None)]
#[command(after_help = AFTER_HELP)]
#[command(styles = get_styles())]
struct Cli {
  /// Packages to publish, or `all`; dependents are included automatically
  targets: Vec<String>,

  /// Set the major version segment
  #[arg(short = 'j', long, value_name = "N")]
  major: Option<String>,

  /// Set the minor version segment (resets patch to 0)
  #[arg(short, long, value_name = "N")]
  minor: Option<String>,

  /// Prerelease tag for the new versions, e.g. beta
  #[arg(short, long, value_name = "TAG")]
  tag: Option<String>,

  /// Drop existing prerelease tags; `--notag=off` keeps them despite config
  #[arg(
    short,
    long,
    value_name = "BOOL",
    num_args = 0..=1,
    require_equals = true,
    default_missing_value = "true",
    value_parser = parse_switch
  )]
  notag: Option<bool>,

  /// Compute and report versions without writing or publishing
  #[arg(short, long)]
  dry: bool,

  /// Debug logging and per-package details
  #[arg(short, long)]
  verbose: bool,

  /// Write bumped versions (true/false, on/off, set/clear); off publishes current versions
  #[arg(short, long, value_name = "BOOL", value_parser = parse_switch)]
  write: Option<bool>,

  /// Directory holding the packages (default: ./packages)
  #[arg(short, long, value_name = "DIR")]
  path: Option<PathBuf>,

  /// Print the plan and report as JSON
  #[arg(long)]
  json: bool,
}

impl Cli {
  fn into_args(self) -> PublishArgs {
    PublishArgs {
      targets: self.targets,
      major: self.major,
      minor: self.minor,
      tag: self.tag,
      no_tag: self.notag,
      dry_run: self.dry,
      write: self.write,
      verbose: self.verbose,
      json: self.json,
    }
  }
}

/// Boolean switch accepting the spellings shell users reach for
fn parse_switch(value: &str) -> Result<bool, String> {
  match value.to_ascii_lowercase().as_str() {
    "true" | "on" | "set" | "yes" | "1" => Ok(true),
    "false" | "off" | "clear" | "no" | "0" => Ok(false),
    other => Err(format!("'{}' is not a switch value (use true/false, on/off, set/clear)", other)),
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(verbose: bool) {
  let default_filter = if verbose { "debug" } else { "warn" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
    .format_timestamp(None)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  if cli.targets.is_empty() {
    // Nothing to publish: show how to use the tool instead
    if let Err(e) = Cli::command().print_help() {
      eprintln!("Error: {}", e);
      std::process::exit(1);
    }
    println!();
    return;
  }

  let root = match std::env::current_dir().context("Failed to get current directory") {
    Ok(dir) => dir,
    Err(e) => handle_error(e),
  };

  let ctx = match RunContext::build(&root, cli.path.as_deref()) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let cancel = CancelToken::new();
  if let Err(e) = cancel.cancel_on_ctrl_c() {
    warn!("Ctrl-C will abort immediately: {}", e);
  }

  if let Err(e) = commands::run_publish(&ctx, cli.into_args(), &cancel) {
    handle_error(e);
  }
}

fn handle_error(err: PublishError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
