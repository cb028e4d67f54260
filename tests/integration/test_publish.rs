//! End-to-end tests for the publish command

use crate::helpers::*;
use anyhow::Result;
use serde_json::Value;

/// core <- ui <- app, docs standalone
fn sample_repo() -> Result<TestMonorepo> {
  let repo = TestMonorepo::new()?;
  repo.add_package("core", "1.0.0", &[])?;
  repo.add_package("ui", "1.0.3", &[("core", "^1.0.0")])?;
  repo.add_package("app", "2.1.0-beta", &[("ui", "^1.0.0"), ("core", "^1.0.0"), ("react", "^18.2.0")])?;
  repo.add_package("docs", "0.1.0", &[])?;
  Ok(repo)
}

fn position(haystack: &str, needle: &str) -> usize {
  haystack
    .find(needle)
    .unwrap_or_else(|| panic!("'{}' not found in:\n{}", needle, haystack))
}

#[test]
fn test_no_targets_prints_usage() -> Result<()> {
  let repo = sample_repo()?;
  let output = run_mpublish(&repo.path, &[])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Usage"), "expected usage text:\n{}", stdout);
  assert_eq!(repo.read_manifest("core")?["version"], "1.0.0");
  Ok(())
}

#[test]
fn test_dry_run_reports_without_writing() -> Result<()> {
  let repo = sample_repo()?;
  let before = repo.read_manifest_text("app")?;

  let output = run_mpublish(&repo.path, &["-d", "core"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Dry run: 3 packages would be published"), "{}", stdout);
  assert!(stdout.contains("core => 1.0.1"));
  assert!(stdout.contains("ui => 1.0.4"));
  assert!(stdout.contains("app => 2.1.1-beta"));
  assert!(!stdout.contains("docs =>"));
  assert!(position(&stdout, "core =>") < position(&stdout, "ui =>"));
  assert!(position(&stdout, "ui =>") < position(&stdout, "app =>"));

  assert_eq!(repo.read_manifest_text("app")?, before);
  Ok(())
}

#[test]
fn test_version_directives() -> Result<()> {
  let repo = sample_repo()?;
  let output = run_mpublish(&repo.path, &["--dry", "--minor", "5", "--tag", "rc", "ui"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("ui => 1.5.0-rc"), "{}", stdout);
  assert!(stdout.contains("app => 2.5.0-rc"), "{}", stdout);
  Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
  let repo = sample_repo()?;
  let output = run_mpublish(&repo.path, &["-d", "--json", "ui"])?;
  let json: Value = serde_json::from_slice(&output.stdout)?;

  let names: Vec<&str> = json["plan"]["packages"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, vec!["ui", "app"]);
  assert_eq!(json["plan"]["versions"]["ui"], "1.0.4");
  assert_eq!(json["plan"]["mode"], "bump");
  assert_eq!(json["report"]["skipped"].as_array().unwrap().len(), 2);
  assert_eq!(json["report"]["plan_id"].as_str().unwrap().len(), 64);
  Ok(())
}

#[test]
fn test_cycle_exits_with_validation_code() -> Result<()> {
  let repo = TestMonorepo::new()?;
  repo.add_package("a", "1.0.0", &[("b", "1.0.0")])?;
  repo.add_package("b", "1.0.0", &[("a", "1.0.0")])?;

  let output = run_mpublish_unchecked(&repo.path, &["-d", "a"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr.contains("Dependency cycle detected between packages: a, b"), "{}", stderr);
  Ok(())
}

#[test]
fn test_missing_packages_dir_is_a_user_error() -> Result<()> {
  let repo = TestMonorepo::new()?;
  let output = run_mpublish_unchecked(&repo.path, &["-p", "nowhere", "all"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Packages directory not found"));
  Ok(())
}

#[test]
fn test_invalid_write_switch_is_rejected() -> Result<()> {
  let repo = sample_repo()?;
  let output = run_mpublish_unchecked(&repo.path, &["-w", "maybe", "all"])?;
  assert!(!output.status.success());
  Ok(())
}

#[test]
fn test_malformed_version_is_reported_and_skipped() -> Result<()> {
  let repo = TestMonorepo::new()?;
  repo.add_package("core", "1.0", &[])?;
  repo.add_package("app", "1.0.0", &[("core", "^1.0.0")])?;

  let output = run_mpublish(&repo.path, &["-d", "core"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("malformed version '1.0'"), "{}", stdout);
  assert!(stdout.contains("app => 1.0.1"));
  assert!(!stdout.contains("core =>"));
  Ok(())
}

#[cfg(unix)]
mod with_commands {
  use super::*;

  /// Commands that append the package directory to `order.log`
  const RECORDING_CONFIG: &str = r#"
[publish]
install_command = "true"
publish_command = "sh -c pwd>>../../order.log"
"#;

  #[test]
  fn test_write_mode_bumps_rewrites_and_publishes_in_order() -> Result<()> {
    let repo = sample_repo()?;
    repo.write_config(RECORDING_CONFIG)?;

    let output = run_mpublish(&repo.path, &["core"])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Published 3 packages"), "{}", stdout);

    let app = repo.read_manifest("app")?;
    assert_eq!(app["version"], "2.1.1-beta");
    assert_eq!(app["dependencies"]["core"], "1.0.1");
    assert_eq!(app["dependencies"]["ui"], "1.0.4");
    assert_eq!(app["dependencies"]["react"], "^18.2.0");
    assert_eq!(app["description"], "app package");
    assert_eq!(repo.read_manifest("docs")?["version"], "0.1.0");

    let log = std::fs::read_to_string(repo.path.join("order.log"))?;
    let order: Vec<&str> = log
      .lines()
      .filter_map(|line| std::path::Path::new(line).file_name()?.to_str())
      .collect();
    assert_eq!(order, vec!["core", "ui", "app"]);
    Ok(())
  }

  #[test]
  fn test_manifest_key_order_is_preserved() -> Result<()> {
    let repo = sample_repo()?;
    repo.write_config(RECORDING_CONFIG)?;
    run_mpublish(&repo.path, &["docs"])?;

    let text = repo.read_manifest_text("docs")?;
    assert!(position(&text, "\"name\"") < position(&text, "\"version\""));
    assert!(position(&text, "\"version\"") < position(&text, "\"description\""));
    assert!(text.contains("\"version\": \"0.1.1\""));
    Ok(())
  }

  #[test]
  fn test_write_off_publishes_current_versions() -> Result<()> {
    let repo = sample_repo()?;
    repo.write_config(RECORDING_CONFIG)?;

    let output = run_mpublish(&repo.path, &["-w", "off", "core"])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("Published 4 packages"), "{}", stdout);
    assert!(stdout.contains("core => 1.0.0"));
    assert_eq!(repo.read_manifest("core")?["version"], "1.0.0");
    Ok(())
  }

  #[test]
  fn test_failed_publish_stops_the_run() -> Result<()> {
    let repo = sample_repo()?;
    repo.write_config(
      r#"
[publish]
install_command = "true"
publish_command = "false"
"#,
    )?;

    let output = run_mpublish_unchecked(&repo.path, &["core"])?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("publish step failed for package 'core'"), "{}", stderr);
    Ok(())
  }

  #[test]
  fn test_empty_install_command_skips_install() -> Result<()> {
    let repo = sample_repo()?;
    repo.write_config(
      r#"
[publish]
install_command = ""
publish_command = "true"
"#,
    )?;

    let output = run_mpublish(&repo.path, &["docs"])?;
    assert!(String::from_utf8_lossy(&output.stdout).contains("Published 1 packages"));
    Ok(())
  }

  #[test]
  fn test_notag_off_overrides_config() -> Result<()> {
    let repo = sample_repo()?;
    repo.write_config("[publish]\nno_tag = true\n")?;

    let output = run_mpublish(&repo.path, &["-d", "app"])?;
    assert!(String::from_utf8_lossy(&output.stdout).contains("app => 2.1.1\n"));

    let output = run_mpublish(&repo.path, &["-d", "--notag=off", "app"])?;
    assert!(String::from_utf8_lossy(&output.stdout).contains("app => 2.1.1-beta"));
    Ok(())
  }

  #[test]
  fn test_interrupt_stops_before_next_package() -> Result<()> {
    let repo = sample_repo()?;
    repo.write_config(
      r#"
[publish]
install_command = "true"
publish_command = "sleep 2"
"#,
    )?;

    let child = spawn_mpublish(&repo.path, &["core"])?;
    std::thread::sleep(std::time::Duration::from_millis(800));
    let status = std::process::Command::new("kill")
      .args(["-INT", &child.id().to_string()])
      .status()?;
    assert!(status.success());

    let output = child.wait_with_output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(2), "{}", stderr);
    assert!(stderr.contains("Publish run cancelled"), "{}", stderr);
    assert!(stderr.contains("Already published before cancellation: core"), "{}", stderr);
    Ok(())
  }
}
