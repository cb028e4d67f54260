//! Progress indicator for the publish loop
//!
//! Uses `linya`; the bar only draws when stderr is a terminal, so piping
//! output or running in CI keeps logs clean.

use linya::{Bar, Progress};
use std::io::IsTerminal;

/// One bar, advanced once per finished package
pub struct PublishProgress {
  progress: Progress,
  bar: Bar,
}

impl PublishProgress {
  /// Create a progress bar over `total` packages
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// A bar only when stderr is interactive and there is work to show
  pub fn for_terminal(total: usize, label: impl Into<String>) -> Option<Self> {
    if total == 0 || !std::io::stderr().is_terminal() {
      return None;
    }
    Some(Self::new(total, label))
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
