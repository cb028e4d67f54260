//! CLI commands for mpublish
//!
//! - **publish**: bump, rewrite, order, install and publish packages

pub mod publish;

pub use publish::{PublishArgs, run_publish};
