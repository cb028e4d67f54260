//! Core plumbing for mpublish
//!
//! - **config**: mpublish.toml parsing and validation
//! - **context**: per-invocation run context (cwd, config, packages root)
//! - **error**: error types with contextual help messages and exit codes

pub mod config;
pub mod context;
pub mod error;
