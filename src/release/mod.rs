//! Release engine for a monorepo of npm packages
//!
//! # Pipeline
//!
//! ```text
//! targets ─► resolve ─► bump ─► rewrite ─► schedule ─► execute
//!            (set)     (versions) (deps)   (order)    (install, publish)
//! ```
//!
//! Everything up to `schedule` is pure and works on an in-memory
//! `ManifestStore`; `execute` is the only stage that runs processes.
//!
//! # Invariants
//!
//! 1. **A dependent is released with its dependencies**
//!    - Every package that depends on a published package is published too
//! 2. **Dependencies reach the registry first**
//!    - Publish order is a topological order of the in-set dependency graph
//!    - Cycles abort the run before any external step
//! 3. **Nothing runs concurrently**
//!    - The first failing install/publish stops the run

pub mod directives;
pub mod plan;
pub mod publish;
pub mod resolve;
pub mod rewrite;
pub mod schedule;
pub mod version;

pub use directives::Directives;
pub use plan::{PlanMode, PublishAction, ReleaseOrchestrator, ReleasePlan};
pub use publish::{CancelToken, CommandRunner, RunReport, execute};
pub use resolve::Targets;
