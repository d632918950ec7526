//! Reconciles a declarative goal grid against the megaverse placement API.
//!
//! The pipeline runs in four stages: translate the goal grid into a typed
//! object set, submit each object with retry and backoff, pace calls to stay
//! under the server's rate limit, and fold the per-object outcomes into a
//! batch report. Per-object failures are ordinary values all the way
//! through; only a goal grid that cannot be obtained aborts a run.
//!
//! # Example
//!
//! ```ignore
//! use megaverse::api::{ApiConfig, HttpMegaverseApi, MegaverseApi};
//! use megaverse::goal::translate;
//! use megaverse::run::{Orchestrator, RunConfig};
//!
//! let api = HttpMegaverseApi::new(ApiConfig::new("your-candidate-id"));
//! let target = translate(&api.fetch_goal()?)?;
//! let result = Orchestrator::new(&api, RunConfig::new()).build(&target);
//! result.print_summary();
//! ```

pub mod api;
pub mod goal;
pub mod model;
pub mod pattern;
pub mod report;
pub mod run;
pub mod submit;

pub use api::{ApiConfig, CallOutcome, DryRunApi, HttpMegaverseApi, MegaverseApi};
pub use goal::{GoalError, GridAnalysis, analyze, translate};
pub use model::{GoalGrid, ObjectKind, PlacementObject, Position, TargetObjectSet};
pub use report::BatchResult;
pub use run::{CancelToken, Orchestrator, RunConfig};
pub use submit::{RetryPolicy, SubmissionOutcome, Submitter};
