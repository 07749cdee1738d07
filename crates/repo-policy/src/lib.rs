//! Desired-state policy engine for repositories
//!
//! A policy is an ordered list of named goals. Applying it to a target
//! repository reconciles each goal's declared state against the live state of
//! an external service, using handlers looked up by goal name.
//!
//! # Architecture
//!
//! ```text
//!   Coordinator ── one task per target
//!        |
//!     Session ── Policy (shared) + Facts (per target)
//!        |
//!   GoalRegistry ── goal name -> HandlerFactory -> GoalHandler
//! ```
//!
//! Handler implementations live in other crates and are registered through
//! [`HandlerBundle`]s when the registry is built.

pub mod coordinator;
pub mod document;
pub mod error;
pub mod facts;
pub mod handler;
pub mod policy;
pub mod registry;
pub mod repository;
pub mod session;

pub use coordinator::{Coordinator, RunSummary, TargetOutcome};
pub use document::{DocumentFormat, load_document};
pub use error::{BoxError, Error, Result};
pub use facts::{FactMap, FactValue, Facts, FactsBuilder, keys};
pub use handler::{GoalHandler, GoalOutcome, HandlerBundle, HandlerFactory, SharedHandler};
pub use policy::{DesiredState, GoalConfig, Policy, PolicyGoal, load_policy};
pub use registry::{GoalRegistry, ResolvedHandlers};
pub use repository::{Repository, load_repositories};
pub use session::{GoalChange, Session, SessionReport, SessionState};
