//! The automation and reminder engine.
//!
//! - [`rule`] turns stored automations and reminders into typed [`rule::Rule`]s.
//! - [`evaluator`] decides per (rule, subject) whether to fire, defer or skip.
//! - [`dispatcher`] executes actions under a firing-record claim.
//! - [`engine`] drives poll ticks and the inline event path.
//! - [`scheduler`] is the single periodic loop of a deployment.
//! - [`preview`] renders templates against sample data without side effects.
//! - [`store`] is the persistence seam, with the PostgreSQL implementation.

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod evaluator;
pub mod message;
pub mod preview;
pub mod rule;
pub mod scheduler;
pub mod store;

pub use config::EngineConfig;
pub use dispatcher::{DispatchError, Dispatcher, Outcome};
pub use engine::{Engine, EngineError, InboundEvent, RuleOutcome, TickReport};
pub use scheduler::Scheduler;
pub use store::{Claim, FiringClaim, RuleStore, StoreError};
