//! HTTP surface of the automation engine.
//!
//! Thin handlers over the repositories and the engine: the inbound event
//! interface, rule snapshots and toggles, template previews and the review
//! queue.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
