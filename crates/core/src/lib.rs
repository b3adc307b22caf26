//! Domain logic of the automation and reminder engine.
//!
//! Everything here is pure: no database, no network, no clock. Callers pass
//! in subject snapshots and `now` explicitly.

pub mod action;
pub mod channels;
pub mod condition;
pub mod error;
pub mod firing;
pub mod notification;
pub mod pipeline;
pub mod reminder;
pub mod retention;
pub mod send_window;
pub mod subject;
pub mod template_render;
pub mod trigger;
pub mod types;
