//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod applicant;
pub mod audit;
pub mod automation;
pub mod client;
pub mod email_template;
pub mod firing_record;
pub mod notification;
pub mod portal_user;
pub mod reminder;
pub mod review_queue;
