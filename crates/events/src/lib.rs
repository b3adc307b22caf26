//! Outbound delivery for the automation engine.
//!
//! - [`delivery`]: the [`MessageTransport`] seam with an SMTP implementation
//!   and a log-only fallback, plus bounded retry.
//! - [`DigestScheduler`]: periodic flush of batched notification emails.

pub mod delivery;
pub mod digest;

pub use delivery::email::{EmailConfig, SmtpTransport};
pub use delivery::log::LogTransport;
pub use delivery::{send_with_retry, transport_from_env, MessageTransport, OutboundMessage, RetryPolicy, TransportError};
pub use digest::DigestScheduler;
