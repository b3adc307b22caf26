//! Notification preference rules.
//!
//! Decides, per portal user, where a raised notification goes. The decision
//! is pure; the dispatcher performs the writes and sends.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// How email copies of a notification are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailMode {
    Instant,
    Digest,
    Off,
}

impl EmailMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Digest => "digest",
            Self::Off => "off",
        }
    }

    /// Parse a stored mode. Unknown values are treated as `off`.
    pub fn parse(s: &str) -> Self {
        match s {
            "instant" => Self::Instant,
            "digest" | "daily" | "weekly" => Self::Digest,
            _ => Self::Off,
        }
    }
}

/// The flags of one (client, user, event_type) preference row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceFlags {
    pub portal_enabled: bool,
    pub email_enabled: bool,
    pub email_mode: EmailMode,
}

impl Default for PreferenceFlags {
    /// A user without a preference row gets portal notifications only.
    fn default() -> Self {
        Self {
            portal_enabled: true,
            email_enabled: false,
            email_mode: EmailMode::Off,
        }
    }
}

/// Email half of a delivery decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailDelivery {
    None,
    Instant,
    Digest,
}

/// Where one notification goes for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub portal: bool,
    pub email: EmailDelivery,
}

impl DeliveryPlan {
    pub fn is_empty(&self) -> bool {
        !self.portal && self.email == EmailDelivery::None
    }
}

/// Resolve a user's delivery plan from their preference, if any.
pub fn delivery_plan(pref: Option<PreferenceFlags>) -> DeliveryPlan {
    let pref = pref.unwrap_or_default();
    let email = match (pref.email_enabled, pref.email_mode) {
        (false, _) | (true, EmailMode::Off) => EmailDelivery::None,
        (true, EmailMode::Instant) => EmailDelivery::Instant,
        (true, EmailMode::Digest) => EmailDelivery::Digest,
    };
    DeliveryPlan {
        portal: pref.portal_enabled,
        email,
    }
}

/// Whether a client's quiet mode suppresses notifications at `now`.
pub fn is_quiet(quiet_mode_until: Option<Timestamp>, now: Timestamp) -> bool {
    quiet_mode_until.is_some_and(|until| now < until)
}
