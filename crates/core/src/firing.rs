//! Firing keys: the identity of "this rule already acted on this subject".
//!
//! A firing record exists per key; the store guarantees uniqueness, which is
//! the only guard against duplicate actions across ticks, processes, and
//! the inline event path.

use serde::Serialize;

use crate::subject::SubjectRef;
use crate::types::{DbId, Timestamp};

/// Table a rule comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Automation,
    Reminder,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automation => "automation",
            Self::Reminder => "reminder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "automation" => Some(Self::Automation),
            "reminder" => Some(Self::Reminder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RuleRef {
    pub kind: RuleKind,
    pub id: DbId,
}

impl std::fmt::Display for RuleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FiringKey {
    pub rule: RuleRef,
    pub subject: SubjectRef,
    pub episode: String,
}

impl FiringKey {
    /// Build the key for one due occurrence.
    ///
    /// `variant` distinguishes sub-rules of one stored row (reminder
    /// stages), empty otherwise. With `once_per_subject` the occurrence is
    /// left out so the subject can fire at most once; otherwise each
    /// occurrence (status entry, schedule slot) gets its own key.
    pub fn new(
        rule: RuleRef,
        subject: SubjectRef,
        variant: &str,
        once_per_subject: bool,
        occurrence: Timestamp,
    ) -> Self {
        let episode = if once_per_subject {
            variant.to_string()
        } else {
            let at = occurrence.format("%Y-%m-%dT%H:%M:%SZ");
            if variant.is_empty() {
                at.to_string()
            } else {
                format!("{variant}@{at}")
            }
        };
        Self {
            rule,
            subject,
            episode,
        }
    }
}
