//! Per (rule, subject) decision: trigger, then conditions, then send window.
//!
//! Pure: firing history and quiet mode are handled by the dispatcher, which
//! owns the store.

use chrono::FixedOffset;
use recruitflow_core::firing::FiringKey;
use recruitflow_core::subject::SubjectContext;
use recruitflow_core::trigger::{DueContext, NotDue, SubjectEvent, Verdict};
use recruitflow_core::types::Timestamp;

use crate::rule::Rule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    NotDue(NotDue),
    ConditionsFailed,
    /// Due and matching, but outside the send window. Re-checked on later
    /// ticks.
    Deferred { key: FiringKey, until: Timestamp },
    Fire { key: FiringKey },
}

pub fn evaluate(
    rule: &Rule,
    subject: &SubjectContext,
    now: Timestamp,
    offset: FixedOffset,
    event: Option<&SubjectEvent>,
) -> Decision {
    let ctx = DueContext {
        subject,
        now,
        rule_created_at: rule.created_at,
        offset,
        event,
    };
    let occurrence = match rule.trigger.evaluate(&ctx) {
        Verdict::Due { occurrence } => occurrence,
        Verdict::NotDue(reason) => return Decision::NotDue(reason),
    };

    if !rule.conditions.matches(subject, now) {
        return Decision::ConditionsFailed;
    }

    let key = rule.firing_key(subject.subject, occurrence);
    if let Some(window) = rule.window {
        if !window.is_open(now, offset) {
            return Decision::Deferred {
                key,
                until: window.next_opening(now, offset),
            };
        }
    }

    Decision::Fire { key }
}
