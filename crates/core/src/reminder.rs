//! Reminders: restricted automations driven by named offsets.
//!
//! A reminder's `config` holds up to three keys, each expanding into one
//! stage rule that fires at most once per subject:
//!
//! | Key           | Stage              | Due                                      |
//! |---------------|--------------------|------------------------------------------|
//! | `days`        | `first`            | N days after entering the current status |
//! | `days_second` | `second`           | N days after entering the current status |
//! | `hours`       | `before_interview` | N hours before the subject's interview   |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::pipeline::Pipeline;
use crate::trigger::{offset_hours, Anchor, ElapsedTimeTrigger, Trigger};

/// One expanded stage of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStage {
    First,
    Second,
    BeforeInterview,
}

impl ReminderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
            Self::BeforeInterview => "before_interview",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReminderConfig {
    #[serde(default)]
    days: Option<i64>,
    #[serde(default)]
    days_second: Option<i64>,
    #[serde(default)]
    hours: Option<i64>,
}

/// Expand a reminder into its stage triggers.
///
/// `target_status` restricts the day-based stages to subjects currently in
/// that status. A config with no recognised key yields no stages.
pub fn expand(
    config: &Value,
    target_status: Option<&str>,
    pipeline: &Pipeline,
) -> Result<Vec<(ReminderStage, Trigger)>, ConfigError> {
    let raw: ReminderConfig = match config {
        Value::Null => ReminderConfig::default(),
        other => serde_json::from_value(other.clone())
            .map_err(|e| ConfigError::malformed("reminder", e))?,
    };

    if let Some(status) = target_status {
        if !pipeline.contains(status) {
            return Err(ConfigError::UnknownStatus(status.to_string()));
        }
    }
    for (field, value) in [
        ("days", raw.days),
        ("days_second", raw.days_second),
        ("hours", raw.hours),
    ] {
        if value.is_some_and(|v| v <= 0) {
            return Err(ConfigError::invalid(field, "must be positive"));
        }
    }
    if let (Some(first), Some(second)) = (raw.days, raw.days_second) {
        if second <= first {
            return Err(ConfigError::invalid(
                "days_second",
                format!("second reminder ({second}) must come after the first ({first})"),
            ));
        }
    }

    let after_status = |field: &'static str, days: i64| -> Result<Trigger, ConfigError> {
        Ok(Trigger::ElapsedTime(ElapsedTimeTrigger {
            offset_hours: offset_hours(field, days, 0)?,
            status: target_status.map(str::to_string),
            anchor: Anchor::StatusEntered,
        }))
    };

    let mut stages = Vec::new();
    if let Some(days) = raw.days {
        stages.push((ReminderStage::First, after_status("days", days)?));
    }
    if let Some(days) = raw.days_second {
        stages.push((ReminderStage::Second, after_status("days_second", days)?));
    }
    if let Some(hours) = raw.hours {
        stages.push((
            ReminderStage::BeforeInterview,
            Trigger::ElapsedTime(ElapsedTimeTrigger {
                offset_hours: offset_hours("hours", 0, hours)?,
                status: None,
                anchor: Anchor::BeforeInterview,
            }),
        ));
    }
    Ok(stages)
}
