//! Data retention thresholds for the purge action.

use chrono::Months;

use crate::action::PurgeAction;
use crate::error::ConfigError;
use crate::types::Timestamp;

pub const DEFAULT_ARCHIVE_MONTHS: u32 = 6;
pub const DEFAULT_DELETE_MONTHS: u32 = 12;

/// Client-level retention settings as stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionSettings {
    pub auto_archive_months: Option<i32>,
    pub auto_delete_months: Option<i32>,
}

/// Resolved cutoffs: applicants idle since before a cutoff are archived or
/// deleted. `None` disables that half of the purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPlan {
    pub archive_before: Option<Timestamp>,
    pub delete_before: Option<Timestamp>,
}

/// Resolve a purge action against client settings at `now`.
///
/// Action-level thresholds win over client settings, which win over the
/// defaults. Deleting earlier than archiving is a configuration error.
pub fn plan(
    action: &PurgeAction,
    settings: RetentionSettings,
    now: Timestamp,
) -> Result<RetentionPlan, ConfigError> {
    let archive_months = months(
        "archive_after_months",
        action.archive_after_months,
        settings.auto_archive_months,
        DEFAULT_ARCHIVE_MONTHS,
    )?;
    let delete_months = months(
        "delete_after_months",
        action.delete_after_months,
        settings.auto_delete_months,
        DEFAULT_DELETE_MONTHS,
    )?;

    if action.archive && action.delete && delete_months < archive_months {
        return Err(ConfigError::invalid(
            "delete_after_months",
            format!(
                "delete threshold ({delete_months}) is shorter than archive threshold ({archive_months})"
            ),
        ));
    }

    Ok(RetentionPlan {
        archive_before: action
            .archive
            .then(|| cutoff(now, archive_months))
            .transpose()?,
        delete_before: action
            .delete
            .then(|| cutoff(now, delete_months))
            .transpose()?,
    })
}

fn months(
    field: &'static str,
    explicit: Option<u32>,
    setting: Option<i32>,
    default: u32,
) -> Result<u32, ConfigError> {
    let value = match (explicit, setting) {
        (Some(m), _) => m,
        (None, Some(m)) => {
            u32::try_from(m).map_err(|_| ConfigError::invalid(field, "must not be negative"))?
        }
        (None, None) => default,
    };
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be at least one month"));
    }
    Ok(value)
}

fn cutoff(now: Timestamp, months: u32) -> Result<Timestamp, ConfigError> {
    now.checked_sub_months(Months::new(months))
        .ok_or_else(|| ConfigError::invalid("retention", "threshold out of range"))
}
