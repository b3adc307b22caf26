//! Trigger declarations and due-ness evaluation.
//!
//! Stored rules carry a `trigger_type` string plus a loosely-typed JSON
//! `trigger_config`. [`Trigger::parse`] turns the pair into a tagged union
//! with one strongly-typed shape per trigger kind, validated against the
//! client's pipeline. [`Trigger::evaluate`] then answers "is this rule due
//! for this subject right now", which is pure logic: the firing history is
//! consulted separately through the firing key.

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::pipeline::Pipeline;
use crate::subject::{SubjectContext, SubjectKind};
use crate::types::Timestamp;

/// Hour of day a schedule fires at when its config names no time.
pub const DEFAULT_SCHEDULE_HOUR: u32 = 8;

/// Longest offset an elapsed-time trigger accepts: ten years.
pub const MAX_OFFSET_HOURS: i64 = 10 * 366 * 24;

// ---------------------------------------------------------------------------
// Trigger kinds
// ---------------------------------------------------------------------------

/// A parsed trigger declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    StatusChange(StatusChangeTrigger),
    NewRecord,
    ElapsedTime(ElapsedTimeTrigger),
    RecurringSchedule(ScheduleTrigger),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChangeTrigger {
    pub to_status: String,
    pub from_status: Option<String>,
}

/// The instant an elapsed-time trigger counts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Entry into the current status (creation when unknown).
    StatusEntered,
    Created,
    /// Counts backwards from the subject's interview.
    BeforeInterview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElapsedTimeTrigger {
    /// Offset from the anchor, in whole hours.
    pub offset_hours: i64,
    /// Restrict to subjects currently in this status.
    pub status: Option<String>,
    pub anchor: Anchor,
}

impl ElapsedTimeTrigger {
    /// `None` when the offset does not fit a [`Duration`].
    pub fn offset(&self) -> Option<Duration> {
        Duration::try_hours(self.offset_hours)
    }
}

/// `days * 24 + hours`, rejected when negative or above
/// [`MAX_OFFSET_HOURS`].
pub fn offset_hours(field: &'static str, days: i64, hours: i64) -> Result<i64, ConfigError> {
    let total = days
        .checked_mul(24)
        .and_then(|h| h.checked_add(hours))
        .ok_or_else(|| ConfigError::invalid(field, "offset is out of range"))?;
    if !(0..=MAX_OFFSET_HOURS).contains(&total) {
        return Err(ConfigError::invalid(
            field,
            format!("offset must be between 0 and {MAX_OFFSET_HOURS} hours"),
        ));
    }
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleTrigger {
    /// `None` means every day.
    pub day: Option<Weekday>,
    pub time: NaiveTime,
}

// ---------------------------------------------------------------------------
// Raw config shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct StatusChangeConfig {
    #[serde(alias = "status")]
    to_status: String,
    #[serde(default)]
    from_status: Option<String>,
}

#[derive(Deserialize)]
struct ElapsedTimeConfig {
    #[serde(default, alias = "days_after_status")]
    days: Option<i64>,
    #[serde(default)]
    hours: Option<i64>,
    #[serde(default)]
    days_before_event: Option<i64>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    anchor: Option<Anchor>,
}

#[derive(Deserialize)]
struct ScheduleConfig {
    #[serde(default)]
    day: Option<String>,
    #[serde(default)]
    time: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl Trigger {
    /// Parse and validate a stored trigger.
    ///
    /// Accepts the legacy portal names (`new_application`, `timer`,
    /// `schedule`) as aliases.
    pub fn parse(
        trigger_type: &str,
        config: &Value,
        pipeline: &Pipeline,
    ) -> Result<Self, ConfigError> {
        let config = match config {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };

        match trigger_type {
            "status_change" => {
                let raw: StatusChangeConfig = serde_json::from_value(config)
                    .map_err(|e| ConfigError::malformed("trigger", e))?;
                require_status(pipeline, &raw.to_status)?;
                if let Some(from) = &raw.from_status {
                    require_status(pipeline, from)?;
                }
                Ok(Self::StatusChange(StatusChangeTrigger {
                    to_status: raw.to_status,
                    from_status: raw.from_status,
                }))
            }
            "new_record" | "new_application" => Ok(Self::NewRecord),
            "elapsed_time" | "timer" => {
                let raw: ElapsedTimeConfig = serde_json::from_value(config)
                    .map_err(|e| ConfigError::malformed("trigger", e))?;
                parse_elapsed(raw, pipeline).map(Self::ElapsedTime)
            }
            "recurring_schedule" | "schedule" => {
                let raw: ScheduleConfig = serde_json::from_value(config)
                    .map_err(|e| ConfigError::malformed("trigger", e))?;
                parse_schedule(raw).map(Self::RecurringSchedule)
            }
            other => Err(ConfigError::UnknownTrigger(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::StatusChange(_) => "status_change",
            Self::NewRecord => "new_record",
            Self::ElapsedTime(_) => "elapsed_time",
            Self::RecurringSchedule(_) => "recurring_schedule",
        }
    }

    /// The kind of subject the trigger is evaluated against.
    pub fn scope(&self) -> SubjectKind {
        match self {
            Self::RecurringSchedule(_) => SubjectKind::Client,
            _ => SubjectKind::Applicant,
        }
    }

    /// Whether the inline event path evaluates this trigger.
    pub fn is_event_driven(&self) -> bool {
        matches!(self, Self::StatusChange(_) | Self::NewRecord)
    }
}

fn require_status(pipeline: &Pipeline, status: &str) -> Result<(), ConfigError> {
    if pipeline.contains(status) {
        Ok(())
    } else {
        Err(ConfigError::UnknownStatus(status.to_string()))
    }
}

fn parse_elapsed(
    raw: ElapsedTimeConfig,
    pipeline: &Pipeline,
) -> Result<ElapsedTimeTrigger, ConfigError> {
    for (field, value) in [
        ("days", raw.days),
        ("hours", raw.hours),
        ("days_before_event", raw.days_before_event),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(ConfigError::invalid(field, "must not be negative"));
        }
    }
    if let Some(status) = &raw.status {
        require_status(pipeline, status)?;
    }

    let (anchor, offset_hours) = match raw.days_before_event {
        Some(days) => (
            Anchor::BeforeInterview,
            offset_hours("days_before_event", days, raw.hours.unwrap_or(0))?,
        ),
        None => {
            if raw.days.is_none() && raw.hours.is_none() {
                return Err(ConfigError::malformed(
                    "trigger",
                    "elapsed_time requires 'days' or 'hours'",
                ));
            }
            (
                raw.anchor.unwrap_or(Anchor::StatusEntered),
                offset_hours("days", raw.days.unwrap_or(0), raw.hours.unwrap_or(0))?,
            )
        }
    };

    Ok(ElapsedTimeTrigger {
        offset_hours,
        status: raw.status,
        anchor,
    })
}

fn parse_schedule(raw: ScheduleConfig) -> Result<ScheduleTrigger, ConfigError> {
    let day = match raw.day.as_deref().map(str::trim) {
        None | Some("") | Some("daily") | Some("täglich") => None,
        Some(name) => Some(
            parse_weekday(name)
                .ok_or_else(|| ConfigError::invalid("day", format!("unknown weekday '{name}'")))?,
        ),
    };
    let time = match raw.time.as_deref() {
        None => NaiveTime::from_hms_opt(DEFAULT_SCHEDULE_HOUR, 0, 0).unwrap_or(NaiveTime::MIN),
        Some(text) => parse_time_of_day(text)
            .ok_or_else(|| ConfigError::invalid("time", format!("expected HH:MM, got '{text}'")))?,
    };
    Ok(ScheduleTrigger { day, time })
}

/// Weekday from an English or German name or abbreviation.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    let day = match name.to_lowercase().as_str() {
        "monday" | "mon" | "montag" | "mo" => Weekday::Mon,
        "tuesday" | "tue" | "dienstag" | "di" => Weekday::Tue,
        "wednesday" | "wed" | "mittwoch" | "mi" => Weekday::Wed,
        "thursday" | "thu" | "donnerstag" | "do" => Weekday::Thu,
        "friday" | "fri" | "freitag" | "fr" => Weekday::Fri,
        "saturday" | "sat" | "samstag" | "sa" => Weekday::Sat,
        "sunday" | "sun" | "sonntag" | "so" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// `HH:MM` (seconds tolerated).
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// An inbound record-store event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_kind", rename_all = "snake_case")]
pub enum SubjectEvent {
    StatusChanged {
        #[serde(default)]
        from_status: Option<String>,
        to_status: String,
    },
    #[serde(alias = "created")]
    RecordCreated,
}

/// Everything [`Trigger::evaluate`] needs besides the trigger itself.
#[derive(Debug, Clone, Copy)]
pub struct DueContext<'a> {
    pub subject: &'a SubjectContext,
    pub now: Timestamp,
    /// Creation instant of the rule; earlier occurrences never count.
    pub rule_created_at: Timestamp,
    /// Offset wall-clock schedules are interpreted in.
    pub offset: FixedOffset,
    /// The event being processed inline, `None` on a poll tick.
    pub event: Option<&'a SubjectEvent>,
}

/// Outcome of a due-ness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The rule is due; `occurrence` identifies which trigger occurrence.
    Due { occurrence: Timestamp },
    NotDue(NotDue),
}

impl Verdict {
    pub fn is_due(&self) -> bool {
        matches!(self, Self::Due { .. })
    }
}

/// Why a rule is not due.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotDue {
    #[error("trigger is not evaluated for this event")]
    EventMismatch,
    #[error("subject is not in the trigger status")]
    StatusMismatch,
    #[error("previous status does not match")]
    FromStatusMismatch,
    #[error("occurrence predates the rule")]
    BeforeRuleCreated,
    #[error("not due before {0}")]
    TooEarly(Timestamp),
    #[error("subject has no interview")]
    NoInterview,
    #[error("interview has already passed")]
    InterviewPassed,
    #[error("wrong subject kind for trigger")]
    WrongScope,
    #[error("due instant is out of range")]
    OutOfRange,
}

impl Trigger {
    /// Decide whether the rule is due for `ctx.subject` at `ctx.now`.
    pub fn evaluate(&self, ctx: &DueContext<'_>) -> Verdict {
        if ctx.subject.subject.kind != self.scope() {
            return Verdict::NotDue(NotDue::WrongScope);
        }
        match (self, ctx.event) {
            (Self::StatusChange(t), Some(event)) => t.on_event(ctx, event),
            (Self::StatusChange(t), None) => t.on_tick(ctx),
            (Self::NewRecord, Some(SubjectEvent::RecordCreated)) => Verdict::Due {
                occurrence: ctx.subject.created_at,
            },
            (Self::NewRecord, Some(_)) => Verdict::NotDue(NotDue::EventMismatch),
            (Self::NewRecord, None) => {
                if ctx.subject.created_at < ctx.rule_created_at {
                    Verdict::NotDue(NotDue::BeforeRuleCreated)
                } else {
                    Verdict::Due {
                        occurrence: ctx.subject.created_at,
                    }
                }
            }
            (Self::ElapsedTime(_) | Self::RecurringSchedule(_), Some(_)) => {
                Verdict::NotDue(NotDue::EventMismatch)
            }
            (Self::ElapsedTime(t), None) => t.on_tick(ctx),
            (Self::RecurringSchedule(t), None) => t.on_tick(ctx),
        }
    }
}

impl StatusChangeTrigger {
    fn on_event(&self, ctx: &DueContext<'_>, event: &SubjectEvent) -> Verdict {
        let SubjectEvent::StatusChanged {
            from_status,
            to_status,
        } = event
        else {
            return Verdict::NotDue(NotDue::EventMismatch);
        };
        if *to_status != self.to_status {
            return Verdict::NotDue(NotDue::StatusMismatch);
        }
        if self.from_status.is_some() && *from_status != self.from_status {
            return Verdict::NotDue(NotDue::FromStatusMismatch);
        }
        Verdict::Due {
            occurrence: ctx.subject.reference_time(),
        }
    }

    /// Poll-path catch-up: the subject still sits in the target status it
    /// entered after the rule existed.
    fn on_tick(&self, ctx: &DueContext<'_>) -> Verdict {
        let subject = ctx.subject;
        if subject.status.as_deref() != Some(self.to_status.as_str()) {
            return Verdict::NotDue(NotDue::StatusMismatch);
        }
        if self.from_status.is_some() && subject.previous_status != self.from_status {
            return Verdict::NotDue(NotDue::FromStatusMismatch);
        }
        let entered = subject.reference_time();
        if entered < ctx.rule_created_at {
            return Verdict::NotDue(NotDue::BeforeRuleCreated);
        }
        Verdict::Due { occurrence: entered }
    }
}

impl ElapsedTimeTrigger {
    fn on_tick(&self, ctx: &DueContext<'_>) -> Verdict {
        let subject = ctx.subject;
        if let Some(status) = &self.status {
            if subject.status.as_deref() != Some(status.as_str()) {
                return Verdict::NotDue(NotDue::StatusMismatch);
            }
        }

        match self.anchor {
            Anchor::StatusEntered | Anchor::Created => {
                let reference = match self.anchor {
                    Anchor::Created => subject.created_at,
                    _ => subject.reference_time(),
                };
                let Some(due_at) = self.offset().and_then(|o| reference.checked_add_signed(o))
                else {
                    return Verdict::NotDue(NotDue::OutOfRange);
                };
                if ctx.now < due_at {
                    return Verdict::NotDue(NotDue::TooEarly(due_at));
                }
                Verdict::Due {
                    occurrence: reference,
                }
            }
            Anchor::BeforeInterview => {
                let Some(interview_at) = subject.interview_at else {
                    return Verdict::NotDue(NotDue::NoInterview);
                };
                if ctx.now >= interview_at {
                    return Verdict::NotDue(NotDue::InterviewPassed);
                }
                let Some(due_at) = self
                    .offset()
                    .and_then(|o| interview_at.checked_sub_signed(o))
                else {
                    return Verdict::NotDue(NotDue::OutOfRange);
                };
                if ctx.now < due_at {
                    return Verdict::NotDue(NotDue::TooEarly(due_at));
                }
                Verdict::Due {
                    occurrence: interview_at,
                }
            }
        }
    }
}

impl ScheduleTrigger {
    fn on_tick(&self, ctx: &DueContext<'_>) -> Verdict {
        let Some(occurrence) = self.latest_occurrence(ctx.now, ctx.offset) else {
            return Verdict::NotDue(NotDue::TooEarly(ctx.now));
        };
        if occurrence < ctx.rule_created_at {
            return Verdict::NotDue(NotDue::TooEarly(self.next_occurrence(ctx.now, ctx.offset)));
        }
        Verdict::Due { occurrence }
    }

    /// Most recent scheduled instant at or before `now`.
    ///
    /// An occurrence remains the latest one until the next occurrence
    /// starts, so a deferred firing is still due on later ticks.
    pub fn latest_occurrence(&self, now: Timestamp, offset: FixedOffset) -> Option<Timestamp> {
        let today = now.with_timezone(&offset).date_naive();
        (0..=7)
            .filter_map(|back| today.checked_sub_signed(Duration::days(back)))
            .filter(|date| self.matches_day(*date))
            .filter_map(|date| local_instant(date, self.time, offset))
            .find(|at| *at <= now)
    }

    /// First scheduled instant strictly after `now`.
    pub fn next_occurrence(&self, now: Timestamp, offset: FixedOffset) -> Timestamp {
        let today = now.with_timezone(&offset).date_naive();
        (0..=8)
            .filter_map(|ahead| today.checked_add_signed(Duration::days(ahead)))
            .filter(|date| self.matches_day(*date))
            .filter_map(|date| local_instant(date, self.time, offset))
            .find(|at| *at > now)
            .unwrap_or(now + Duration::days(7))
    }

    fn matches_day(&self, date: NaiveDate) -> bool {
        self.day.map_or(true, |day| day == date.weekday())
    }
}

fn local_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> Option<Timestamp> {
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|at| at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::pipeline::{STATUS_NEW, STATUS_QUALIFIED};

    fn now() -> Timestamp {
        // A Friday.
        Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn parse(kind: &str, config: Value) -> Result<Trigger, ConfigError> {
        Trigger::parse(kind, &config, &Pipeline::default())
    }

    fn tick<'a>(subject: &'a SubjectContext, at: Timestamp) -> DueContext<'a> {
        DueContext {
            subject,
            now: at,
            rule_created_at: now() - Duration::days(365),
            offset: utc(),
            event: None,
        }
    }

    fn qualified(entered_days_ago: i64) -> SubjectContext {
        SubjectContext::applicant(1, 9, now() - Duration::days(40))
            .with_status(STATUS_QUALIFIED, now() - Duration::days(entered_days_ago))
    }

    #[test]
    fn parses_aliases() {
        assert_eq!(parse("new_application", json!({})).unwrap(), Trigger::NewRecord);
        assert_matches!(
            parse("timer", json!({"days_after_status": 3})),
            Ok(Trigger::ElapsedTime(ElapsedTimeTrigger { offset_hours: 72, .. }))
        );
        assert_matches!(
            parse("schedule", json!({"day": "Montag", "time": "09:30"})),
            Ok(Trigger::RecurringSchedule(ScheduleTrigger { day: Some(Weekday::Mon), .. }))
        );
    }

    #[test]
    fn rejects_invalid_configs() {
        assert_matches!(parse("webhook", json!({})), Err(ConfigError::UnknownTrigger(_)));
        assert_matches!(
            parse("status_change", json!({"to_status": "Archiviert"})),
            Err(ConfigError::UnknownStatus(s)) if s == "Archiviert"
        );
        assert_matches!(
            parse("status_change", json!({})),
            Err(ConfigError::Malformed { section: "trigger", .. })
        );
        assert_matches!(
            parse("elapsed_time", json!({"days": -2})),
            Err(ConfigError::InvalidValue { field: "days", .. })
        );
        assert_matches!(
            parse("elapsed_time", json!({})),
            Err(ConfigError::Malformed { .. })
        );
        assert_matches!(
            parse("recurring_schedule", json!({"time": "25:00"})),
            Err(ConfigError::InvalidValue { field: "time", .. })
        );
        assert_matches!(
            parse("recurring_schedule", json!({"day": "someday"})),
            Err(ConfigError::InvalidValue { field: "day", .. })
        );
    }

    #[test]
    fn elapsed_time_boundary() {
        let trigger = parse("elapsed_time", json!({"days": 14, "status": STATUS_QUALIFIED})).unwrap();
        let subject = qualified(0);
        let entered = subject.reference_time();

        let before = tick(&subject, entered + Duration::days(14) - Duration::seconds(1));
        assert_matches!(trigger.evaluate(&before), Verdict::NotDue(NotDue::TooEarly(_)));

        let at = tick(&subject, entered + Duration::days(14));
        assert_eq!(trigger.evaluate(&at), Verdict::Due { occurrence: entered });

        let after = tick(&subject, entered + Duration::days(30));
        assert!(trigger.evaluate(&after).is_due());
    }

    #[test]
    fn elapsed_time_status_filter() {
        let trigger = parse("elapsed_time", json!({"days": 1, "status": STATUS_NEW})).unwrap();
        let subject = qualified(5);
        assert_eq!(
            trigger.evaluate(&tick(&subject, now())),
            Verdict::NotDue(NotDue::StatusMismatch)
        );
    }

    #[test]
    fn elapsed_time_falls_back_to_creation() {
        let trigger = parse("elapsed_time", json!({"days": 2})).unwrap();
        let subject = SubjectContext::applicant(1, 2, now() - Duration::days(3));
        assert_eq!(
            trigger.evaluate(&tick(&subject, now())),
            Verdict::Due {
                occurrence: now() - Duration::days(3)
            }
        );
    }

    #[test]
    fn before_interview_window() {
        let trigger = parse("elapsed_time", json!({"days_before_event": 1})).unwrap();
        let mut subject = qualified(3);
        assert_eq!(
            trigger.evaluate(&tick(&subject, now())),
            Verdict::NotDue(NotDue::NoInterview)
        );

        subject.interview_at = Some(now() + Duration::hours(20));
        assert!(trigger.evaluate(&tick(&subject, now())).is_due());

        subject.interview_at = Some(now() + Duration::hours(30));
        assert_matches!(
            trigger.evaluate(&tick(&subject, now())),
            Verdict::NotDue(NotDue::TooEarly(_))
        );

        subject.interview_at = Some(now() - Duration::hours(1));
        assert_eq!(
            trigger.evaluate(&tick(&subject, now())),
            Verdict::NotDue(NotDue::InterviewPassed)
        );
    }

    #[test]
    fn status_change_on_event() {
        let trigger = parse(
            "status_change",
            json!({"to_status": STATUS_QUALIFIED, "from_status": STATUS_NEW}),
        )
        .unwrap();
        let subject = qualified(0);

        let matching = SubjectEvent::StatusChanged {
            from_status: Some(STATUS_NEW.into()),
            to_status: STATUS_QUALIFIED.into(),
        };
        let ctx = DueContext {
            event: Some(&matching),
            ..tick(&subject, now())
        };
        assert!(trigger.evaluate(&ctx).is_due());

        let wrong_from = SubjectEvent::StatusChanged {
            from_status: Some("Vorgestellt".into()),
            to_status: STATUS_QUALIFIED.into(),
        };
        let ctx = DueContext {
            event: Some(&wrong_from),
            ..tick(&subject, now())
        };
        assert_eq!(trigger.evaluate(&ctx), Verdict::NotDue(NotDue::FromStatusMismatch));

        let created = SubjectEvent::RecordCreated;
        let ctx = DueContext {
            event: Some(&created),
            ..tick(&subject, now())
        };
        assert_eq!(trigger.evaluate(&ctx), Verdict::NotDue(NotDue::EventMismatch));
    }

    #[test]
    fn status_change_tick_catch_up_ignores_older_entries() {
        let trigger = parse("status_change", json!({"to_status": STATUS_QUALIFIED})).unwrap();
        let subject = qualified(2);

        assert!(trigger.evaluate(&tick(&subject, now())).is_due());

        let ctx = DueContext {
            rule_created_at: now() - Duration::days(1),
            ..tick(&subject, now())
        };
        assert_eq!(trigger.evaluate(&ctx), Verdict::NotDue(NotDue::BeforeRuleCreated));
    }

    #[test]
    fn status_change_event_and_tick_agree_without_entry_time() {
        let trigger = parse("status_change", json!({"to_status": STATUS_QUALIFIED})).unwrap();
        let created = now() - Duration::days(2);
        let mut subject = SubjectContext::applicant(1, 9, created);
        subject.status = Some(STATUS_QUALIFIED.to_string());

        let event = SubjectEvent::StatusChanged {
            from_status: None,
            to_status: STATUS_QUALIFIED.into(),
        };
        let inline = DueContext {
            event: Some(&event),
            ..tick(&subject, now())
        };
        assert_eq!(trigger.evaluate(&inline), Verdict::Due { occurrence: created });
        assert_eq!(
            trigger.evaluate(&tick(&subject, now() + Duration::hours(1))),
            Verdict::Due { occurrence: created }
        );
    }

    #[test]
    fn oversized_offsets_are_rejected() {
        assert_matches!(
            parse("elapsed_time", json!({"days": 200_000_000_000_i64})),
            Err(ConfigError::InvalidValue { field: "days", .. })
        );
        assert_matches!(
            parse("elapsed_time", json!({"days": 1, "hours": i64::MAX})),
            Err(ConfigError::InvalidValue { field: "days", .. })
        );
        assert_matches!(
            parse("elapsed_time", json!({"days_before_event": 4000})),
            Err(ConfigError::InvalidValue { field: "days_before_event", .. })
        );
        assert!(parse("elapsed_time", json!({"days": 3650})).is_ok());
    }

    #[test]
    fn out_of_range_offset_is_never_due() {
        let subject = qualified(1);
        let far = Trigger::ElapsedTime(ElapsedTimeTrigger {
            offset_hours: i64::MAX,
            status: None,
            anchor: Anchor::StatusEntered,
        });
        assert_eq!(
            far.evaluate(&tick(&subject, now())),
            Verdict::NotDue(NotDue::OutOfRange)
        );

        let mut interviewed = qualified(1);
        interviewed.interview_at = Some(now() + Duration::days(1));
        let before = Trigger::ElapsedTime(ElapsedTimeTrigger {
            offset_hours: i64::MAX / 2,
            status: None,
            anchor: Anchor::BeforeInterview,
        });
        assert_eq!(
            before.evaluate(&tick(&interviewed, now())),
            Verdict::NotDue(NotDue::OutOfRange)
        );
    }

    #[test]
    fn new_record_only_for_subjects_created_after_rule() {
        let subject = SubjectContext::applicant(1, 2, now() - Duration::hours(1));
        let ctx = DueContext {
            rule_created_at: now() - Duration::days(1),
            ..tick(&subject, now())
        };
        assert!(Trigger::NewRecord.evaluate(&ctx).is_due());

        let ctx = DueContext {
            rule_created_at: now(),
            ..tick(&subject, now())
        };
        assert_eq!(
            Trigger::NewRecord.evaluate(&ctx),
            Verdict::NotDue(NotDue::BeforeRuleCreated)
        );
    }

    #[test]
    fn schedule_occurrences() {
        let monday = ScheduleTrigger {
            day: Some(Weekday::Mon),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };
        // Friday 2026-03-20 -> last Monday 2026-03-16 09:00.
        assert_eq!(
            monday.latest_occurrence(now(), utc()),
            Some(Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap())
        );
        assert_eq!(
            monday.next_occurrence(now(), utc()),
            Utc.with_ymd_and_hms(2026, 3, 23, 9, 0, 0).unwrap()
        );

        let daily = ScheduleTrigger {
            day: None,
            time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
        };
        assert_eq!(
            daily.latest_occurrence(now(), utc()),
            Some(Utc.with_ymd_and_hms(2026, 3, 19, 13, 0, 0).unwrap())
        );
    }

    #[test]
    fn schedule_respects_offset() {
        let daily = ScheduleTrigger {
            day: None,
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        };
        let cet = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            daily.latest_occurrence(now(), cet),
            Some(Utc.with_ymd_and_hms(2026, 3, 20, 7, 0, 0).unwrap())
        );
    }

    #[test]
    fn schedule_is_client_scoped() {
        let trigger = parse("recurring_schedule", json!({"time": "08:00"})).unwrap();
        let applicant = qualified(1);
        assert_eq!(
            trigger.evaluate(&tick(&applicant, now())),
            Verdict::NotDue(NotDue::WrongScope)
        );

        let client = SubjectContext::client_scope(1, now() - Duration::days(100));
        assert_eq!(
            trigger.evaluate(&tick(&client, now())),
            Verdict::Due {
                occurrence: Utc.with_ymd_and_hms(2026, 3, 20, 8, 0, 0).unwrap()
            }
        );
    }

    #[test]
    fn schedule_created_after_latest_occurrence_waits() {
        let trigger = parse("recurring_schedule", json!({"day": "monday"})).unwrap();
        let client = SubjectContext::client_scope(1, now() - Duration::days(100));
        let ctx = DueContext {
            rule_created_at: now() - Duration::days(1),
            ..tick(&client, now())
        };
        assert_matches!(trigger.evaluate(&ctx), Verdict::NotDue(NotDue::TooEarly(_)));
    }
}
