//! Typed rules built from stored automations and reminders.
//!
//! Parsing happens once per tick per rule; a rule whose configuration does
//! not parse is skipped for that tick and logged by the caller.

use recruitflow_core::action::{Action, NotificationAction, SendMessageAction};
use recruitflow_core::condition::ConditionSet;
use recruitflow_core::error::ConfigError;
use recruitflow_core::firing::{FiringKey, RuleKind, RuleRef};
use recruitflow_core::pipeline::Pipeline;
use recruitflow_core::reminder;
use recruitflow_core::send_window::SendWindow;
use recruitflow_core::subject::{SubjectKind, SubjectRef};
use recruitflow_core::trigger::Trigger;
use recruitflow_core::types::{DbId, Timestamp};
use recruitflow_db::models::automation::Automation;
use recruitflow_db::models::reminder::Reminder;

/// Event type of notifications raised by reminders without a template.
pub const REMINDER_EVENT_TYPE: &str = "reminder";

/// One evaluable rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub rule: RuleRef,
    pub client_id: DbId,
    pub name: String,
    /// Distinguishes the stage rules of one reminder; empty for automations.
    pub variant: &'static str,
    pub trigger: Trigger,
    pub conditions: ConditionSet,
    pub action: Action,
    pub once_per_subject: bool,
    pub window: Option<SendWindow>,
    pub created_at: Timestamp,
}

impl Rule {
    pub fn from_automation(row: &Automation, pipeline: &Pipeline) -> Result<Self, ConfigError> {
        let trigger = Trigger::parse(&row.trigger_type, &row.trigger_config, pipeline)?;
        let conditions = ConditionSet::parse(row.condition_config.as_ref())?;
        let action = Action::parse(&row.action_type, &row.action_config)?;

        Ok(Self {
            rule: RuleRef {
                kind: RuleKind::Automation,
                id: row.id,
            },
            client_id: row.client_id,
            name: row.name.clone(),
            variant: "",
            trigger,
            conditions,
            action,
            once_per_subject: row.only_once_per_subject,
            window: SendWindow::from_bounds(row.send_window_start, row.send_window_end),
            created_at: row.created_at,
        })
    }

    /// Expand a reminder into one rule per configured stage.
    pub fn from_reminder(row: &Reminder, pipeline: &Pipeline) -> Result<Vec<Self>, ConfigError> {
        if SubjectKind::parse(&row.target_type) != Some(SubjectKind::Applicant) {
            return Err(ConfigError::invalid(
                "target_type",
                format!("reminders can only target applicants, got '{}'", row.target_type),
            ));
        }

        let stages = reminder::expand(&row.config, row.target_status.as_deref(), pipeline)?;
        let action = match row.linked_template_slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => Action::SendMessage(SendMessageAction {
                template_slug: slug.to_string(),
                recipient: None,
            }),
            _ => Action::RaiseNotification(NotificationAction {
                event_type: REMINDER_EVENT_TYPE.to_string(),
                title: row.name.clone(),
                body: row.description.clone(),
                link: None,
            }),
        };

        Ok(stages
            .into_iter()
            .map(|(stage, trigger)| Self {
                rule: RuleRef {
                    kind: RuleKind::Reminder,
                    id: row.id,
                },
                client_id: row.client_id,
                name: row.name.clone(),
                variant: stage.as_str(),
                trigger,
                conditions: ConditionSet::default(),
                action: action.clone(),
                once_per_subject: true,
                window: None,
                created_at: row.created_at,
            })
            .collect())
    }

    pub fn firing_key(&self, subject: SubjectRef, occurrence: Timestamp) -> FiringKey {
        FiringKey::new(
            self.rule,
            subject,
            self.variant,
            self.once_per_subject,
            occurrence,
        )
    }
}
