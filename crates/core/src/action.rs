//! Action declarations.
//!
//! Like triggers, actions are stored as an `action_type` string plus a JSON
//! `action_config` and parsed into a tagged union here. Execution lives in
//! the worker's dispatcher; this module only knows shapes and validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// A parsed action declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SendMessage(SendMessageAction),
    RaiseNotification(NotificationAction),
    PurgeExpired(PurgeAction),
}

/// Who receives a rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    /// The subject's own address.
    Applicant,
    /// The client's reply-to address.
    Client,
    /// A fixed address.
    Address(String),
}

impl Recipient {
    /// Parse a stored recipient: `applicant`, `client`, or an address.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim() {
            "applicant" | "bewerber" | "candidate" => Ok(Self::Applicant),
            "client" | "kunde" | "team" => Ok(Self::Client),
            addr if addr.contains('@') => Ok(Self::Address(addr.to_string())),
            other => Err(ConfigError::invalid(
                "recipient",
                format!("expected applicant, client or an address, got '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageAction {
    pub template_slug: String,
    /// Overrides the template's recipient type when set.
    pub recipient: Option<Recipient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub event_type: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeAction {
    #[serde(default = "default_true")]
    pub archive: bool,
    #[serde(default = "default_true")]
    pub delete: bool,
    #[serde(default)]
    pub archive_after_months: Option<u32>,
    #[serde(default)]
    pub delete_after_months: Option<u32>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct SendMessageConfig {
    #[serde(alias = "template", alias = "template_id")]
    template_slug: String,
    #[serde(default)]
    recipient: Option<String>,
}

impl Action {
    /// Parse and validate a stored action. Accepts the legacy portal names
    /// (`send_email`, `notify`, `delete_expired_data`).
    pub fn parse(action_type: &str, config: &Value) -> Result<Self, ConfigError> {
        let config = match config {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };

        match action_type {
            "send_message" | "send_email" => {
                let raw: SendMessageConfig = serde_json::from_value(config)
                    .map_err(|e| ConfigError::malformed("action", e))?;
                if raw.template_slug.trim().is_empty() {
                    return Err(ConfigError::invalid("template_slug", "must not be empty"));
                }
                let recipient = raw.recipient.as_deref().map(Recipient::parse).transpose()?;
                Ok(Self::SendMessage(SendMessageAction {
                    template_slug: raw.template_slug,
                    recipient,
                }))
            }
            "raise_notification" | "notify" => {
                let action: NotificationAction = serde_json::from_value(config)
                    .map_err(|e| ConfigError::malformed("action", e))?;
                if action.event_type.trim().is_empty() {
                    return Err(ConfigError::invalid("event_type", "must not be empty"));
                }
                if action.title.trim().is_empty() {
                    return Err(ConfigError::invalid("title", "must not be empty"));
                }
                Ok(Self::RaiseNotification(action))
            }
            "purge_expired" | "delete_expired_data" => {
                let action: PurgeAction = serde_json::from_value(config)
                    .map_err(|e| ConfigError::malformed("action", e))?;
                if !action.archive && !action.delete {
                    return Err(ConfigError::invalid(
                        "purge",
                        "at least one of archive or delete must be enabled",
                    ));
                }
                Ok(Self::PurgeExpired(action))
            }
            other => Err(ConfigError::UnknownAction(other.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => "send_message",
            Self::RaiseNotification(_) => "raise_notification",
            Self::PurgeExpired(_) => "purge_expired",
        }
    }

    /// Purges are idempotent over the whole client scope and leave no
    /// firing record behind.
    pub fn records_firing(&self) -> bool {
        !matches!(self, Self::PurgeExpired(_))
    }
}
