//! Message template rendering.
//!
//! Templates carry `{{identifier}}` placeholders drawn from a fixed set of
//! variables ([`TemplateVariable`]). Rendering is a single left-to-right pass:
//! every placeholder with an entry in the variable map is substituted, every
//! other placeholder is left verbatim. Substituted values are never scanned
//! again, so rendering cannot recurse.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{Datelike, FixedOffset, NaiveDate};
use regex::{Captures, Regex};
use serde::Serialize;

use crate::pipeline;
use crate::subject::SubjectContext;

/// Regex pattern matching `{{identifier}}` placeholders. No nesting, no
/// whitespace, no expressions.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// The declared template variables.
///
/// The identifiers are part of the stored template format and therefore
/// fixed; they are the names operators insert in the portal editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TemplateVariable {
    ApplicantFirstName,
    ApplicantLastName,
    ApplicantFullName,
    JobTitle,
    CompanyName,
    Location,
    Status,
    InterviewDate,
    InterviewTime,
    PortalLink,
    Today,
    ContactPerson,
    StartDate,
    CalendarWeek,
}

impl TemplateVariable {
    pub const ALL: [TemplateVariable; 14] = [
        Self::ApplicantFirstName,
        Self::ApplicantLastName,
        Self::ApplicantFullName,
        Self::JobTitle,
        Self::CompanyName,
        Self::Location,
        Self::Status,
        Self::InterviewDate,
        Self::InterviewTime,
        Self::PortalLink,
        Self::Today,
        Self::ContactPerson,
        Self::StartDate,
        Self::CalendarWeek,
    ];

    /// Placeholder identifier as written between the braces.
    pub fn key(self) -> &'static str {
        match self {
            Self::ApplicantFirstName => "bewerber_vorname",
            Self::ApplicantLastName => "bewerber_nachname",
            Self::ApplicantFullName => "bewerber_name",
            Self::JobTitle => "stelle",
            Self::CompanyName => "firmenname",
            Self::Location => "standort",
            Self::Status => "status",
            Self::InterviewDate => "interview_datum",
            Self::InterviewTime => "interview_uhrzeit",
            Self::PortalLink => "portal_link",
            Self::Today => "datum_heute",
            Self::ContactPerson => "ansprechpartner",
            Self::StartDate => "startdatum",
            Self::CalendarWeek => "kalenderwoche",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.key() == key)
    }
}

/// Variable map handed to [`render`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateVars(BTreeMap<String, String>);

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, var: TemplateVariable, value: impl Into<String>) {
        self.0.insert(var.key().to_string(), value.into());
    }

    /// Set `var` only when a value is present. Absent values leave the
    /// placeholder untouched in the rendered output.
    pub fn set_opt(&mut self, var: TemplateVariable, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.set(var, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Client-level values shared by every message of a client.
#[derive(Debug, Clone, Default)]
pub struct SenderProfile {
    pub company_name: Option<String>,
    pub sender_name: Option<String>,
    pub portal_link: Option<String>,
}

/// Build the variable map for a subject.
///
/// `today` is the local calendar date used for `datum_heute`; `offset` is
/// the local offset interview times are displayed in.
pub fn subject_variables(
    subject: &SubjectContext,
    sender: &SenderProfile,
    today: NaiveDate,
    offset: FixedOffset,
) -> TemplateVars {
    use TemplateVariable as V;

    let mut vars = TemplateVars::new();
    vars.set_opt(V::ApplicantFirstName, subject.first_name.clone());
    vars.set_opt(V::ApplicantLastName, subject.last_name.clone());
    vars.set_opt(V::ApplicantFullName, subject.full_name());
    vars.set_opt(V::JobTitle, subject.job_title.clone());
    vars.set_opt(V::Location, subject.location.clone());
    vars.set_opt(
        V::Status,
        subject.status.as_deref().map(pipeline::client_label),
    );
    if let Some(at) = subject.interview_at {
        let local = at.with_timezone(&offset);
        vars.set(V::InterviewDate, format_date(local.date_naive()));
        vars.set(V::InterviewTime, local.format("%H:%M Uhr").to_string());
    }
    if let Some(start) = subject.start_date {
        vars.set(V::StartDate, format_date(start));
        vars.set(V::CalendarWeek, calendar_week(start));
    }
    vars.set(V::Today, format_date(today));
    vars.set_opt(V::CompanyName, sender.company_name.clone());
    vars.set_opt(V::ContactPerson, sender.sender_name.clone());
    vars.set_opt(V::PortalLink, sender.portal_link.clone());
    vars
}

/// Synthetic values for operator previews. Never derived from real records.
pub fn sample_variables(today: NaiveDate) -> TemplateVars {
    use TemplateVariable as V;

    let start = today + chrono::Duration::days(14);
    let interview = today + chrono::Duration::days(3);

    let mut vars = TemplateVars::new();
    vars.set(V::ApplicantFirstName, "Lena");
    vars.set(V::ApplicantLastName, "Brandt");
    vars.set(V::ApplicantFullName, "Lena Brandt");
    vars.set(V::JobTitle, "Servicekraft (m/w/d)");
    vars.set(V::CompanyName, "Musterhotel am See");
    vars.set(V::Location, "Zell am See");
    vars.set(V::Status, pipeline::client_label(pipeline::STATUS_QUALIFIED));
    vars.set(V::InterviewDate, format_date(interview));
    vars.set(V::InterviewTime, "10:00 Uhr");
    vars.set(V::PortalLink, "https://portal.example.com");
    vars.set(V::Today, format_date(today));
    vars.set(V::ContactPerson, "Jonas Weber");
    vars.set(V::StartDate, format_date(start));
    vars.set(V::CalendarWeek, calendar_week(start));
    vars
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn calendar_week(date: NaiveDate) -> String {
    format!("KW {}", date.iso_week().week())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Substitute every known `{{key}}` in `template`.
///
/// Total: never fails, unknown placeholders pass through unchanged.
pub fn render(template: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// All placeholder identifiers in `template`, de-duplicated and sorted.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = PLACEHOLDER_RE
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Placeholders in `template` that are not declared variables.
pub fn unknown_placeholders(template: &str) -> Vec<String> {
    extract_placeholders(template)
        .into_iter()
        .filter(|key| TemplateVariable::from_key(key).is_none())
        .collect()
}
