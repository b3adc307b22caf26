//! Manual test-send: render a template against sample data.
//!
//! A preview reads the template and client settings and nothing else. It
//! never claims a firing key and never touches the transport.

use chrono::FixedOffset;
use recruitflow_core::template_render::{self, sample_variables, TemplateVariable};
use recruitflow_core::types::{DbId, Timestamp};
use serde::Serialize;

use crate::message::{local_today, render_template};
use crate::store::{RuleStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplatePreview {
    pub slug: String,
    pub subject: String,
    pub body: String,
    pub recipient_type: String,
    pub review_before_send: bool,
    /// Placeholders that are not template variables; left verbatim.
    pub unknown_placeholders: Vec<String>,
}

/// Render `slug` for `client_id`. `None` when the template does not exist.
pub async fn preview_template(
    store: &dyn RuleStore,
    client_id: DbId,
    slug: &str,
    now: Timestamp,
    offset: FixedOffset,
) -> Result<Option<TemplatePreview>, StoreError> {
    let Some(template) = store.template(client_id, slug).await? else {
        return Ok(None);
    };
    let settings = store.client_settings(client_id).await?;

    let mut vars = sample_variables(local_today(now, offset));
    if let Some(settings) = &settings {
        vars.set_opt(TemplateVariable::CompanyName, settings.company_name.clone());
        vars.set_opt(TemplateVariable::ContactPerson, settings.sender_name.clone());
        vars.set_opt(TemplateVariable::PortalLink, settings.portal_url.clone());
    }

    let rendered = render_template(&template, &vars, settings.as_ref());

    let mut unknown = template_render::unknown_placeholders(&template.subject);
    for key in template_render::unknown_placeholders(&template.body) {
        if !unknown.contains(&key) {
            unknown.push(key);
        }
    }

    Ok(Some(TemplatePreview {
        slug: template.slug,
        subject: rendered.subject,
        body: rendered.body,
        recipient_type: template.recipient_type,
        review_before_send: template.review_before_send,
        unknown_placeholders: unknown,
    }))
}
