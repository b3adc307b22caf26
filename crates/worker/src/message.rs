//! Turning templates into outbound messages.

use chrono::{FixedOffset, NaiveDate};
use recruitflow_core::template_render::{self, SenderProfile, TemplateVars};
use recruitflow_core::types::Timestamp;
use recruitflow_db::models::client::ClientSettings;
use recruitflow_db::models::email_template::EmailTemplate;

/// Subject line and body after substitution and footers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Local calendar date of `now`.
pub fn local_today(now: Timestamp, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Client values shared by every message of a client.
pub fn sender_profile(settings: Option<&ClientSettings>, portal_base_url: &str) -> SenderProfile {
    let portal_link = settings
        .and_then(|s| s.portal_url.clone())
        .unwrap_or_else(|| portal_base_url.to_string());
    SenderProfile {
        company_name: settings.and_then(|s| s.company_name.clone()),
        sender_name: settings.and_then(|s| s.sender_name.clone()),
        portal_link: Some(portal_link),
    }
}

/// Render a template and append the client's signature and, when enabled,
/// the GDPR footer.
pub fn render_template(
    template: &EmailTemplate,
    vars: &TemplateVars,
    settings: Option<&ClientSettings>,
) -> RenderedMessage {
    let subject = template_render::render(&template.subject, vars);
    let mut body = template_render::render(&template.body, vars);

    if let Some(settings) = settings {
        if let Some(signature) = non_empty(&settings.email_signature) {
            body.push_str("\n\n");
            body.push_str(&template_render::render(signature, vars));
        }
        if settings.gdpr_footer_enabled {
            if let Some(footer) = non_empty(&settings.gdpr_consent_text) {
                body.push_str("\n\n");
                body.push_str(footer);
            }
        }
    }

    RenderedMessage { subject, body }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use recruitflow_core::template_render::TemplateVariable;

    use super::*;

    fn template() -> EmailTemplate {
        EmailTemplate {
            id: 1,
            client_id: 1,
            slug: "qualified".to_string(),
            name: "Qualifiziert".to_string(),
            subject: "Hallo {{bewerber_vorname}}".to_string(),
            body: "Sie sind weiter, {{bewerber_vorname}}.".to_string(),
            recipient_type: "applicant".to_string(),
            is_active: true,
            review_before_send: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn settings(gdpr: bool) -> ClientSettings {
        ClientSettings {
            client_id: 1,
            company_name: Some("Acme".to_string()),
            sender_name: Some("Jonas".to_string()),
            reply_to_email: Some("hr@acme.test".to_string()),
            email_signature: Some("Viele Grüße\n{{ansprechpartner}}".to_string()),
            gdpr_footer_enabled: gdpr,
            gdpr_consent_text: Some("Datenschutzhinweis".to_string()),
            portal_url: None,
            auto_archive_months: 6,
            auto_delete_months: 12,
            quiet_mode_until: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn appends_signature_and_footer() {
        let mut vars = TemplateVars::new();
        vars.set(TemplateVariable::ApplicantFirstName, "Anna");
        vars.set(TemplateVariable::ContactPerson, "Jonas");

        let message = render_template(&template(), &vars, Some(&settings(true)));
        assert_eq!(message.subject, "Hallo Anna");
        assert_eq!(
            message.body,
            "Sie sind weiter, Anna.\n\nViele Grüße\nJonas\n\nDatenschutzhinweis"
        );

        let without_footer = render_template(&template(), &vars, Some(&settings(false)));
        assert!(!without_footer.body.contains("Datenschutzhinweis"));
    }

    #[test]
    fn portal_link_falls_back_to_base_url() {
        let profile = sender_profile(None, "https://portal.test");
        assert_eq!(profile.portal_link.as_deref(), Some("https://portal.test"));
        assert!(profile.company_name.is_none());
    }
}
