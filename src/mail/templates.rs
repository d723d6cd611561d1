//! Mail bodies rendered from embedded Tera templates

use chrono::{DateTime, Utc};
use rust_embed::Embed;
use tera::Tera;
use thiserror::Error;

use crate::core::invite::Terms;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

/// Everything an invite mail shows
#[derive(Debug, Clone)]
pub struct InviteMail {
    pub recipient_name: String,
    pub inviter_name: String,
    /// "worker", "applicator user", "grower"
    pub relationship: String,
    pub accept_url: String,
    pub expires_at: DateTime<Utc>,
    /// The recipient's account was created together with the invite
    pub new_account: bool,
    pub terms: Terms,
}

impl InviteMail {
    pub fn subject(&self) -> String {
        if self.new_account {
            format!("{} invited you to Agrilink", self.inviter_name)
        } else {
            format!("{} sent you an invitation", self.inviter_name)
        }
    }
}

pub struct MailTemplates {
    tera: Tera,
}

impl MailTemplates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut sources = Vec::new();
        for file in EmbeddedTemplates::iter() {
            let name = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(name) {
                if let Ok(text) = std::str::from_utf8(&content.data) {
                    sources.push((name.to_string(), text.to_string()));
                }
            }
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)
            .map_err(|e| TemplateError::RenderError(e.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render_invite(&self, mail: &InviteMail) -> Result<String, TemplateError> {
        let mut context = tera::Context::new();
        context.insert("subject", &mail.subject());
        context.insert("recipient_name", &mail.recipient_name);
        context.insert("inviter_name", &mail.inviter_name);
        context.insert("relationship", &mail.relationship);
        context.insert("accept_url", &mail.accept_url);
        context.insert("expires_at", &mail.expires_at.format("%B %-d, %Y").to_string());
        context.insert("new_account", &mail.new_account);
        context.insert("percentage_fee", &mail.terms.percentage_fee);
        context.insert("dollar_per_acre", &mail.terms.dollar_per_acre);
        self.render("mail/invite.html", &context)
    }

    pub fn render_notification(
        &self,
        recipient_name: &str,
        subject: &str,
        message: &str,
    ) -> Result<String, TemplateError> {
        let mut context = tera::Context::new();
        context.insert("subject", subject);
        context.insert("recipient_name", recipient_name);
        context.insert("message", message);
        self.render("mail/notification.html", &context)
    }

    fn render(&self, name: &str, context: &tera::Context) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        self.tera
            .render(name, context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}
