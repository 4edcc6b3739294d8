use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::models::RequestDetails;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("email transport failed: {0}")]
    Transport(String),
    #[error("email API answered {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sends the three introduction emails. Delivery is best-effort.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// To the approver, when someone asks for an introduction.
    async fn send_new_request(&self, details: &RequestDetails) -> Result<(), NotifyError>;
    /// To requester and contact, cc approver.
    async fn send_approved(&self, details: &RequestDetails) -> Result<(), NotifyError>;
    /// To the requester.
    async fn send_declined(&self, details: &RequestDetails) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
    pub from_name: String,
    pub app_base_url: String,
}

/// Payload accepted by Resend-compatible APIs.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Builds the message bodies; shared by every notifier.
pub struct Templates<'a> {
    settings: &'a EmailSettings,
}

impl<'a> Templates<'a> {
    pub fn new(settings: &'a EmailSettings) -> Self {
        Self { settings }
    }

    fn sender(&self) -> String {
        format!("{} <{}>", self.settings.from_name, self.settings.from)
    }

    fn link(&self) -> String {
        format!("{}/requests", self.settings.app_base_url.trim_end_matches('/'))
    }

    fn message(
        &self,
        to: Vec<String>,
        cc: Vec<String>,
        subject: String,
        paragraphs: &[String],
    ) -> EmailMessage {
        let link = self.link();
        let html_body: String = paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", escape_html(p)))
            .collect();
        let html = format!(
            "<html><body>{}<p><a href=\"{}\">Open Intro-Hub</a></p></body></html>",
            html_body,
            escape_html(&link)
        );
        let text = format!("{}\n\n{}\n", paragraphs.join("\n\n"), link);

        EmailMessage {
            from: self.sender(),
            to,
            cc,
            subject,
            html,
            text,
        }
    }

    pub fn new_request(&self, details: &RequestDetails) -> EmailMessage {
        let requester = details.requester.full_name();
        let contact = details.contact.full_name();

        self.message(
            vec![details.approver.email.clone()],
            vec![],
            format!("{} would like an introduction to {}", requester, contact),
            &[
                format!("Hi {},", details.approver.first_name),
                format!(
                    "{} ({}) would like you to introduce them to {} from {}.",
                    requester, details.requester.email, contact, details.contact.company
                ),
                format!("Their message: {}", details.request.message),
            ],
        )
    }

    pub fn approved(&self, details: &RequestDetails) -> EmailMessage {
        let requester = details.requester.full_name();
        let contact = details.contact.full_name();
        let mut paragraphs = vec![
            format!("Hi {} and {},", details.requester.first_name, details.contact.first_name),
            format!(
                "{} is happy to introduce you to each other.",
                details.approver.full_name()
            ),
            format!("{}: {}", requester, details.request.message),
        ];
        if !details.request.response_message.is_empty() {
            paragraphs.push(format!(
                "{}: {}",
                details.approver.full_name(),
                details.request.response_message
            ));
        }

        self.message(
            vec![details.requester.email.clone(), details.contact.email.clone()],
            vec![details.approver.email.clone()],
            format!("Introduction: {} <> {}", requester, contact),
            &paragraphs,
        )
    }

    pub fn declined(&self, details: &RequestDetails) -> EmailMessage {
        let contact = details.contact.full_name();
        let mut paragraphs = vec![
            format!("Hi {},", details.requester.first_name),
            format!(
                "{} is not able to introduce you to {} right now.",
                details.approver.full_name(),
                contact
            ),
        ];
        if !details.request.response_message.is_empty() {
            paragraphs.push(format!("Their note: {}", details.request.response_message));
        }

        self.message(
            vec![details.requester.email.clone()],
            vec![],
            format!("Introduction request to {} was declined", contact),
            &paragraphs,
        )
    }
}

/// Posts messages to the configured email API.
pub struct EmailNotifier {
    client: reqwest::Client,
    settings: EmailSettings,
    api_key: String,
}

impl EmailNotifier {
    pub fn new(settings: EmailSettings, api_key: String) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    async fn deliver(&self, message: EmailMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        log::debug!("📧 Email accepted: {}", message.subject);
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send_new_request(&self, details: &RequestDetails) -> Result<(), NotifyError> {
        let message = Templates::new(&self.settings).new_request(details);
        self.deliver(message).await
    }

    async fn send_approved(&self, details: &RequestDetails) -> Result<(), NotifyError> {
        let message = Templates::new(&self.settings).approved(details);
        self.deliver(message).await
    }

    async fn send_declined(&self, details: &RequestDetails) -> Result<(), NotifyError> {
        let message = Templates::new(&self.settings).declined(details);
        self.deliver(message).await
    }
}

/// Renders messages to the log instead of sending them.
pub struct LogNotifier {
    settings: EmailSettings,
}

impl LogNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    fn log(&self, message: EmailMessage) -> Result<(), NotifyError> {
        log::info!(
            "📧 [email disabled] to={:?} cc={:?} subject={}",
            message.to,
            message.cc,
            message.subject
        );
        Ok(())
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_new_request(&self, details: &RequestDetails) -> Result<(), NotifyError> {
        self.log(Templates::new(&self.settings).new_request(details))
    }

    async fn send_approved(&self, details: &RequestDetails) -> Result<(), NotifyError> {
        self.log(Templates::new(&self.settings).approved(details))
    }

    async fn send_declined(&self, details: &RequestDetails) -> Result<(), NotifyError> {
        self.log(Templates::new(&self.settings).declined(details))
    }
}

/// Email delivery when an API key is configured, logging otherwise.
pub fn from_settings(settings: EmailSettings) -> Result<Arc<dyn Notifier>, NotifyError> {
    match settings.api_key.clone().filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            log::info!("📧 Email notifications via {}", settings.api_url);
            Ok(Arc::new(EmailNotifier::new(settings, key)?))
        }
        None => {
            log::warn!("⚠️  EMAIL_API_KEY not set, notifications will only be logged");
            Ok(Arc::new(LogNotifier::new(settings)))
        }
    }
}
