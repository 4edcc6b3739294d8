use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::request::{RequestDetails, RequestStatus};
use crate::utils::time::{now_millis, to_rfc3339};
use crate::utils::validation::{Report, Validate, Validator};

pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    IntroductionRequest,
    IntroductionApproved,
    IntroductionDeclined,
}

/// Names and addresses captured when the notification was written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NotificationMetadata {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub requester_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub requester_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub approver_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contact_name: Option<String>,
    /// Only revealed once the introduction is approved.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_id: Option<String>,
}

/// In-app notification (collection "notifications").
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub related_request_id: Option<String>,
    #[serde(default)]
    pub metadata: NotificationMetadata,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NotificationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub related_request_id: Option<String>,
    pub metadata: NotificationMetadata,
    pub created_at: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    /// Page size, 1 to 100.
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    /// Only return notifications not yet marked read.
    #[serde(default)]
    pub unread_only: bool,
}

fn default_limit() -> u64 {
    50
}

#[derive(Debug, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct UnreadCount {
    pub count: u64,
    pub has_unread: bool,
}

/// Outcome of a bulk mark-read or delete.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NotificationsAffected {
    pub affected: u64,
}

impl Notification {
    fn build(
        user_id: &str,
        kind: NotificationType,
        title: &str,
        message: String,
        request_id: &str,
        metadata: NotificationMetadata,
    ) -> Self {
        Notification {
            id: ObjectId::new().to_hex(),
            user_id: user_id.to_string(),
            kind,
            title: title.to_string(),
            message,
            read: false,
            related_request_id: Some(request_id.to_string()),
            metadata,
            created_at: now_millis(),
        }
    }

    /// Tells the approver someone asked for an introduction.
    pub fn new_request(details: &RequestDetails) -> Self {
        let requester = details.requester.full_name();
        let contact = details.contact.full_name();

        Self::build(
            &details.approver.id,
            NotificationType::IntroductionRequest,
            "New Introduction Request",
            format!("{} wants to be introduced to {}", requester, contact),
            &details.request.id,
            NotificationMetadata {
                requester_name: Some(requester),
                requester_email: Some(details.requester.email.clone()),
                contact_name: Some(contact),
                contact_email: Some(details.contact.email.clone()),
                request_id: Some(details.request.id.clone()),
                ..Default::default()
            },
        )
    }

    /// Tells the requester about the approver's answer; `None` while pending.
    pub fn decision(details: &RequestDetails) -> Option<Self> {
        let (kind, title, verb) = match details.request.status {
            RequestStatus::Approved => (
                NotificationType::IntroductionApproved,
                "Introduction Request Approved",
                "approved",
            ),
            RequestStatus::Declined => (
                NotificationType::IntroductionDeclined,
                "Introduction Request Declined",
                "declined",
            ),
            RequestStatus::Pending => return None,
        };
        let approver = details.approver.full_name();
        let contact = details.contact.full_name();
        let contact_email = (kind == NotificationType::IntroductionApproved)
            .then(|| details.contact.email.clone());

        Some(Self::build(
            &details.requester.id,
            kind,
            title,
            format!("{} {} your request to be introduced to {}", approver, verb, contact),
            &details.request.id,
            NotificationMetadata {
                approver_name: Some(approver),
                contact_name: Some(contact),
                contact_email,
                request_id: Some(details.request.id.clone()),
                ..Default::default()
            },
        ))
    }
}

impl From<&Notification> for NotificationResponse {
    fn from(n: &Notification) -> Self {
        NotificationResponse {
            id: n.id.clone(),
            kind: n.kind,
            title: n.title.clone(),
            message: n.message.clone(),
            read: n.read,
            related_request_id: n.related_request_id.clone(),
            metadata: n.metadata.clone(),
            created_at: to_rfc3339(n.created_at),
        }
    }
}

impl Validate for NotificationQuery {
    fn validate(&self, rules: &Validator, report: &mut Report) {
        rules.between(report, "limit", self.limit, 1, MAX_PAGE_SIZE);
    }
}
