use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::contact::{Contact, ContactResponse};
use crate::models::user::{User, UserResponse};
use crate::utils::time::{now_millis, to_rfc3339};
use crate::utils::validation::{Report, Validate, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Approved => write!(f, "approved"),
            RequestStatus::Declined => write!(f, "declined"),
        }
    }
}

/// Introduction request (collection "introduction_requests").
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IntroductionRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub requester_id: String,
    pub approver_id: String,
    pub target_contact_id: String,
    pub message: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub response_message: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateIntroductionRequest {
    #[serde(default)]
    pub approver_id: String,
    #[serde(default)]
    pub target_contact_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateIntroductionRequest {
    pub status: RequestStatus,
    #[serde(default)]
    pub response_message: String,
}

/// Which side of the relationship a listing is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Sent,
    #[default]
    Received,
}

impl RequestKind {
    /// `sent` selects outgoing requests; anything else, or nothing, means received.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("sent") => RequestKind::Sent,
            _ => RequestKind::Received,
        }
    }
}

/// A request together with the three entities it references.
#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub request: IntroductionRequest,
    pub requester: User,
    pub approver: User,
    pub contact: Contact,
}

/// A request with whichever of its referenced records still exist.
#[derive(Debug, Clone)]
pub struct RequestView {
    pub request: IntroductionRequest,
    pub requester: Option<User>,
    pub approver: Option<User>,
    pub contact: Option<Contact>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RequestResponse {
    pub id: String,
    pub requester_id: String,
    pub approver_id: String,
    pub target_contact_id: String,
    /// Omitted once the user is gone.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub requester: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub approver: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_contact: Option<ContactResponse>,
    pub message: String,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub response_message: String,
    pub created_at: String,
    pub updated_at: String,
}

impl IntroductionRequest {
    pub fn new(requester_id: &str, request: &CreateIntroductionRequest) -> Self {
        let now = now_millis();
        IntroductionRequest {
            id: ObjectId::new().to_hex(),
            requester_id: requester_id.to_string(),
            approver_id: request.approver_id.trim().to_string(),
            target_contact_id: request.target_contact_id.trim().to_string(),
            message: request.message.clone(),
            status: RequestStatus::Pending,
            response_message: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.requester_id == user_id || self.approver_id == user_id
    }
}

impl RequestView {
    pub fn is_complete(&self) -> bool {
        self.requester.is_some() && self.approver.is_some() && self.contact.is_some()
    }

    pub fn details(&self) -> Option<RequestDetails> {
        Some(RequestDetails {
            request: self.request.clone(),
            requester: self.requester.clone()?,
            approver: self.approver.clone()?,
            contact: self.contact.clone()?,
        })
    }
}

impl From<RequestDetails> for RequestView {
    fn from(details: RequestDetails) -> Self {
        RequestView {
            request: details.request,
            requester: Some(details.requester),
            approver: Some(details.approver),
            contact: Some(details.contact),
        }
    }
}

impl From<&RequestView> for RequestResponse {
    fn from(view: &RequestView) -> Self {
        let request = &view.request;
        let target_contact = match (&view.contact, &view.approver) {
            (Some(contact), Some(approver)) => Some(contact.to_response(approver)),
            _ => None,
        };
        RequestResponse {
            id: request.id.clone(),
            requester_id: request.requester_id.clone(),
            approver_id: request.approver_id.clone(),
            target_contact_id: request.target_contact_id.clone(),
            requester: view.requester.as_ref().map(UserResponse::from),
            approver: view.approver.as_ref().map(UserResponse::from),
            target_contact,
            message: request.message.clone(),
            status: request.status,
            response_message: request.response_message.clone(),
            created_at: to_rfc3339(request.created_at),
            updated_at: to_rfc3339(request.updated_at),
        }
    }
}

impl Validate for CreateIntroductionRequest {
    fn validate(&self, rules: &Validator, report: &mut Report) {
        rules.required(report, "approver_id", &self.approver_id);
        rules.required(report, "target_contact_id", &self.target_contact_id);
        rules.required(report, "message", &self.message);
    }
}

const MAX_RESPONSE_MESSAGE: usize = 2000;

impl Validate for UpdateIntroductionRequest {
    fn validate(&self, _rules: &Validator, report: &mut Report) {
        if self.response_message.chars().count() > MAX_RESPONSE_MESSAGE {
            report.push(format!(
                "response_message must be at most {} characters",
                MAX_RESPONSE_MESSAGE
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&RequestStatus::Approved).unwrap(), "\"approved\"");
        let parsed: UpdateIntroductionRequest =
            serde_json::from_str(r#"{"status":"declined"}"#).unwrap();
        assert_eq!(parsed.status, RequestStatus::Declined);
        assert!(parsed.response_message.is_empty());
        let unknown = serde_json::from_str::<UpdateIntroductionRequest>(r#"{"status":"maybe"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_new_request_is_pending() {
        let request = IntroductionRequest::new(
            "requester",
            &CreateIntroductionRequest {
                approver_id: "approver".into(),
                target_contact_id: "contact".into(),
                message: "hello".into(),
            },
        );
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.response_message.is_empty());
        assert!(request.involves("requester"));
        assert!(request.involves("approver"));
        assert!(!request.involves("someone-else"));
    }

    #[test]
    fn test_kind_defaults_to_received() {
        assert_eq!(RequestKind::from_param(Some("sent")), RequestKind::Sent);
        assert_eq!(RequestKind::from_param(Some("received")), RequestKind::Received);
        assert_eq!(RequestKind::from_param(Some("Sent")), RequestKind::Received);
        assert_eq!(RequestKind::from_param(Some("")), RequestKind::Received);
        assert_eq!(RequestKind::from_param(None), RequestKind::Received);
    }

    #[test]
    fn test_response_message_length_is_bounded() {
        let rules = Validator::default();
        let ok = UpdateIntroductionRequest {
            status: RequestStatus::Approved,
            response_message: "sure".into(),
        };
        assert!(rules.check(&ok).is_ok());

        let long = UpdateIntroductionRequest {
            status: RequestStatus::Declined,
            response_message: "x".repeat(MAX_RESPONSE_MESSAGE + 1),
        };
        let err = rules.check(&long).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: response_message must be at most 2000 characters"
        );
    }

    #[test]
    fn test_view_without_contact_still_responds() {
        let request = IntroductionRequest::new(
            "requester",
            &CreateIntroductionRequest {
                approver_id: "approver".into(),
                target_contact_id: "gone".into(),
                message: "hello".into(),
            },
        );
        let view = RequestView {
            request,
            requester: None,
            approver: None,
            contact: None,
        };
        assert!(!view.is_complete());
        assert!(view.details().is_none());

        let json = serde_json::to_value(RequestResponse::from(&view)).unwrap();
        assert_eq!(json["target_contact_id"], "gone");
        assert!(json.get("target_contact").is_none());
        assert!(json.get("requester").is_none());
    }
}
