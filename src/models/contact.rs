use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::user::{normalize_email, User, UserResponse};
use crate::utils::time::{now_millis, to_rfc3339};
use crate::utils::validation::{Report, Validate, Validator};

/// Contact owned by a single user (collection "contacts").
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owner id; (user_id, email) is unique.
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub linkedin_url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct CreateContactRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub linkedin_url: String,
}

/// Partial update. Blank email/first_name/last_name mean "keep";
/// the remaining fields always overwrite, even with an empty string.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateContactRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub linkedin_url: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct BatchImportRequest {
    #[serde(default)]
    pub contacts: Vec<CreateContactRequest>,
}

#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct BatchImportResponse {
    pub success_count: usize,
    pub error_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchImportError>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BatchImportError {
    pub data: CreateContactRequest,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct ContactResponse {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub company: String,
    pub position: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub phone: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub linkedin_url: String,
    pub user: UserResponse,
    pub created_at: String,
    pub updated_at: String,
}

impl Contact {
    pub fn new(owner_id: &str, request: &CreateContactRequest) -> Self {
        let now = now_millis();
        Contact {
            id: ObjectId::new().to_hex(),
            user_id: owner_id.to_string(),
            email: normalize_email(&request.email),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            company: request.company.clone(),
            position: request.position.clone(),
            notes: request.notes.clone(),
            phone: request.phone.clone(),
            linkedin_url: request.linkedin_url.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive substring match used by both search flavours.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        self.first_name.to_lowercase().contains(&needle)
            || self.last_name.to_lowercase().contains(&needle)
            || self.company.to_lowercase().contains(&needle)
    }

    pub fn to_response(&self, owner: &User) -> ContactResponse {
        ContactResponse {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            full_name: self.full_name(),
            company: self.company.clone(),
            position: self.position.clone(),
            notes: self.notes.clone(),
            phone: self.phone.clone(),
            linkedin_url: self.linkedin_url.clone(),
            user: UserResponse::from(owner),
            created_at: to_rfc3339(self.created_at),
            updated_at: to_rfc3339(self.updated_at),
        }
    }
}

impl Validate for CreateContactRequest {
    fn validate(&self, rules: &Validator, report: &mut Report) {
        rules.required(report, "email", &self.email);
        rules.required(report, "first_name", &self.first_name);
        rules.required(report, "last_name", &self.last_name);
        rules.required(report, "company", &self.company);
        rules.required(report, "position", &self.position);
    }
}

impl Validate for UpdateContactRequest {
    fn validate(&self, rules: &Validator, report: &mut Report) {
        if !self.email.trim().is_empty() {
            rules.email(report, "email", &self.email);
        }
    }
}

impl Validate for BatchImportRequest {
    // Items are checked one by one during the import itself.
    fn validate(&self, _rules: &Validator, report: &mut Report) {
        if self.contacts.is_empty() {
            report.push("contacts is required".to_string());
        }
    }
}
