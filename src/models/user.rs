use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::time::{now_millis, to_rfc3339};
use crate::utils::validation::{Report, Validate, Validator};

/// Stored account (collection "users").
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    /// Always lowercase and trimmed; unique.
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_picture: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile update. Blank names keep the stored value, everything else is replaced.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_picture: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub company: String,
    pub position: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub bio: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub profile_picture: String,
    pub created_at: String,
    pub updated_at: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    pub fn new(request: &SignupRequest, password_hash: String) -> Self {
        let now = now_millis();
        User {
            id: ObjectId::new().to_hex(),
            email: normalize_email(&request.email),
            password_hash,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            company: request.company.clone(),
            position: request.position.clone(),
            bio: String::new(),
            profile_picture: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            company: user.company.clone(),
            position: user.position.clone(),
            bio: user.bio.clone(),
            profile_picture: user.profile_picture.clone(),
            created_at: to_rfc3339(user.created_at),
            updated_at: to_rfc3339(user.updated_at),
        }
    }
}

impl Validate for SignupRequest {
    fn validate(&self, rules: &Validator, report: &mut Report) {
        if rules.required(report, "email", &self.email) {
            rules.email(report, "email", &self.email);
        }
        if rules.required(report, "password", &self.password) {
            rules.password(report, "password", &self.password);
        }
        if rules.required(report, "password_confirm", &self.password_confirm) {
            rules.equal(
                report,
                "password_confirm",
                "password",
                &self.password_confirm,
                &self.password,
            );
        }
        rules.required(report, "first_name", &self.first_name);
        rules.required(report, "last_name", &self.last_name);
    }
}

impl Validate for LoginRequest {
    fn validate(&self, rules: &Validator, report: &mut Report) {
        if rules.required(report, "email", &self.email) {
            rules.email(report, "email", &self.email);
        }
        rules.required(report, "password", &self.password);
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self, _rules: &Validator, _report: &mut Report) {}
}
