use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::database::UserStore;
use crate::models::{normalize_email, LoginRequest, SignupRequest, User, UserResponse};
use crate::utils::error::AppError;
use crate::utils::time::to_rfc3339;

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Token and hashing parameters, built once from configuration.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub expiry_hours: i64,
    pub issuer: String,
    pub audience: String,
    pub bcrypt_cost: u32,
}

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user id
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Signs a session token for `user_id`, returning it with its expiry.
pub fn issue_token(settings: &AuthSettings, user_id: &str) -> Result<(String, i64), AppError> {
    let now = Utc::now();
    let expires = now + Duration::hours(settings.expiry_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: expires.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: settings.audience.clone(),
        iss: settings.issuer.clone(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))?;

    Ok((token, expires.timestamp_millis()))
}

pub fn verify_token(settings: &AuthSettings, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[settings.audience.as_str()]);

    let mut issuers = HashSet::new();
    issuers.insert(settings.issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        log::debug!("🔒 Token rejected: {}", e);
        AppError::Unauthorized("invalid or expired token".to_string())
    })
}

/// Never fails: an invalid token is reported as `valid: false`.
pub fn inspect_token(settings: &AuthSettings, token: &str) -> VerifyTokenResponse {
    match verify_token(settings, token) {
        Ok(claims) => VerifyTokenResponse {
            valid: true,
            user_id: Some(claims.sub),
            expires_at: Some(to_rfc3339(claims.exp as i64 * 1000)),
        },
        Err(_) => VerifyTokenResponse {
            valid: false,
            user_id: None,
            expires_at: None,
        },
    }
}

fn session_for(settings: &AuthSettings, user: &User) -> Result<AuthResponse, AppError> {
    let (token, expires_at) = issue_token(settings, &user.id)?;
    Ok(AuthResponse {
        token,
        expires_at: to_rfc3339(expires_at),
        user: UserResponse::from(user),
    })
}

pub async fn register<S: UserStore + ?Sized>(
    store: &S,
    settings: &AuthSettings,
    request: &SignupRequest,
) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&request.email);

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("email already registered".to_string()));
    }

    let password_hash = hash(&request.password, settings.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))?;

    let user = User::new(request, password_hash);
    // The unique index settles concurrent signups with the same email
    store.create_user(&user).await?;

    log::info!("👤 User registered: {}", user.id);
    session_for(settings, &user)
}

pub async fn login<S: UserStore + ?Sized>(
    store: &S,
    settings: &AuthSettings,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&request.email);

    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let valid = verify(&request.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    session_for(settings, &user)
}

#[cfg(test)]
pub(crate) fn test_settings() -> AuthSettings {
    AuthSettings {
        secret: "test-secret".to_string(),
        expiry_hours: 24,
        issuer: "intro-hub".to_string(),
        audience: "intro-hub-api".to_string(),
        bcrypt_cost: 4,
    }
}
