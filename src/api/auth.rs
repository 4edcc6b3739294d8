use actix_web::{web, HttpRequest, HttpResponse};

use crate::api::AppState;
use crate::middleware::auth::bearer_token;
use crate::models::{LoginRequest, SignupRequest};
use crate::services::auth_service::{self, AuthResponse, VerifyTokenResponse};
use crate::utils::error::{AppError, ErrorResponse};

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /auth/register - email: {}", request.email);

    state.validator.check(&*request)?;

    match auth_service::register(&*state.store, &state.auth, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", response.user.email);
            Ok(HttpResponse::Created().json(response))
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", request.email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    state.validator.check(&*request)?;

    match auth_service::login(&*state.store, &state.auth, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", response.user.email);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = VerifyTokenResponse),
        (status = 401, description = "Invalid or expired token", body = VerifyTokenResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_token(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    log::info!("✓ GET /auth/verify");

    let result = match bearer_token(&req) {
        Ok(token) => auth_service::inspect_token(&state.auth, token),
        Err(_) => VerifyTokenResponse {
            valid: false,
            user_id: None,
            expires_at: None,
        },
    };

    if result.valid {
        HttpResponse::Ok().json(result)
    } else {
        HttpResponse::Unauthorized().json(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::configure;
    use crate::api::tests::{bearer, signup, test_state};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_register_validation_errors() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": "not-an-email",
                "password": "abc",
                "password_confirm": "abc",
                "first_name": "Ana",
                "last_name": "Silva"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(
            body["error"],
            "validation failed: email must be a valid email address, \
             password must be at least 6 characters in length"
        );
    }

    #[actix_web::test]
    async fn test_duplicate_registration_is_409() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        signup!(&app, "ana@example.com", "Ana");

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": "ANA@example.com",
                "password": "secret1",
                "password_confirm": "secret1",
                "first_name": "Ana",
                "last_name": "Silva"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_login_and_verify() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let (_, user_id) = signup!(&app, "ana@example.com", "Ana");

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "ana@example.com", "password": "wrong1" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "invalid email or password");

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "ana@example.com", "password": "secret1" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let token = body["token"].as_str().unwrap();
        assert!(body["user"].get("password_hash").is_none());

        let req = test::TestRequest::get()
            .uri("/api/v1/auth/verify")
            .insert_header(bearer(token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["user_id"], user_id.as_str());

        let req = test::TestRequest::get().uri("/api/v1/auth/verify").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
