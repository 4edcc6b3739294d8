use actix_web::{web, HttpResponse};

use crate::api::AppState;
use crate::middleware::AuthUser;
use crate::models::{UpdateProfileRequest, UserResponse};
use crate::services::user_service;
use crate::utils::error::{AppError, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "Profile",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    log::info!("👤 GET /profile - user: {}", user.user_id);

    let profile = user_service::get_profile(&*state.store, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&profile)))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile",
    tag = "Profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✏️  PUT /profile - user: {}", user.user_id);

    state.validator.check(&*request)?;
    let profile = user_service::update_profile(&*state.store, &user.user_id, &request).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&profile)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/profile",
    tag = "Profile",
    responses(
        (status = 204, description = "Account and contacts deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_account(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️  DELETE /profile - user: {}", user.user_id);

    user_service::delete_account(&*state.store, &user.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
