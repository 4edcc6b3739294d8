use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::api::AppState;
use crate::middleware::AuthUser;
use crate::models::{
    CreateIntroductionRequest, RequestKind, RequestResponse, UpdateIntroductionRequest,
};
use crate::services::request_service;
use crate::utils::error::{AppError, ErrorResponse};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// `sent` for outgoing requests; any other value lists received ones.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/requests",
    tag = "Requests",
    params(ListQuery),
    responses(
        (status = 200, description = "Requests, newest first", body = [RequestResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_requests(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let kind = RequestKind::from_param(query.kind.as_deref());
    log::info!("📋 GET /requests - user: {}, type: {:?}", user.user_id, kind);

    let requests = request_service::list(&*state.store, &user.user_id, kind).await?;
    let response: Vec<RequestResponse> = requests.iter().map(RequestResponse::from).collect();

    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/requests",
    tag = "Requests",
    request_body = CreateIntroductionRequest,
    responses(
        (status = 201, description = "Request created", body = RequestResponse),
        (
            status = 400,
            description = "Invalid input or contact not owned by approver",
            body = ErrorResponse
        ),
        (status = 404, description = "Contact not found", body = ErrorResponse),
        (status = 409, description = "Request already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_request(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateIntroductionRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "🤝 POST /requests - user: {}, contact: {}",
        user.user_id,
        request.target_contact_id
    );

    state.validator.check(&*request)?;

    let created = request_service::create(
        &*state.store,
        &state.notifications,
        &user.user_id,
        &request,
    )
    .await;

    match created {
        Ok(view) => Ok(HttpResponse::Created().json(RequestResponse::from(&view))),
        Err(e) => {
            log::warn!("❌ Request creation failed for {}: {}", user.user_id, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    tag = "Requests",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request", body = RequestResponse),
        (status = 404, description = "Not found or not visible to caller", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_request(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("📄 GET /requests/{} - user: {}", id, user.user_id);

    let view = request_service::get(&*state.store, &id, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(RequestResponse::from(&view)))
}

#[utoipa::path(
    put,
    path = "/api/v1/requests/{id}",
    tag = "Requests",
    params(("id" = String, Path, description = "Request id")),
    request_body = UpdateIntroductionRequest,
    responses(
        (status = 200, description = "Request updated", body = RequestResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Caller is not the approver", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_request(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    request: web::Json<UpdateIntroductionRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!(
        "📝 PUT /requests/{} - user: {}, status: {}",
        id,
        user.user_id,
        request.status
    );

    state.validator.check(&*request)?;

    let updated = request_service::update(
        &*state.store,
        &state.notifications,
        &id,
        &user.user_id,
        &request,
    )
    .await;

    match updated {
        Ok(view) => Ok(HttpResponse::Ok().json(RequestResponse::from(&view))),
        Err(e) => {
            log::warn!("❌ Request {} update by {} failed: {}", id, user.user_id, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/requests/{id}",
    tag = "Requests",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 204, description = "Request deleted"),
        (
            status = 403,
            description = "Caller is not the requester, or request is no longer pending",
            body = ErrorResponse
        ),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_request(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🗑️  DELETE /requests/{} - user: {}", id, user.user_id);

    request_service::delete(&*state.store, &id, &user.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
