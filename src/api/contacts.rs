use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::api::AppState;
use crate::middleware::AuthUser;
use crate::models::{
    BatchImportRequest, BatchImportResponse, ContactResponse, CreateContactRequest,
    UpdateContactRequest,
};
use crate::services::{contact_service, user_service};
use crate::utils::error::{AppError, ErrorResponse};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactQuery {
    /// Case-insensitive match on first name, last name or company.
    pub query: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/contacts",
    tag = "Contacts",
    params(ContactQuery),
    responses(
        (status = 200, description = "Own contacts, optionally filtered", body = [ContactResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_contacts(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<ContactQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!("📇 GET /contacts - user: {}, query: {:?}", user.user_id, query.query);

    let owner = user_service::get_profile(&*state.store, &user.user_id).await?;
    let contacts = contact_service::list(&*state.store, &owner.id, query.query.as_deref()).await?;

    let response: Vec<ContactResponse> = contacts.iter().map(|c| c.to_response(&owner)).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/contacts",
    tag = "Contacts",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Contact created", body = ContactResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already used by another contact", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_contact(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<CreateContactRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("➕ POST /contacts - user: {}, email: {}", user.user_id, request.email);

    state.validator.check(&*request)?;
    let owner = user_service::get_profile(&*state.store, &user.user_id).await?;
    let contact = contact_service::create(&*state.store, &owner.id, &request).await?;

    Ok(HttpResponse::Created().json(contact.to_response(&owner)))
}

#[utoipa::path(
    get,
    path = "/api/v1/contacts/{id}",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact id")),
    responses(
        (status = 200, description = "Contact", body = ContactResponse),
        (status = 404, description = "Not found or not yours", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_contact(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("📇 GET /contacts/{} - user: {}", id, user.user_id);

    let owner = user_service::get_profile(&*state.store, &user.user_id).await?;
    let contact = contact_service::get(&*state.store, &owner.id, &id).await?;

    Ok(HttpResponse::Ok().json(contact.to_response(&owner)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/contacts/{id}",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact id")),
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = ContactResponse),
        (status = 404, description = "Not found or not yours", body = ErrorResponse),
        (status = 409, description = "Email already used by another contact", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_contact(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    request: web::Json<UpdateContactRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("✏️  PATCH /contacts/{} - user: {}", id, user.user_id);

    state.validator.check(&*request)?;
    let owner = user_service::get_profile(&*state.store, &user.user_id).await?;
    let contact = contact_service::update(&*state.store, &owner.id, &id, &request).await?;

    Ok(HttpResponse::Ok().json(contact.to_response(&owner)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/contacts/{id}",
    tag = "Contacts",
    params(("id" = String, Path, description = "Contact id")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 404, description = "Not found or not yours", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_contact(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🗑️  DELETE /contacts/{} - user: {}", id, user.user_id);

    contact_service::delete(&*state.store, &user.user_id, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/contacts/batch-import",
    tag = "Contacts",
    request_body = BatchImportRequest,
    responses(
        (status = 200, description = "Per-item import report", body = BatchImportResponse),
        (status = 400, description = "Empty batch", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn batch_import(
    state: web::Data<AppState>,
    user: AuthUser,
    request: web::Json<BatchImportRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "📥 POST /contacts/batch-import - user: {}, items: {}",
        user.user_id,
        request.contacts.len()
    );

    state.validator.check(&*request)?;
    let result = contact_service::batch_import(
        &*state.store,
        &state.validator,
        &user.user_id,
        &request.contacts,
    )
    .await;

    Ok(HttpResponse::Ok().json(result))
}
