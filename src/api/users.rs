use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::api::AppState;
use crate::middleware::AuthUser;
use crate::models::ContactResponse;
use crate::services::contact_service;
use crate::utils::error::{AppError, ErrorResponse};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// Contacts of other users (with a company) matching the query.
#[utoipa::path(
    get,
    path = "/api/v1/users/all",
    tag = "Search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching contacts and owners", body = [ContactResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_all_contacts(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔎 GET /users/all - user: {}, query: {}", user.user_id, query.query);

    let contacts = contact_service::search_all(&*state.store, &user.user_id, &query.query).await?;
    let response = contact_service::with_owners(&*state.store, &contacts).await?;

    Ok(HttpResponse::Ok().json(response))
}
