use actix_web::{web, HttpResponse};

use crate::api::AppState;
use crate::middleware::AuthUser;
use crate::services::dashboard_service::{self, DashboardSummary};
use crate::utils::error::{AppError, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Contact and request counters", body = DashboardSummary),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_summary(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    log::info!("📊 GET /dashboard/summary - user: {}", user.user_id);

    let summary = dashboard_service::summary(&*state.store, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[cfg(test)]
mod tests {
    use crate::api::configure;
    use crate::api::tests::{bearer, signup, test_state};
    use actix_web::{test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_empty_summary() {
        let app = test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let (token, _) = signup!(&app, "ana@example.com", "Ana");

        let req = test::TestRequest::get()
            .uri("/api/v1/dashboard/summary")
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_contacts"], 0);
        assert_eq!(body["requests_sent"]["total"], 0);
        assert_eq!(body["requests_received"]["pending"], 0);
    }
}
