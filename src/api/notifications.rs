use actix_web::{web, HttpResponse};

use crate::api::AppState;
use crate::middleware::AuthUser;
use crate::models::{NotificationQuery, NotificationResponse, NotificationsAffected, UnreadCount};
use crate::services::notification_service;
use crate::utils::error::{AppError, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = [NotificationResponse]),
        (status = 400, description = "Limit out of range", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "🔔 GET /notifications - user: {}, unread_only: {}",
        user.user_id,
        query.unread_only
    );

    state.validator.check(&*query)?;
    let notifications = notification_service::list(&*state.store, &user.user_id, &query).await?;

    let response: Vec<NotificationResponse> =
        notifications.iter().map(NotificationResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    tag = "Notifications",
    responses(
        (status = 200, description = "Unread notifications", body = UnreadCount)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unread_count(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let count = notification_service::unread_count(&*state.store, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(count))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 403, description = "Not the caller's notification", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("📬 PUT /notifications/{}/read - user: {}", id, user.user_id);

    let notification = notification_service::mark_read(&*state.store, &user.user_id, &id).await?;
    Ok(HttpResponse::Ok().json(NotificationResponse::from(&notification)))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    responses(
        (status = 200, description = "Number marked read", body = NotificationsAffected)
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let affected = notification_service::mark_all_read(&*state.store, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(NotificationsAffected { affected }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    tag = "Notifications",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 403, description = "Not the caller's notification", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_notification(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🗑️  DELETE /notifications/{} - user: {}", id, user.user_id);

    notification_service::delete(&*state.store, &user.user_id, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/api/v1/notifications/read",
    tag = "Notifications",
    responses(
        (status = 200, description = "Number deleted", body = NotificationsAffected)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_read(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let affected = notification_service::delete_all_read(&*state.store, &user.user_id).await?;
    Ok(HttpResponse::Ok().json(NotificationsAffected { affected }))
}

#[cfg(test)]
mod tests {
    use crate::api::configure;
    use crate::api::tests::{bearer, signup, test_state};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_inbox_lifecycle() {
        let app =
            test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let (ana, ana_id) = signup!(&app, "ana@example.com", "Ana");
        let (bob, _) = signup!(&app, "bob@example.com", "Bob");

        let req = test::TestRequest::post()
            .uri("/api/v1/contacts")
            .insert_header(bearer(&ana))
            .set_json(json!({
                "email": "cy@corp.com",
                "first_name": "Cy",
                "last_name": "Young",
                "company": "Corp",
                "position": "VP"
            }))
            .to_request();
        let contact: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/requests")
            .insert_header(bearer(&bob))
            .set_json(json!({
                "approver_id": ana_id,
                "target_contact_id": contact["id"],
                "message": "hi"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/api/v1/notifications/unread-count")
            .insert_header(bearer(&ana))
            .to_request();
        let count: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(count, json!({ "count": 1, "has_unread": true }));

        let req = test::TestRequest::get()
            .uri("/api/v1/notifications?unread_only=true")
            .insert_header(bearer(&ana))
            .to_request();
        let inbox: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(inbox[0]["type"], "introduction_request");
        assert_eq!(inbox[0]["message"], "Bob Tester wants to be introduced to Cy Young");
        let id = inbox[0]["id"].as_str().unwrap().to_string();

        // Bob cannot touch Ana's notification.
        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/notifications/{}/read", id))
            .insert_header(bearer(&bob))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/notifications/{}/read", id))
            .insert_header(bearer(&ana))
            .to_request();
        let marked: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(marked["read"], true);

        let req = test::TestRequest::delete()
            .uri("/api/v1/notifications/read")
            .insert_header(bearer(&ana))
            .to_request();
        let removed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(removed["affected"], 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/notifications")
            .insert_header(bearer(&ana))
            .to_request();
        let inbox: Value = test::call_and_read_body_json(&app, req).await;
        assert!(inbox.as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_limit_out_of_range_is_400() {
        let app =
            test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let (token, _) = signup!(&app, "ana@example.com", "Ana");

        let req = test::TestRequest::get()
            .uri("/api/v1/notifications?limit=0")
            .insert_header(bearer(&token))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "validation failed: limit must be between 1 and 100");

        let req = test::TestRequest::put()
            .uri("/api/v1/notifications/read-all")
            .insert_header(bearer(&token))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["affected"], 0);
    }
}
