pub mod auth;
pub mod contacts;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod profile;
pub mod requests;
pub mod swagger;
pub mod users;

use actix_web::{error, web, HttpRequest};
use std::sync::Arc;

use crate::database::Store;
use crate::jobs::notification_worker::NotificationQueue;
use crate::middleware::AuthMiddleware;
use crate::services::auth_service::AuthSettings;
use crate::utils::error::AppError;
use crate::utils::validation::Validator;

/// Shared by every handler through `web::Data<AppState>`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthSettings,
    pub validator: Validator,
    pub notifications: NotificationQueue,
}

fn json_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("⚠️  {} {} bad body: {}", req.method(), req.path(), err);
    AppError::InvalidArgument("Invalid request body".to_string()).into()
}

fn query_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("⚠️  {} {} bad query: {}", req.method(), req.path(), err);
    AppError::InvalidArgument("Invalid query parameters".to_string()).into()
}

fn path_error(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("⚠️  {} {} bad path: {}", req.method(), req.path(), err);
    AppError::InvalidArgument("Invalid path parameters".to_string()).into()
}

/// Registers every route; shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Auth endpoints (public)
        .service(
            web::scope("/api/v1/auth")
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .route("/verify", web::get().to(auth::verify_token)),
        )
        // Everything else requires a bearer token
        .service(
            web::scope("/api/v1")
                .wrap(AuthMiddleware)
                .service(
                    web::resource("/profile")
                        .route(web::get().to(profile::get_profile))
                        .route(web::put().to(profile::update_profile))
                        .route(web::delete().to(profile::delete_account)),
                )
                .service(
                    web::resource("/contacts")
                        .route(web::get().to(contacts::list_contacts))
                        .route(web::post().to(contacts::create_contact)),
                )
                // Must stay ahead of /contacts/{id}
                .route("/contacts/batch-import", web::post().to(contacts::batch_import))
                .route("/contacts/bulk_upload", web::post().to(contacts::batch_import))
                .service(
                    web::resource("/contacts/{id}")
                        .route(web::get().to(contacts::get_contact))
                        .route(web::patch().to(contacts::update_contact))
                        .route(web::delete().to(contacts::delete_contact)),
                )
                .route("/users/all", web::get().to(users::search_all_contacts))
                .service(
                    web::resource("/requests")
                        .route(web::get().to(requests::list_requests))
                        .route(web::post().to(requests::create_request)),
                )
                .service(
                    web::resource("/requests/{id}")
                        .route(web::get().to(requests::get_request))
                        .route(web::put().to(requests::update_request))
                        .route(web::delete().to(requests::delete_request)),
                )
                .route("/notifications", web::get().to(notifications::list_notifications))
                // Fixed paths ahead of /notifications/{id}
                .route(
                    "/notifications/unread-count",
                    web::get().to(notifications::unread_count),
                )
                .route("/notifications/read-all", web::put().to(notifications::mark_all_read))
                .route("/notifications/read", web::delete().to(notifications::delete_read))
                .route("/notifications/{id}/read", web::put().to(notifications::mark_read))
                .route(
                    "/notifications/{id}",
                    web::delete().to(notifications::delete_notification),
                )
                .route("/dashboard/summary", web::get().to(dashboard::get_summary)),
        );
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use crate::database::MemoryStore;
    use crate::services::auth_service::test_settings;

    pub(crate) fn test_state() -> web::Data<AppState> {
        let (notifications, _receiver) = NotificationQueue::channel(64);
        web::Data::new(AppState {
            store: Arc::new(MemoryStore::new()),
            auth: test_settings(),
            validator: Validator::default(),
            notifications,
        })
    }

    /// Registers a user through the API and returns (token, user id).
    macro_rules! signup {
        ($app:expr, $email:expr, $first:expr) => {{
            let req = actix_web::test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(serde_json::json!({
                    "email": $email,
                    "password": "secret1",
                    "password_confirm": "secret1",
                    "first_name": $first,
                    "last_name": "Tester",
                    "company": "Acme",
                    "position": "Eng"
                }))
                .to_request();
            let res = actix_web::test::call_service($app, req).await;
            assert_eq!(res.status(), actix_web::http::StatusCode::CREATED);
            let body: serde_json::Value = actix_web::test::read_body_json(res).await;
            (
                body["token"].as_str().unwrap().to_string(),
                body["user"]["id"].as_str().unwrap().to_string(),
            )
        }};
    }
    pub(crate) use signup;

    pub(crate) fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }

    #[actix_web::test]
    async fn test_health_is_public() {
        let app =
            test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_protected_routes_require_token() {
        let app =
            test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let protected = [
            "/api/v1/profile",
            "/api/v1/contacts",
            "/api/v1/requests",
            "/api/v1/users/all",
            "/api/v1/notifications",
        ];
        for uri in protected {
            let req = test::TestRequest::get().uri(uri).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_malformed_json_is_400() {
        let app =
            test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({ "error": "Invalid request body" }));
    }

    /// A registers, adds contact C; B registers and asks A for an intro to C;
    /// A approves; B can no longer delete the request.
    #[actix_web::test]
    async fn test_introduction_flow() {
        let app =
            test::init_service(App::new().app_data(test_state()).configure(configure)).await;
        let (token_a, id_a) = signup!(&app, "a@example.com", "Ann");
        let (token_b, id_b) = signup!(&app, "b@example.com", "Ben");

        let req = test::TestRequest::post()
            .uri("/api/v1/contacts")
            .insert_header(bearer(&token_a))
            .set_json(json!({
                "email": "x@y.com",
                "first_name": "Cy",
                "last_name": "Young",
                "company": "Corp",
                "position": "VP"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let contact: Value = test::read_body_json(res).await;
        let contact_id = contact["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/requests")
            .insert_header(bearer(&token_b))
            .set_json(json!({
                "approver_id": id_a,
                "target_contact_id": contact_id,
                "message": "Would love to meet Cy"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(res).await;
        assert_eq!(created["status"], "pending");
        assert_eq!(created["requester"]["id"], id_b.as_str());
        assert_eq!(created["target_contact"]["user"]["id"], id_a.as_str());
        let request_uri = format!("/api/v1/requests/{}", created["id"].as_str().unwrap());

        let req = test::TestRequest::put()
            .uri(&request_uri)
            .insert_header(bearer(&token_b))
            .set_json(json!({ "status": "approved" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&request_uri)
            .insert_header(bearer(&token_a))
            .set_json(json!({ "status": "approved", "response_message": "Sure" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let updated: Value = test::read_body_json(res).await;
        assert_eq!(updated["status"], "approved");

        let req = test::TestRequest::delete()
            .uri(&request_uri)
            .insert_header(bearer(&token_b))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "only pending requests can be deleted");

        let req = test::TestRequest::get()
            .uri("/api/v1/requests?type=sent")
            .insert_header(bearer(&token_b))
            .to_request();
        let sent: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(sent.as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/requests")
            .insert_header(bearer(&token_b))
            .to_request();
        let received: Value = test::call_and_read_body_json(&app, req).await;
        assert!(received.as_array().unwrap().is_empty());
    }
}
