use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Intro-Hub API",
        version = "1.0.0",
        description = "Contacts and introduction requests between users.\n\n\
            **Authentication:** every endpoint except register, login, verify and health \
            requires a JWT Bearer token."
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::verify_token,

        // Profile
        crate::api::profile::get_profile,
        crate::api::profile::update_profile,
        crate::api::profile::delete_account,

        // Contacts
        crate::api::contacts::list_contacts,
        crate::api::contacts::create_contact,
        crate::api::contacts::get_contact,
        crate::api::contacts::update_contact,
        crate::api::contacts::delete_contact,
        crate::api::contacts::batch_import,
        crate::api::users::search_all_contacts,

        // Requests
        crate::api::requests::list_requests,
        crate::api::requests::create_request,
        crate::api::requests::get_request,
        crate::api::requests::update_request,
        crate::api::requests::delete_request,

        // Notifications
        crate::api::notifications::list_notifications,
        crate::api::notifications::unread_count,
        crate::api::notifications::mark_read,
        crate::api::notifications::mark_all_read,
        crate::api::notifications::delete_notification,
        crate::api::notifications::delete_read,

        // Dashboard & Health
        crate::api::dashboard::get_summary,
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::utils::error::ErrorResponse,
            crate::models::SignupRequest,
            crate::models::LoginRequest,
            crate::models::UpdateProfileRequest,
            crate::models::UserResponse,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::VerifyTokenResponse,
            crate::models::CreateContactRequest,
            crate::models::UpdateContactRequest,
            crate::models::BatchImportRequest,
            crate::models::BatchImportResponse,
            crate::models::BatchImportError,
            crate::models::ContactResponse,
            crate::models::RequestStatus,
            crate::models::RequestKind,
            crate::models::CreateIntroductionRequest,
            crate::models::UpdateIntroductionRequest,
            crate::models::RequestResponse,
            crate::models::NotificationType,
            crate::models::NotificationMetadata,
            crate::models::NotificationResponse,
            crate::models::UnreadCount,
            crate::models::NotificationsAffected,
            crate::services::dashboard_service::DashboardSummary,
            crate::services::dashboard_service::StatusBreakdown,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and token verification."),
        (name = "Profile", description = "The caller's own account."),
        (name = "Contacts", description = "Personal contact lists, owner-scoped."),
        (name = "Search", description = "Search across other users' contacts."),
        (name = "Requests", description = "Introduction requests between requester and approver."),
        (name = "Notifications", description = "In-app notices about introduction requests."),
        (name = "Dashboard", description = "Per-user counters."),
        (name = "Health", description = "Liveness."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
