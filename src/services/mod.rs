pub mod auth_service;
pub mod contact_service;
pub mod dashboard_service;
pub mod notification_service;
pub mod notifier;
pub mod request_service;
pub mod user_service;
