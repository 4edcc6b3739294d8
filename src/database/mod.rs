pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{Contact, IntroductionRequest, Notification, User};

pub use memory::MemoryStore;
pub use mongo::MongoDB;

/// Failures raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("{0}")]
    Duplicate(String),
    #[error("storage failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate` when the email is already registered.
    async fn create_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, user: &User) -> StoreResult<bool>;
    async fn delete_user(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Fails with `Duplicate` when the owner already has a contact with this email.
    async fn create_contact(&self, contact: &Contact) -> StoreResult<()>;
    async fn find_contact(&self, id: &str) -> StoreResult<Option<Contact>>;
    async fn find_owned_contact(&self, id: &str, owner_id: &str) -> StoreResult<Option<Contact>>;
    async fn list_contacts(&self, owner_id: &str) -> StoreResult<Vec<Contact>>;
    async fn contact_email_exists(&self, owner_id: &str, email: &str) -> StoreResult<bool>;
    /// Owner's contacts matching `query`, ordered by first then last name.
    async fn search_contacts(&self, owner_id: &str, query: &str) -> StoreResult<Vec<Contact>>;
    /// Contacts of every other user that have a company and match `query`.
    async fn search_other_contacts(
        &self,
        owner_id: &str,
        query: &str,
    ) -> StoreResult<Vec<Contact>>;
    async fn update_contact(&self, contact: &Contact) -> StoreResult<bool>;
    async fn delete_contact(&self, id: &str, owner_id: &str) -> StoreResult<bool>;
    async fn delete_contacts_by_owner(&self, owner_id: &str) -> StoreResult<u64>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Fails with `Duplicate` when (requester, target contact) already exists.
    async fn create_request(&self, request: &IntroductionRequest) -> StoreResult<()>;
    async fn find_request(&self, id: &str) -> StoreResult<Option<IntroductionRequest>>;
    async fn request_exists(&self, requester_id: &str, contact_id: &str) -> StoreResult<bool>;
    /// Newest first.
    async fn list_requests_by_requester(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<IntroductionRequest>>;
    /// Newest first.
    async fn list_requests_by_approver(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<IntroductionRequest>>;
    async fn update_request(&self, request: &IntroductionRequest) -> StoreResult<bool>;
    async fn delete_request(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, notification: &Notification) -> StoreResult<()>;
    async fn find_notification(&self, id: &str) -> StoreResult<Option<Notification>>;
    /// Newest first, one page.
    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Notification>>;
    async fn count_unread_notifications(&self, user_id: &str) -> StoreResult<u64>;
    async fn mark_notification_read(&self, id: &str) -> StoreResult<bool>;
    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64>;
    async fn delete_notification(&self, id: &str) -> StoreResult<bool>;
    async fn delete_read_notifications(&self, user_id: &str) -> StoreResult<u64>;
    async fn delete_notifications_for_user(&self, user_id: &str) -> StoreResult<u64>;
    async fn delete_notifications_for_request(&self, request_id: &str) -> StoreResult<u64>;
}

pub trait Store: UserStore + ContactStore + RequestStore + NotificationStore {}

impl<T: UserStore + ContactStore + RequestStore + NotificationStore> Store for T {}

/// Opens the backend selected by `url`: `memory://` or a MongoDB URI.
pub async fn connect(url: &str) -> StoreResult<Arc<dyn Store>> {
    if url.starts_with("memory://") {
        log::warn!("⚠️  Using in-memory store, data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db = MongoDB::new(url).await?;
    Ok(Arc::new(db))
}
