use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

use super::{ContactStore, NotificationStore, RequestStore, StoreError, StoreResult, UserStore};
use crate::models::{Contact, IntroductionRequest, Notification, User};

const USERS: &str = "users";
const CONTACTS: &str = "contacts";
const REQUESTS: &str = "introduction_requests";
const NOTIFICATIONS: &str = "notifications";

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY
    )
}

/// Maps a unique-index violation to `Duplicate` with the given message.
fn on_duplicate(err: mongodb::error::Error, message: &str) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate(message.to_string())
    } else {
        err.into()
    }
}

/// Escapes regex metacharacters so user input is matched literally.
fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}/".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn name_or_company(query: &str) -> Document {
    let pattern = escape_regex(query.trim());
    doc! {
        "$or": [
            { "first_name": { "$regex": &pattern, "$options": "i" } },
            { "last_name": { "$regex": &pattern, "$options": "i" } },
            { "company": { "$regex": &pattern, "$options": "i" } },
        ]
    }
}

impl MongoDB {
    pub async fn new(uri: &str) -> StoreResult<Self> {
        let mut client_options = ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Database name comes from the URI path
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("introhub");

        let db = client.database(db_name);

        db.list_collection_names().await?;
        log::info!("✅ MongoDB connected: {}", db_name);

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Unique indexes back the duplicate rules; the rest serve listings.
    async fn ensure_indexes(&self) -> StoreResult<()> {
        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        let indexes: Vec<(&str, Document, bool)> = vec![
            (USERS, doc! { "email": 1 }, true),
            (CONTACTS, doc! { "user_id": 1, "email": 1 }, true),
            (CONTACTS, doc! { "user_id": 1, "first_name": 1, "last_name": 1 }, false),
            (REQUESTS, doc! { "requester_id": 1, "target_contact_id": 1 }, true),
            (REQUESTS, doc! { "requester_id": 1, "created_at": -1 }, false),
            (REQUESTS, doc! { "approver_id": 1, "created_at": -1 }, false),
            (NOTIFICATIONS, doc! { "user_id": 1, "created_at": -1 }, false),
            (NOTIFICATIONS, doc! { "user_id": 1, "read": 1 }, false),
            (NOTIFICATIONS, doc! { "related_request_id": 1 }, false),
        ];

        for (collection, keys, is_unique) in indexes {
            let label = format!("{}({:?})", collection, keys.keys().collect::<Vec<_>>());
            let mut model = IndexModel::builder().keys(keys).build();
            if is_unique {
                model.options = Some(unique());
            }

            // Unique indexes are mandatory.
            match self.collection::<Document>(collection).create_index(model).await {
                Ok(_) => log::info!("   ✅ Index ready: {}", label),
                Err(e) if is_unique => {
                    log::error!("   ❌ Unique index failed: {} - {}", label, e);
                    return Err(e.into());
                }
                Err(e) => log::debug!("   ℹ️  Index skipped: {} - {}", label, e),
            }
        }

        log::info!("✅ Database indexes ready");
        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    fn users(&self) -> Collection<User> {
        self.collection(USERS)
    }

    fn contacts(&self) -> Collection<Contact> {
        self.collection(CONTACTS)
    }

    fn requests(&self) -> Collection<IntroductionRequest> {
        self.collection(REQUESTS)
    }

    fn notifications(&self) -> Collection<Notification> {
        self.collection(NOTIFICATIONS)
    }

    async fn find_contacts(&self, filter: Document) -> StoreResult<Vec<Contact>> {
        let cursor = self
            .contacts()
            .find(filter)
            .sort(doc! { "first_name": 1, "last_name": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_requests(&self, filter: Document) -> StoreResult<Vec<IntroductionRequest>> {
        let cursor = self
            .requests()
            .find(filter)
            .sort(doc! { "created_at": -1, "_id": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl UserStore for MongoDB {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        self.users()
            .insert_one(user)
            .await
            .map_err(|e| on_duplicate(e, "email already registered"))?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let result = self
            .users()
            .replace_one(doc! { "_id": &user.id }, user)
            .await
            .map_err(|e| on_duplicate(e, "email already registered"))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_user(&self, id: &str) -> StoreResult<bool> {
        let result = self.users().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl ContactStore for MongoDB {
    async fn create_contact(&self, contact: &Contact) -> StoreResult<()> {
        self.contacts()
            .insert_one(contact)
            .await
            .map_err(|e| on_duplicate(e, "email already exists for one of your contacts"))?;
        Ok(())
    }

    async fn find_contact(&self, id: &str) -> StoreResult<Option<Contact>> {
        Ok(self.contacts().find_one(doc! { "_id": id }).await?)
    }

    async fn find_owned_contact(&self, id: &str, owner_id: &str) -> StoreResult<Option<Contact>> {
        Ok(self
            .contacts()
            .find_one(doc! { "_id": id, "user_id": owner_id })
            .await?)
    }

    async fn list_contacts(&self, owner_id: &str) -> StoreResult<Vec<Contact>> {
        self.find_contacts(doc! { "user_id": owner_id }).await
    }

    async fn contact_email_exists(&self, owner_id: &str, email: &str) -> StoreResult<bool> {
        let count = self
            .contacts()
            .count_documents(doc! { "user_id": owner_id, "email": email })
            .await?;
        Ok(count > 0)
    }

    async fn search_contacts(&self, owner_id: &str, query: &str) -> StoreResult<Vec<Contact>> {
        let mut filter = name_or_company(query);
        filter.insert("user_id", owner_id);
        self.find_contacts(filter).await
    }

    async fn search_other_contacts(
        &self,
        owner_id: &str,
        query: &str,
    ) -> StoreResult<Vec<Contact>> {
        let filter = doc! {
            "$and": [
                { "user_id": { "$ne": owner_id } },
                { "company": { "$regex": "\\S" } },
                name_or_company(query),
            ]
        };
        self.find_contacts(filter).await
    }

    async fn update_contact(&self, contact: &Contact) -> StoreResult<bool> {
        let result = self
            .contacts()
            .replace_one(doc! { "_id": &contact.id, "user_id": &contact.user_id }, contact)
            .await
            .map_err(|e| on_duplicate(e, "email already exists for one of your contacts"))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_contact(&self, id: &str, owner_id: &str) -> StoreResult<bool> {
        let result = self
            .contacts()
            .delete_one(doc! { "_id": id, "user_id": owner_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_contacts_by_owner(&self, owner_id: &str) -> StoreResult<u64> {
        let result = self
            .contacts()
            .delete_many(doc! { "user_id": owner_id })
            .await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl RequestStore for MongoDB {
    async fn create_request(&self, request: &IntroductionRequest) -> StoreResult<()> {
        self.requests()
            .insert_one(request)
            .await
            .map_err(|e| on_duplicate(e, "a request for this contact already exists"))?;
        Ok(())
    }

    async fn find_request(&self, id: &str) -> StoreResult<Option<IntroductionRequest>> {
        Ok(self.requests().find_one(doc! { "_id": id }).await?)
    }

    async fn request_exists(&self, requester_id: &str, contact_id: &str) -> StoreResult<bool> {
        let count = self
            .requests()
            .count_documents(doc! {
                "requester_id": requester_id,
                "target_contact_id": contact_id,
            })
            .await?;
        Ok(count > 0)
    }

    async fn list_requests_by_requester(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<IntroductionRequest>> {
        self.find_requests(doc! { "requester_id": user_id }).await
    }

    async fn list_requests_by_approver(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<IntroductionRequest>> {
        self.find_requests(doc! { "approver_id": user_id }).await
    }

    async fn update_request(&self, request: &IntroductionRequest) -> StoreResult<bool> {
        let result = self
            .requests()
            .replace_one(doc! { "_id": &request.id }, request)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_request(&self, id: &str) -> StoreResult<bool> {
        let result = self.requests().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl NotificationStore for MongoDB {
    async fn create_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.notifications().insert_one(notification).await?;
        Ok(())
    }

    async fn find_notification(&self, id: &str) -> StoreResult<Option<Notification>> {
        Ok(self.notifications().find_one(doc! { "_id": id }).await?)
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Notification>> {
        let mut filter = doc! { "user_id": user_id };
        if unread_only {
            filter.insert("read", false);
        }
        let cursor = self
            .notifications()
            .find(filter)
            .sort(doc! { "created_at": -1, "_id": -1 })
            .skip(offset)
            .limit(limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_unread_notifications(&self, user_id: &str) -> StoreResult<u64> {
        Ok(self
            .notifications()
            .count_documents(doc! { "user_id": user_id, "read": false })
            .await?)
    }

    async fn mark_notification_read(&self, id: &str) -> StoreResult<bool> {
        let result = self
            .notifications()
            .update_one(doc! { "_id": id }, doc! { "$set": { "read": true } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64> {
        let result = self
            .notifications()
            .update_many(
                doc! { "user_id": user_id, "read": false },
                doc! { "$set": { "read": true } },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_notification(&self, id: &str) -> StoreResult<bool> {
        let result = self.notifications().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_read_notifications(&self, user_id: &str) -> StoreResult<u64> {
        let result = self
            .notifications()
            .delete_many(doc! { "user_id": user_id, "read": true })
            .await?;
        Ok(result.deleted_count)
    }

    async fn delete_notifications_for_user(&self, user_id: &str) -> StoreResult<u64> {
        let result = self
            .notifications()
            .delete_many(doc! { "user_id": user_id })
            .await?;
        Ok(result.deleted_count)
    }

    async fn delete_notifications_for_request(&self, request_id: &str) -> StoreResult<u64> {
        let result = self
            .notifications()
            .delete_many(doc! { "related_request_id": request_id })
            .await?;
        Ok(result.deleted_count)
    }
}
