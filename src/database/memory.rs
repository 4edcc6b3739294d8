use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ContactStore, NotificationStore, RequestStore, StoreError, StoreResult, UserStore};
use crate::models::{Contact, IntroductionRequest, Notification, User};

/// Process-local store with the same uniqueness rules as the MongoDB indexes.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    contacts: RwLock<HashMap<String, Contact>>,
    requests: RwLock<Vec<IntroductionRequest>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_name(a: &Contact, b: &Contact) -> std::cmp::Ordering {
    a.first_name
        .cmp(&b.first_name)
        .then_with(|| a.last_name.cmp(&b.last_name))
}

/// Newest first; equal timestamps keep the latest insert on top.
fn newest_first<T>(rows: impl Iterator<Item = (usize, T)>, created_at: fn(&T) -> i64) -> Vec<T> {
    let mut rows: Vec<_> = rows.collect();
    rows.sort_by(|(ia, a), (ib, b)| {
        created_at(b)
            .cmp(&created_at(a))
            .then_with(|| ib.cmp(ia))
    });
    rows.into_iter().map(|(_, r)| r).collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email already registered".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: &str) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn create_contact(&self, contact: &Contact) -> StoreResult<()> {
        let mut contacts = self.contacts.write().await;
        if contacts
            .values()
            .any(|c| c.user_id == contact.user_id && c.email == contact.email)
        {
            return Err(StoreError::Duplicate(
                "email already exists for one of your contacts".to_string(),
            ));
        }
        contacts.insert(contact.id.clone(), contact.clone());
        Ok(())
    }

    async fn find_contact(&self, id: &str) -> StoreResult<Option<Contact>> {
        Ok(self.contacts.read().await.get(id).cloned())
    }

    async fn find_owned_contact(&self, id: &str, owner_id: &str) -> StoreResult<Option<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(contacts.get(id).filter(|c| c.user_id == owner_id).cloned())
    }

    async fn list_contacts(&self, owner_id: &str) -> StoreResult<Vec<Contact>> {
        let contacts = self.contacts.read().await;
        let mut owned: Vec<Contact> = contacts
            .values()
            .filter(|c| c.user_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(by_name);
        Ok(owned)
    }

    async fn contact_email_exists(&self, owner_id: &str, email: &str) -> StoreResult<bool> {
        let contacts = self.contacts.read().await;
        Ok(contacts
            .values()
            .any(|c| c.user_id == owner_id && c.email == email))
    }

    async fn search_contacts(&self, owner_id: &str, query: &str) -> StoreResult<Vec<Contact>> {
        let contacts = self.contacts.read().await;
        let mut found: Vec<Contact> = contacts
            .values()
            .filter(|c| c.user_id == owner_id && c.matches(query))
            .cloned()
            .collect();
        found.sort_by(by_name);
        Ok(found)
    }

    async fn search_other_contacts(
        &self,
        owner_id: &str,
        query: &str,
    ) -> StoreResult<Vec<Contact>> {
        let contacts = self.contacts.read().await;
        let mut found: Vec<Contact> = contacts
            .values()
            .filter(|c| {
                c.user_id != owner_id && !c.company.trim().is_empty() && c.matches(query)
            })
            .cloned()
            .collect();
        found.sort_by(by_name);
        Ok(found)
    }

    async fn update_contact(&self, contact: &Contact) -> StoreResult<bool> {
        let mut contacts = self.contacts.write().await;
        if contacts.values().any(|c| {
            c.id != contact.id && c.user_id == contact.user_id && c.email == contact.email
        }) {
            return Err(StoreError::Duplicate(
                "email already exists for one of your contacts".to_string(),
            ));
        }
        match contacts.get_mut(&contact.id) {
            Some(stored) if stored.user_id == contact.user_id => {
                *stored = contact.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_contact(&self, id: &str, owner_id: &str) -> StoreResult<bool> {
        let mut contacts = self.contacts.write().await;
        if contacts.get(id).is_some_and(|c| c.user_id == owner_id) {
            contacts.remove(id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete_contacts_by_owner(&self, owner_id: &str) -> StoreResult<u64> {
        let mut contacts = self.contacts.write().await;
        let before = contacts.len();
        contacts.retain(|_, c| c.user_id != owner_id);
        Ok((before - contacts.len()) as u64)
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create_request(&self, request: &IntroductionRequest) -> StoreResult<()> {
        let mut requests = self.requests.write().await;
        if requests.iter().any(|r| {
            r.requester_id == request.requester_id
                && r.target_contact_id == request.target_contact_id
        }) {
            return Err(StoreError::Duplicate(
                "a request for this contact already exists".to_string(),
            ));
        }
        requests.push(request.clone());
        Ok(())
    }

    async fn find_request(&self, id: &str) -> StoreResult<Option<IntroductionRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|r| r.id == id).cloned())
    }

    async fn request_exists(&self, requester_id: &str, contact_id: &str) -> StoreResult<bool> {
        let requests = self.requests.read().await;
        Ok(requests
            .iter()
            .any(|r| r.requester_id == requester_id && r.target_contact_id == contact_id))
    }

    async fn list_requests_by_requester(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<IntroductionRequest>> {
        let requests = self.requests.read().await;
        Ok(newest_first(
            requests
                .iter()
                .cloned()
                .enumerate()
                .filter(|(_, r)| r.requester_id == user_id),
            |r| r.created_at,
        ))
    }

    async fn list_requests_by_approver(
        &self,
        user_id: &str,
    ) -> StoreResult<Vec<IntroductionRequest>> {
        let requests = self.requests.read().await;
        Ok(newest_first(
            requests
                .iter()
                .cloned()
                .enumerate()
                .filter(|(_, r)| r.approver_id == user_id),
            |r| r.created_at,
        ))
    }

    async fn update_request(&self, request: &IntroductionRequest) -> StoreResult<bool> {
        let mut requests = self.requests.write().await;
        match requests.iter_mut().find(|r| r.id == request.id) {
            Some(stored) => {
                *stored = request.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_request(&self, id: &str) -> StoreResult<bool> {
        let mut requests = self.requests.write().await;
        let before = requests.len();
        requests.retain(|r| r.id != id);
        Ok(requests.len() != before)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }

    async fn find_notification(&self, id: &str) -> StoreResult<Option<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        let sorted = newest_first(
            notifications
                .iter()
                .cloned()
                .enumerate()
                .filter(|(_, n)| n.user_id == user_id && !(unread_only && n.read)),
            |n| n.created_at,
        );
        Ok(sorted
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_unread_notifications(&self, user_id: &str) -> StoreResult<u64> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as u64)
    }

    async fn mark_notification_read(&self, id: &str) -> StoreResult<bool> {
        let mut notifications = self.notifications.write().await;
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(stored) => {
                stored.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64> {
        let mut notifications = self.notifications.write().await;
        let mut updated = 0;
        for n in notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            n.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_notification(&self, id: &str) -> StoreResult<bool> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.id != id);
        Ok(notifications.len() != before)
    }

    async fn delete_read_notifications(&self, user_id: &str) -> StoreResult<u64> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| !(n.user_id == user_id && n.read));
        Ok((before - notifications.len()) as u64)
    }

    async fn delete_notifications_for_user(&self, user_id: &str) -> StoreResult<u64> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.user_id != user_id);
        Ok((before - notifications.len()) as u64)
    }

    async fn delete_notifications_for_request(&self, request_id: &str) -> StoreResult<u64> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.related_request_id.as_deref() != Some(request_id));
        Ok((before - notifications.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateContactRequest, CreateIntroductionRequest, SignupRequest};

    fn user(email: &str) -> User {
        User::new(
            &SignupRequest {
                email: email.into(),
                password: String::new(),
                password_confirm: String::new(),
                first_name: "First".into(),
                last_name: "Last".into(),
                company: String::new(),
                position: String::new(),
            },
            "hash".into(),
        )
    }

    fn contact(owner: &str, email: &str, first: &str, company: &str) -> Contact {
        Contact::new(
            owner,
            &CreateContactRequest {
                email: email.into(),
                first_name: first.into(),
                last_name: "Doe".into(),
                company: company.into(),
                position: "Eng".into(),
                ..Default::default()
            },
        )
    }

    fn request(requester: &str, contact: &str, created_at: i64) -> IntroductionRequest {
        let mut r = IntroductionRequest::new(
            requester,
            &CreateIntroductionRequest {
                approver_id: "approver".into(),
                target_contact_id: contact.into(),
                message: "hi".into(),
            },
        );
        r.created_at = created_at;
        r
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let store = MemoryStore::new();
        store.create_user(&user("a@b.co")).await.unwrap();
        let err = store.create_user(&user("a@b.co")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(store.find_user_by_email("a@b.co").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_contact_email_unique_per_owner_only() {
        let store = MemoryStore::new();
        store.create_contact(&contact("u1", "x@y.com", "X", "Acme")).await.unwrap();
        store.create_contact(&contact("u2", "x@y.com", "X", "Acme")).await.unwrap();
        let err = store
            .create_contact(&contact("u1", "X@Y.com", "X", "Acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let store = MemoryStore::new();
        let c = contact("u1", "x@y.com", "X", "Acme");
        store.create_contact(&c).await.unwrap();

        assert!(store.find_owned_contact(&c.id, "u2").await.unwrap().is_none());
        assert!(!store.delete_contact(&c.id, "u2").await.unwrap());
        assert!(store.delete_contact(&c.id, "u1").await.unwrap());
        assert!(store.find_contact(&c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_other_contacts_requires_company() {
        let store = MemoryStore::new();
        store.create_contact(&contact("u1", "a@y.com", "Zed", "Acme")).await.unwrap();
        store.create_contact(&contact("u2", "b@y.com", "Amy", "Acme")).await.unwrap();
        store.create_contact(&contact("u2", "c@y.com", "Abe", "  ")).await.unwrap();

        let found = store.search_other_contacts("u3", "").await.unwrap();
        let names: Vec<_> = found.iter().map(|c| c.first_name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Zed"]);

        let found = store.search_other_contacts("u1", "acme").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Amy");
    }

    #[tokio::test]
    async fn test_requests_newest_first_and_unique() {
        let store = MemoryStore::new();
        store.create_request(&request("r1", "c1", 10)).await.unwrap();
        store.create_request(&request("r1", "c2", 30)).await.unwrap();
        store.create_request(&request("r1", "c3", 30)).await.unwrap();

        let listed = store.list_requests_by_requester("r1").await.unwrap();
        let contacts: Vec<_> = listed.iter().map(|r| r.target_contact_id.as_str()).collect();
        assert_eq!(contacts, vec!["c3", "c2", "c1"]);

        let err = store.create_request(&request("r1", "c1", 40)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(store.request_exists("r1", "c1").await.unwrap());
        assert_eq!(store.list_requests_by_approver("approver").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_notifications_page_and_read_state() {
        let store = MemoryStore::new();
        let details = crate::services::notifier::tests::sample_details();
        let owner = details.approver.id.clone();
        for created_at in [10, 20, 30] {
            let mut n = Notification::new_request(&details);
            n.created_at = created_at;
            store.create_notification(&n).await.unwrap();
        }

        let page = store.list_notifications(&owner, false, 1, 5).await.unwrap();
        let stamps: Vec<_> = page.iter().map(|n| n.created_at).collect();
        assert_eq!(stamps, vec![20, 10]);

        assert!(store.mark_notification_read(&page[0].id).await.unwrap());
        assert_eq!(store.count_unread_notifications(&owner).await.unwrap(), 2);
        assert_eq!(store.list_notifications(&owner, true, 0, 50).await.unwrap().len(), 2);

        assert_eq!(store.mark_all_notifications_read(&owner).await.unwrap(), 2);
        assert_eq!(store.delete_read_notifications(&owner).await.unwrap(), 3);
        assert!(store.list_notifications(&owner, false, 0, 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notifications_cascade_by_request() {
        let store = MemoryStore::new();
        let details = crate::services::notifier::tests::sample_details();
        store.create_notification(&Notification::new_request(&details)).await.unwrap();

        let removed = store
            .delete_notifications_for_request(&details.request.id)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.delete_notifications_for_user(&details.approver.id).await.unwrap(), 0);
    }
}
