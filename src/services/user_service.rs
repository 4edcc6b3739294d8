use crate::database::{ContactStore, NotificationStore, UserStore};
use crate::models::{UpdateProfileRequest, User};
use crate::utils::error::AppError;
use crate::utils::time::now_millis;

fn user_not_found() -> AppError {
    AppError::NotFound("user not found".to_string())
}

pub async fn get_profile<S: UserStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<User, AppError> {
    store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(user_not_found)
}

/// Blank names keep the stored value; the other fields are replaced as sent.
pub async fn update_profile<S: UserStore + ?Sized>(
    store: &S,
    user_id: &str,
    request: &UpdateProfileRequest,
) -> Result<User, AppError> {
    let mut user = get_profile(store, user_id).await?;

    if !request.first_name.trim().is_empty() {
        user.first_name = request.first_name.trim().to_string();
    }
    if !request.last_name.trim().is_empty() {
        user.last_name = request.last_name.trim().to_string();
    }
    user.company = request.company.clone();
    user.position = request.position.clone();
    user.bio = request.bio.clone();
    user.profile_picture = request.profile_picture.clone();
    user.updated_at = now_millis();

    if !store.update_user(&user).await? {
        return Err(user_not_found());
    }
    Ok(user)
}

/// Removes the account with every contact and notification it owns.
pub async fn delete_account<S: UserStore + ContactStore + NotificationStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<(), AppError> {
    if !store.delete_user(user_id).await? {
        return Err(user_not_found());
    }
    let contacts = store.delete_contacts_by_owner(user_id).await?;
    let notifications = store.delete_notifications_for_user(user_id).await?;
    log::info!(
        "🗑️  Account {} deleted with {} contacts and {} notifications",
        user_id,
        contacts,
        notifications
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{Contact, CreateContactRequest, Notification, SignupRequest};
    use crate::services::notifier::tests::sample_details;

    async fn seeded() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let mut user = User::new(
            &SignupRequest {
                email: "ana@example.com".into(),
                password: String::new(),
                password_confirm: String::new(),
                first_name: "Ana".into(),
                last_name: "Silva".into(),
                company: "Acme".into(),
                position: "CTO".into(),
            },
            "hash".into(),
        );
        user.bio = "hello".into();
        store.create_user(&user).await.unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_update_keeps_blank_names_and_replaces_the_rest() {
        let (store, user) = seeded().await;

        let updated = update_profile(
            &store,
            &user.id,
            &UpdateProfileRequest {
                first_name: "  ".into(),
                last_name: "Souza".into(),
                company: String::new(),
                position: "CEO".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.first_name, "Ana");
        assert_eq!(updated.last_name, "Souza");
        assert_eq!(updated.company, "");
        assert_eq!(updated.position, "CEO");
        assert_eq!(updated.bio, "");

        let stored = get_profile(&store, &user.id).await.unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_delete_account_removes_contacts_and_notifications() {
        let (store, user) = seeded().await;
        let contact = Contact::new(
            &user.id,
            &CreateContactRequest {
                email: "x@y.com".into(),
                first_name: "X".into(),
                last_name: "Y".into(),
                company: "Z".into(),
                position: "W".into(),
                ..Default::default()
            },
        );
        store.create_contact(&contact).await.unwrap();
        let mut notice = Notification::new_request(&sample_details());
        notice.user_id = user.id.clone();
        store.create_notification(&notice).await.unwrap();

        delete_account(&store, &user.id).await.unwrap();

        assert!(matches!(get_profile(&store, &user.id).await, Err(AppError::NotFound(_))));
        assert!(store.list_contacts(&user.id).await.unwrap().is_empty());
        assert_eq!(store.count_unread_notifications(&user.id).await.unwrap(), 0);
        assert!(matches!(delete_account(&store, &user.id).await, Err(AppError::NotFound(_))));
    }
}
