use crate::database::NotificationStore;
use crate::models::{Notification, NotificationQuery, UnreadCount};
use crate::utils::error::AppError;

fn notification_not_found() -> AppError {
    AppError::NotFound("notification not found".to_string())
}

/// Loads the notification and checks it belongs to `user_id`.
async fn owned<S: NotificationStore + ?Sized>(
    store: &S,
    user_id: &str,
    id: &str,
    action: &str,
) -> Result<Notification, AppError> {
    let notification = store
        .find_notification(id)
        .await?
        .ok_or_else(notification_not_found)?;

    if notification.user_id != user_id {
        return Err(AppError::Forbidden(format!(
            "you do not have permission to {} this notification",
            action
        )));
    }
    Ok(notification)
}

/// Stores an in-app notification. Failures are logged, never surfaced.
pub async fn record<S: NotificationStore + ?Sized>(store: &S, notification: &Notification) {
    match store.create_notification(notification).await {
        Ok(()) => log::debug!(
            "🔔 Notification {:?} stored for {}",
            notification.kind,
            notification.user_id
        ),
        Err(e) => log::warn!(
            "⚠️  Failed to store {:?} notification for {}: {}",
            notification.kind,
            notification.user_id,
            e
        ),
    }
}

pub async fn list<S: NotificationStore + ?Sized>(
    store: &S,
    user_id: &str,
    query: &NotificationQuery,
) -> Result<Vec<Notification>, AppError> {
    Ok(store
        .list_notifications(user_id, query.unread_only, query.offset, query.limit)
        .await?)
}

pub async fn unread_count<S: NotificationStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<UnreadCount, AppError> {
    let count = store.count_unread_notifications(user_id).await?;
    Ok(UnreadCount {
        count,
        has_unread: count > 0,
    })
}

pub async fn mark_read<S: NotificationStore + ?Sized>(
    store: &S,
    user_id: &str,
    id: &str,
) -> Result<Notification, AppError> {
    let mut notification = owned(store, user_id, id, "update").await?;

    if !store.mark_notification_read(id).await? {
        return Err(notification_not_found());
    }
    notification.read = true;
    Ok(notification)
}

pub async fn mark_all_read<S: NotificationStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<u64, AppError> {
    let updated = store.mark_all_notifications_read(user_id).await?;
    log::info!("📭 {} notifications marked read for {}", updated, user_id);
    Ok(updated)
}

pub async fn delete<S: NotificationStore + ?Sized>(
    store: &S,
    user_id: &str,
    id: &str,
) -> Result<(), AppError> {
    owned(store, user_id, id, "delete").await?;

    if !store.delete_notification(id).await? {
        return Err(notification_not_found());
    }
    Ok(())
}

pub async fn delete_all_read<S: NotificationStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<u64, AppError> {
    let removed = store.delete_read_notifications(user_id).await?;
    log::info!("🗑️  {} read notifications deleted for {}", removed, user_id);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::services::notifier::tests::sample_details;

    fn query(unread_only: bool) -> NotificationQuery {
        NotificationQuery {
            limit: 50,
            offset: 0,
            unread_only,
        }
    }

    async fn seeded() -> (MemoryStore, Notification) {
        let store = MemoryStore::new();
        let notification = Notification::new_request(&sample_details());
        record(&store, &notification).await;
        (store, notification)
    }

    #[tokio::test]
    async fn test_mark_read_updates_count() {
        let (store, n) = seeded().await;
        assert_eq!(
            unread_count(&store, &n.user_id).await.unwrap(),
            UnreadCount {
                count: 1,
                has_unread: true
            }
        );

        let marked = mark_read(&store, &n.user_id, &n.id).await.unwrap();
        assert!(marked.read);
        assert!(!unread_count(&store, &n.user_id).await.unwrap().has_unread);
        assert!(list(&store, &n.user_id, &query(true)).await.unwrap().is_empty());
        assert_eq!(list(&store, &n.user_id, &query(false)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_users_are_forbidden() {
        let (store, n) = seeded().await;

        let err = mark_read(&store, "someone-else", &n.id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "you do not have permission to update this notification"
        );
        let err = delete(&store, "someone-else", &n.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = mark_read(&store, &n.user_id, "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_all_read_keeps_unread() {
        let (store, n) = seeded().await;
        let unread = Notification::new_request(&sample_details());
        let unread = Notification {
            user_id: n.user_id.clone(),
            ..unread
        };
        record(&store, &unread).await;

        mark_read(&store, &n.user_id, &n.id).await.unwrap();
        assert_eq!(delete_all_read(&store, &n.user_id).await.unwrap(), 1);

        let left = list(&store, &n.user_id, &query(false)).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, unread.id);

        assert_eq!(mark_all_read(&store, &n.user_id).await.unwrap(), 1);
        delete(&store, &n.user_id, &unread.id).await.unwrap();
        assert_eq!(unread_count(&store, &n.user_id).await.unwrap().count, 0);
    }
}
