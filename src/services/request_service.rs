use crate::database::{ContactStore, Store, StoreError, UserStore};
use crate::jobs::notification_worker::{NotificationKind, NotificationQueue};
use crate::models::{
    CreateIntroductionRequest, IntroductionRequest, Notification, RequestDetails, RequestKind,
    RequestStatus, RequestView, UpdateIntroductionRequest,
};
use crate::services::notification_service;
use crate::utils::error::AppError;
use crate::utils::time::now_millis;

fn request_not_found() -> AppError {
    AppError::NotFound("request not found".to_string())
}

/// Loads whichever of requester, approver and target contact still exist.
pub async fn load<S: UserStore + ContactStore + ?Sized>(
    store: &S,
    request: &IntroductionRequest,
) -> Result<RequestView, StoreError> {
    Ok(RequestView {
        request: request.clone(),
        requester: store.find_user_by_id(&request.requester_id).await?,
        approver: store.find_user_by_id(&request.approver_id).await?,
        contact: store.find_contact(&request.target_contact_id).await?,
    })
}

/// Used after a write: a failed lookup still yields the stored request.
async fn load_after_write<S: UserStore + ContactStore + ?Sized>(
    store: &S,
    request: IntroductionRequest,
) -> RequestView {
    match load(store, &request).await {
        Ok(view) => view,
        Err(e) => {
            log::warn!("⚠️  Request {} saved but lookups failed: {}", request.id, e);
            RequestView {
                request,
                requester: None,
                approver: None,
                contact: None,
            }
        }
    }
}

/// Loads requester, approver and target contact; `None` when any is gone.
pub async fn resolve<S: UserStore + ContactStore + ?Sized>(
    store: &S,
    request: &IntroductionRequest,
) -> Result<Option<RequestDetails>, StoreError> {
    Ok(load(store, request).await?.details())
}

pub async fn create<S: Store + ?Sized>(
    store: &S,
    notifications: &NotificationQueue,
    requester_id: &str,
    input: &CreateIntroductionRequest,
) -> Result<RequestView, AppError> {
    let request = IntroductionRequest::new(requester_id, input);

    let contact = store
        .find_contact(&request.target_contact_id)
        .await?
        .ok_or_else(|| AppError::NotFound("contact not found".to_string()))?;

    if contact.user_id != request.approver_id {
        return Err(AppError::InvalidArgument(
            "target contact does not belong to specified approver".to_string(),
        ));
    }

    if store.request_exists(requester_id, &contact.id).await? {
        return Err(AppError::Conflict(
            "a request for this contact already exists".to_string(),
        ));
    }

    store.create_request(&request).await?;
    log::info!(
        "🤝 Request {} created: {} -> contact {}",
        request.id,
        requester_id,
        contact.id
    );

    notifications.enqueue(NotificationKind::NewRequest, &request);

    let view = load_after_write(store, request).await;
    if let Some(details) = view.details() {
        notification_service::record(store, &Notification::new_request(&details)).await;
    }
    Ok(view)
}

/// Visible only to requester and approver; anyone else gets `NotFound`.
pub async fn get<S: Store + ?Sized>(
    store: &S,
    id: &str,
    caller_id: &str,
) -> Result<RequestView, AppError> {
    let request = store
        .find_request(id)
        .await?
        .filter(|r| r.involves(caller_id))
        .ok_or_else(request_not_found)?;

    Ok(load(store, &request).await?)
}

/// Newest first. Requests whose people or contact are gone are skipped.
pub async fn list<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    kind: RequestKind,
) -> Result<Vec<RequestView>, AppError> {
    let requests = match kind {
        RequestKind::Sent => store.list_requests_by_requester(user_id).await?,
        RequestKind::Received => store.list_requests_by_approver(user_id).await?,
    };

    let mut resolved = Vec::with_capacity(requests.len());
    for request in &requests {
        let view = load(store, request).await?;
        if view.is_complete() {
            resolved.push(view);
        } else {
            log::warn!("⚠️  Skipping request {} with missing references", request.id);
        }
    }
    Ok(resolved)
}

/// Approver-only. The status is set as given, whatever it was before.
/// Once stored, the change is answered even if referenced records are gone.
pub async fn update<S: Store + ?Sized>(
    store: &S,
    notifications: &NotificationQueue,
    id: &str,
    caller_id: &str,
    input: &UpdateIntroductionRequest,
) -> Result<RequestView, AppError> {
    let mut request = store.find_request(id).await?.ok_or_else(request_not_found)?;

    if request.approver_id != caller_id {
        return Err(AppError::Forbidden(
            "only the approver can update this request".to_string(),
        ));
    }

    request.status = input.status;
    request.response_message = input.response_message.clone();
    request.updated_at = now_millis();

    if !store.update_request(&request).await? {
        return Err(request_not_found());
    }
    log::info!("📝 Request {} set to {}", request.id, request.status);

    match request.status {
        RequestStatus::Approved => notifications.enqueue(NotificationKind::Approved, &request),
        RequestStatus::Declined => notifications.enqueue(NotificationKind::Declined, &request),
        RequestStatus::Pending => {}
    }

    let view = load_after_write(store, request).await;
    if let Some(notice) = view.details().as_ref().and_then(Notification::decision) {
        notification_service::record(store, &notice).await;
    }
    Ok(view)
}

/// Requester-only, and only while the request is still pending.
/// In-app notifications about the request go with it.
pub async fn delete<S: Store + ?Sized>(
    store: &S,
    id: &str,
    caller_id: &str,
) -> Result<(), AppError> {
    let request = store.find_request(id).await?.ok_or_else(request_not_found)?;

    if request.requester_id != caller_id {
        return Err(AppError::Forbidden(
            "only the requester can delete this request".to_string(),
        ));
    }
    if request.status != RequestStatus::Pending {
        return Err(AppError::Forbidden(
            "only pending requests can be deleted".to_string(),
        ));
    }

    if !store.delete_request(id).await? {
        return Err(request_not_found());
    }
    let removed = store.delete_notifications_for_request(id).await?;
    log::info!("🗑️  Request {} deleted with {} notifications", id, removed);
    Ok(())
}
