use serde::Serialize;

use crate::database::{ContactStore, RequestStore};
use crate::models::{IntroductionRequest, RequestStatus};
use crate::utils::error::AppError;

#[derive(Debug, Default, Serialize, PartialEq, utoipa::ToSchema)]
pub struct StatusBreakdown {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub declined: usize,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DashboardSummary {
    pub total_contacts: usize,
    pub requests_sent: StatusBreakdown,
    pub requests_received: StatusBreakdown,
}

impl StatusBreakdown {
    fn count(requests: &[IntroductionRequest]) -> Self {
        requests.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            match r.status {
                RequestStatus::Pending => acc.pending += 1,
                RequestStatus::Approved => acc.approved += 1,
                RequestStatus::Declined => acc.declined += 1,
            }
            acc
        })
    }
}

pub async fn summary<S: ContactStore + RequestStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<DashboardSummary, AppError> {
    let contacts = store.list_contacts(user_id).await?;
    let sent = store.list_requests_by_requester(user_id).await?;
    let received = store.list_requests_by_approver(user_id).await?;

    Ok(DashboardSummary {
        total_contacts: contacts.len(),
        requests_sent: StatusBreakdown::count(&sent),
        requests_received: StatusBreakdown::count(&received),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{Contact, CreateContactRequest, CreateIntroductionRequest};

    #[tokio::test]
    async fn test_summary_counts_by_status() {
        let store = MemoryStore::new();
        for email in ["a@y.com", "b@y.com"] {
            let contact = Contact::new(
                "me",
                &CreateContactRequest {
                    email: email.into(),
                    first_name: "A".into(),
                    last_name: "B".into(),
                    company: "C".into(),
                    position: "D".into(),
                    ..Default::default()
                },
            );
            store.create_contact(&contact).await.unwrap();
        }

        let make = |requester: &str, approver: &str, contact: &str, status| {
            let mut r = IntroductionRequest::new(
                requester,
                &CreateIntroductionRequest {
                    approver_id: approver.into(),
                    target_contact_id: contact.into(),
                    message: "hi".into(),
                },
            );
            r.status = status;
            r
        };
        store.create_request(&make("me", "x", "c1", RequestStatus::Pending)).await.unwrap();
        store.create_request(&make("me", "x", "c2", RequestStatus::Approved)).await.unwrap();
        store.create_request(&make("y", "me", "c3", RequestStatus::Declined)).await.unwrap();

        let summary = summary(&store, "me").await.unwrap();
        assert_eq!(summary.total_contacts, 2);
        assert_eq!(
            summary.requests_sent,
            StatusBreakdown { total: 2, pending: 1, approved: 1, declined: 0 }
        );
        assert_eq!(
            summary.requests_received,
            StatusBreakdown { total: 1, pending: 0, approved: 0, declined: 1 }
        );
    }
}
