use std::collections::HashMap;

use crate::database::{ContactStore, UserStore};
use crate::models::{
    normalize_email, BatchImportError, BatchImportResponse, Contact, ContactResponse,
    CreateContactRequest, UpdateContactRequest, User,
};
use crate::utils::error::AppError;
use crate::utils::time::now_millis;
use crate::utils::validation::{Report, Validate, Validator};

const DUPLICATE_EMAIL: &str = "email already exists for one of your contacts";

fn contact_not_found() -> AppError {
    AppError::NotFound("contact not found".to_string())
}

pub async fn create<S: ContactStore + ?Sized>(
    store: &S,
    owner_id: &str,
    request: &CreateContactRequest,
) -> Result<Contact, AppError> {
    let contact = Contact::new(owner_id, request);

    if store.contact_email_exists(owner_id, &contact.email).await? {
        return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
    }
    store.create_contact(&contact).await?;

    Ok(contact)
}

pub async fn get<S: ContactStore + ?Sized>(
    store: &S,
    owner_id: &str,
    id: &str,
) -> Result<Contact, AppError> {
    store
        .find_owned_contact(id, owner_id)
        .await?
        .ok_or_else(contact_not_found)
}

/// All of the owner's contacts, or only those matching a non-blank query.
pub async fn list<S: ContactStore + ?Sized>(
    store: &S,
    owner_id: &str,
    query: Option<&str>,
) -> Result<Vec<Contact>, AppError> {
    let contacts = match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => store.search_contacts(owner_id, q).await?,
        None => store.list_contacts(owner_id).await?,
    };
    Ok(contacts)
}

/// Searches the contacts of every other user that list a company.
pub async fn search_all<S: ContactStore + ?Sized>(
    store: &S,
    owner_id: &str,
    query: &str,
) -> Result<Vec<Contact>, AppError> {
    Ok(store.search_other_contacts(owner_id, query.trim()).await?)
}

pub async fn update<S: ContactStore + ?Sized>(
    store: &S,
    owner_id: &str,
    id: &str,
    request: &UpdateContactRequest,
) -> Result<Contact, AppError> {
    let mut contact = get(store, owner_id, id).await?;

    if !request.email.trim().is_empty() {
        let email = normalize_email(&request.email);
        if email != contact.email {
            if store.contact_email_exists(owner_id, &email).await? {
                return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
            }
            contact.email = email;
        }
    }
    if !request.first_name.trim().is_empty() {
        contact.first_name = request.first_name.trim().to_string();
    }
    if !request.last_name.trim().is_empty() {
        contact.last_name = request.last_name.trim().to_string();
    }
    contact.company = request.company.clone();
    contact.position = request.position.clone();
    contact.notes = request.notes.clone();
    contact.phone = request.phone.clone();
    contact.linkedin_url = request.linkedin_url.clone();
    contact.updated_at = now_millis();

    if !store.update_contact(&contact).await? {
        return Err(contact_not_found());
    }
    Ok(contact)
}

pub async fn delete<S: ContactStore + ?Sized>(
    store: &S,
    owner_id: &str,
    id: &str,
) -> Result<(), AppError> {
    if !store.delete_contact(id, owner_id).await? {
        return Err(contact_not_found());
    }
    Ok(())
}

/// Imports every item independently; failures are reported, never fatal.
pub async fn batch_import<S: ContactStore + ?Sized>(
    store: &S,
    rules: &Validator,
    owner_id: &str,
    items: &[CreateContactRequest],
) -> BatchImportResponse {
    let mut response = BatchImportResponse::default();

    for item in items {
        let mut report = Report::default();
        item.validate(rules, &mut report);

        let errors = if !report.is_empty() {
            report.messages().to_vec()
        } else {
            match create(store, owner_id, item).await {
                Ok(_) => {
                    response.success_count += 1;
                    continue;
                }
                Err(e) => vec![e.public_message()],
            }
        };

        response.error_count += 1;
        response.errors.push(BatchImportError {
            data: item.clone(),
            errors,
        });
    }

    log::info!(
        "📥 Batch import for {}: {} imported, {} failed",
        owner_id,
        response.success_count,
        response.error_count
    );
    response
}

/// Attaches each contact's owner, skipping contacts whose owner is gone.
pub async fn with_owners<S: UserStore + ?Sized>(
    store: &S,
    contacts: &[Contact],
) -> Result<Vec<ContactResponse>, AppError> {
    let mut owners: HashMap<String, Option<User>> = HashMap::new();
    let mut responses = Vec::with_capacity(contacts.len());

    for contact in contacts {
        if !owners.contains_key(&contact.user_id) {
            let owner = store.find_user_by_id(&contact.user_id).await?;
            owners.insert(contact.user_id.clone(), owner);
        }
        match owners.get(&contact.user_id) {
            Some(Some(owner)) => responses.push(contact.to_response(owner)),
            _ => log::warn!("⚠️  Skipping contact {} without owner", contact.id),
        }
    }

    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn item(email: &str, first: &str) -> CreateContactRequest {
        CreateContactRequest {
            email: email.into(),
            first_name: first.into(),
            last_name: "Doe".into(),
            company: "Acme".into(),
            position: "Eng".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_case_insensitive() {
        let store = MemoryStore::new();
        create(&store, "u1", &item("x@y.com", "X")).await.unwrap();

        let err = create(&store, "u1", &item("X@Y.COM", "X")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == DUPLICATE_EMAIL));

        // other owners are unaffected
        create(&store, "u2", &item("x@y.com", "X")).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_rules() {
        let store = MemoryStore::new();
        let contact = create(&store, "u1", &item("a@y.com", "Ann")).await.unwrap();
        create(&store, "u1", &item("b@y.com", "Bob")).await.unwrap();

        let err = update(
            &store,
            "u1",
            &contact.id,
            &UpdateContactRequest {
                email: "B@y.com".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let updated = update(
            &store,
            "u1",
            &contact.id,
            &UpdateContactRequest {
                email: "a@y.com".into(),
                first_name: " ".into(),
                notes: "met at conf".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.first_name, "Ann");
        assert_eq!(updated.company, "");
        assert_eq!(updated.position, "");
        assert_eq!(updated.notes, "met at conf");

        let err = update(&store, "u2", &contact.id, &UpdateContactRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let store = MemoryStore::new();
        let contact = create(&store, "u1", &item("a@y.com", "Ann")).await.unwrap();

        assert!(matches!(delete(&store, "u2", &contact.id).await, Err(AppError::NotFound(_))));
        delete(&store, "u1", &contact.id).await.unwrap();
        assert!(matches!(delete(&store, "u1", &contact.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_with_and_without_query() {
        let store = MemoryStore::new();
        create(&store, "u1", &item("a@y.com", "Ann")).await.unwrap();
        create(&store, "u1", &item("b@y.com", "Bob")).await.unwrap();

        assert_eq!(list(&store, "u1", None).await.unwrap().len(), 2);
        assert_eq!(list(&store, "u1", Some("  ")).await.unwrap().len(), 2);
        let found = list(&store, "u1", Some("bo")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Bob");
    }

    #[tokio::test]
    async fn test_batch_import_reports_partial_success() {
        let store = MemoryStore::new();
        create(&store, "u1", &item("dup@y.com", "Old")).await.unwrap();

        let items = vec![
            item("one@y.com", "One"),
            item("DUP@y.com", "Two"),
            item("three@y.com", "Three"),
        ];
        let result = batch_import(&store, &Validator::default(), "u1", &items).await;

        assert_eq!(result.success_count, 2);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.errors[0].data, items[1]);
        assert_eq!(result.errors[0].errors, vec![DUPLICATE_EMAIL.to_string()]);
    }

    #[tokio::test]
    async fn test_batch_import_validates_each_item() {
        let store = MemoryStore::new();
        let mut invalid = item("", "");
        invalid.position = String::new();

        let result = batch_import(
            &store,
            &Validator::default(),
            "u1",
            &[invalid, item("ok@y.com", "Ok")],
        )
        .await;

        assert_eq!(result.success_count, 1);
        assert_eq!(
            result.errors[0].errors,
            vec![
                "email is required".to_string(),
                "first_name is required".to_string(),
                "position is required".to_string(),
            ]
        );
    }
}
