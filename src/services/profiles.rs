//! User profile documents under `users/{uid}`

use crate::model::error::StoreResult;
use crate::model::user::{AuthUser, ContactDetails, UserProfile};
use crate::services::document_store::{to_document, DocumentStore, WriteMode};
use chrono::Utc;
use serde_json::json;

pub const USERS: &str = "users";

/// Path of a user's favorites collection
pub fn favorites_collection(user_id: &str) -> String {
    format!("{}/{}/favorites", USERS, user_id)
}

/// Write the profile of a freshly signed-up (or re-signed-in) user.
///
/// With `merge` set, an existing profile keeps its other fields.
pub async fn create_profile(
    store: &dyn DocumentStore,
    user: &AuthUser,
    name: &str,
    merge: bool,
) -> StoreResult<()> {
    let profile = UserProfile {
        user_id: user.uid.clone(),
        name: name.to_string(),
        email: user.email.clone(),
        created_at: Some(Utc::now()),
        contact_details: ContactDetails::default(),
    };
    let mode = if merge { WriteMode::Merge } else { WriteMode::Replace };
    store
        .set(USERS, &user.uid, to_document(&profile)?, mode)
        .await
}

pub async fn get_profile(store: &dyn DocumentStore, user_id: &str) -> StoreResult<Option<UserProfile>> {
    match store.get(USERS, user_id).await? {
        Some(snapshot) => Ok(Some(snapshot.to_record()?)),
        None => Ok(None),
    }
}

/// Change the editable fields of a profile
pub async fn update_profile(
    store: &dyn DocumentStore,
    user_id: &str,
    name: &str,
    contact_details: &ContactDetails,
) -> StoreResult<()> {
    let fields = json!({
        "name": name,
        "contactDetails": contact_details,
    });
    store.update(USERS, user_id, to_document(&fields)?).await
}
