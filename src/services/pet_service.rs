//! Listing, favorites and account operations of the marketplace

use crate::model::error::{PetError, PetResult};
use crate::model::favorite::Favorite;
use crate::model::file_handle::FileHandle;
use crate::model::pet::{Pet, PetDraft};
use crate::model::sorting::{sort_pets, SortOption};
use crate::model::user::{AuthUser, ContactDetails, UserProfile};
use crate::services::batch_upload::BatchUploader;
use crate::services::document_store::{to_document, DocumentStore, WriteMode};
use crate::services::profiles::{self, favorites_collection, USERS};
use crate::services::session::Session;
use crate::services::storage::ProgressCallback;
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::{json, Value};
use std::sync::Arc;

pub const PETS: &str = "pets";

/// Photos allowed per listing
pub const MAX_PHOTOS: usize = 5;

/// Pets shown on the front page
pub const FEATURED_COUNT: usize = 6;

pub struct PetService {
    store: Arc<dyn DocumentStore>,
    uploads: BatchUploader,
}

impl PetService {
    pub fn new(store: Arc<dyn DocumentStore>, uploads: BatchUploader) -> Self {
        PetService { store, uploads }
    }

    fn check_photo_count(count: usize) -> PetResult {
        if count > MAX_PHOTOS {
            return Err(PetError::Validation("Maximum 5 images allowed".into()));
        }
        if count == 0 {
            return Err(PetError::Validation(
                "Please upload at least one image of your pet".into(),
            ));
        }
        Ok(())
    }

    /// Upload the photos and create the listing.
    ///
    /// Nothing is written if any upload fails.
    pub async fn publish_pet(
        &self,
        user: Option<&AuthUser>,
        draft: PetDraft,
        photos: &[FileHandle],
        on_progress: Option<ProgressCallback>,
    ) -> PetResult<Pet> {
        let user = user.ok_or_else(|| {
            PetError::Validation("You must be signed in to publish a pet".into())
        })?;
        Self::check_photo_count(photos.len())?;

        let photo_urls = self.uploads.upload_many(photos, &user.uid, on_progress).await?;
        let mut pet = Pet {
            id: String::new(),
            info: draft,
            photo_urls,
            seller_id: user.uid.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        pet.id = self.store.add(PETS, to_document(&pet)?).await?;
        tracing::info!("Published pet {} for {}", pet.id, user.uid);
        Ok(pet)
    }

    pub async fn get_pet(&self, pet_id: &str) -> PetResult<Pet> {
        let snapshot = self
            .store
            .get(PETS, pet_id)
            .await?
            .ok_or_else(|| PetError::NotFound("Pet".into()))?;
        Ok(snapshot.to_record()?)
    }

    /// Profile of the user who listed `pet`
    pub async fn seller_profile(&self, pet: &Pet) -> PetResult<Option<UserProfile>> {
        Ok(profiles::get_profile(self.store.as_ref(), &pet.seller_id).await?)
    }

    async fn pets_where(&self, field: &str, value: &Value) -> PetResult<Vec<Pet>> {
        let mut pets = self
            .store
            .query_eq(PETS, field, value)
            .await?
            .iter()
            .map(|snapshot| snapshot.to_record())
            .collect::<Result<Vec<Pet>, _>>()?;
        sort_pets(&mut pets, SortOption::Newest);
        Ok(pets)
    }

    /// Pets open for adoption, newest first
    pub async fn list_adoptable(&self) -> PetResult<Vec<Pet>> {
        self.pets_where("adoptable", &Value::Bool(true)).await
    }

    /// The `limit` newest adoptable pets
    pub async fn featured_pets(&self, limit: usize) -> PetResult<Vec<Pet>> {
        let mut pets = self.list_adoptable().await?;
        pets.truncate(limit);
        Ok(pets)
    }

    pub async fn user_pets(&self, user_id: &str) -> PetResult<Vec<Pet>> {
        self.pets_where("sellerId", &json!(user_id)).await
    }

    async fn owned_pet(&self, pet_id: &str, user_id: &str, action: &str) -> PetResult<Pet> {
        let pet = self.get_pet(pet_id).await?;
        if !pet.is_owned_by(user_id) {
            tracing::warn!("{} tried to {} pet {} owned by {}", user_id, action, pet_id, pet.seller_id);
            return Err(PetError::PermissionDenied(format!(
                "You don't have permission to {} this pet",
                action
            )));
        }
        Ok(pet)
    }

    /// Replace the listing details of an owned pet; photos and seller are kept
    pub async fn update_pet(&self, pet_id: &str, draft: &PetDraft, user_id: &str) -> PetResult<Pet> {
        self.owned_pet(pet_id, user_id, "update").await?;
        let mut fields = to_document(draft)?;
        fields.insert("updatedAt".to_string(), json!(Utc::now()));
        self.store.update(PETS, pet_id, fields).await?;
        self.get_pet(pet_id).await
    }

    /// Delete an owned pet and drop it from the owner's favorites
    pub async fn delete_pet(&self, pet_id: &str, user_id: &str) -> PetResult {
        self.owned_pet(pet_id, user_id, "delete").await?;
        self.store.delete(PETS, pet_id).await?;
        if let Err(e) = self.remove_favorite(user_id, pet_id).await {
            tracing::warn!("Pet {} deleted but favorite cleanup failed: {}", pet_id, e);
        }
        tracing::info!("Deleted pet {}", pet_id);
        Ok(())
    }

    pub async fn add_favorite(&self, user_id: &str, pet: &Pet) -> PetResult {
        let favorite = Favorite::from_pet(pet, Utc::now());
        self.store
            .set(
                &favorites_collection(user_id),
                &pet.id,
                to_document(&favorite)?,
                WriteMode::Replace,
            )
            .await?;
        Ok(())
    }

    pub async fn remove_favorite(&self, user_id: &str, pet_id: &str) -> PetResult {
        self.store
            .delete(&favorites_collection(user_id), pet_id)
            .await?;
        Ok(())
    }

    /// Read failures count as "not a favorite"
    pub async fn is_favorite(&self, user_id: &str, pet_id: &str) -> bool {
        match self.store.get(&favorites_collection(user_id), pet_id).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!("Failed to check favorite {} for {}: {}", pet_id, user_id, e);
                false
            }
        }
    }

    /// Favorites of a user, most recently added first
    pub async fn favorites(&self, user_id: &str) -> PetResult<Vec<Favorite>> {
        let mut favorites = self
            .store
            .list(&favorites_collection(user_id))
            .await?
            .iter()
            .map(|snapshot| snapshot.to_record())
            .collect::<Result<Vec<Favorite>, _>>()?;
        favorites.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(favorites)
    }

    pub async fn favorite_ids(&self, user_id: &str) -> PetResult<Vec<String>> {
        Ok(self
            .store
            .list(&favorites_collection(user_id))
            .await?
            .into_iter()
            .map(|snapshot| snapshot.id)
            .collect())
    }

    /// Flip the favorite state of `pet`, returning whether it is now a favorite
    pub async fn toggle_favorite(&self, user_id: &str, pet: &Pet) -> PetResult<bool> {
        if self.is_favorite(user_id, &pet.id).await {
            self.remove_favorite(user_id, &pet.id).await?;
            Ok(false)
        } else {
            self.add_favorite(user_id, pet).await?;
            Ok(true)
        }
    }

    pub async fn create_profile(&self, user: &AuthUser, name: &str, merge: bool) -> PetResult {
        Ok(profiles::create_profile(self.store.as_ref(), user, name, merge).await?)
    }

    pub async fn profile(&self, user_id: &str) -> PetResult<UserProfile> {
        profiles::get_profile(self.store.as_ref(), user_id)
            .await?
            .ok_or_else(|| PetError::NotFound("Profile".into()))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        name: &str,
        contact_details: &ContactDetails,
    ) -> PetResult {
        Ok(profiles::update_profile(self.store.as_ref(), user_id, name, contact_details).await?)
    }

    /// Remove the signed-in user's listings, favorites, profile and identity.
    ///
    /// The password is checked first so a stale session cannot wipe an account.
    pub async fn delete_account(&self, session: &Session, password: &str) -> PetResult {
        let user = session.reauthenticate(password).await?;
        let uid = user.uid.as_str();

        let pets = self.user_pets(uid).await?;
        try_join_all(pets.iter().map(|pet| self.store.delete(PETS, &pet.id))).await?;

        let favorites = favorites_collection(uid);
        let favorite_ids = self.favorite_ids(uid).await?;
        try_join_all(favorite_ids.iter().map(|id| self.store.delete(&favorites, id))).await?;

        self.store.delete(USERS, uid).await?;
        session.delete_identity().await?;
        tracing::info!("Deleted account {} with {} pet(s)", uid, pets.len());
        Ok(())
    }
}
