use crate::model::pet::Pet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized copy of a pet kept under `users/{uid}/favorites/{petId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub pet_name: String,
    #[serde(default)]
    pub pet_image: String,
    #[serde(default)]
    pub pet_breed: String,
    #[serde(default)]
    pub pet_age: u32,
    #[serde(default)]
    pub pet_gender: String,
    #[serde(default)]
    pub pet_location: String,
    /// Missing timestamps read as "now", which sorts them first
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl Favorite {
    pub fn from_pet(pet: &Pet, added_at: DateTime<Utc>) -> Self {
        Favorite {
            id: pet.id.clone(),
            pet_name: pet.info.name.clone(),
            pet_image: pet.cover_photo().unwrap_or_default().to_string(),
            pet_breed: pet.info.breed.clone(),
            pet_age: pet.info.age,
            pet_gender: pet.info.gender.to_string(),
            pet_location: pet.info.location.clone(),
            added_at,
        }
    }
}
