//! Pet listing records as stored in the `pets` collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a lowercase string enum with `Display`, `FromStr` and a default variant
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($name).to_lowercase(), other)),
                }
            }
        }
    };
}

string_enum!(
    /// Gender of the pet
    Gender { Male => "male", Female => "female" } default Male
);

string_enum!(
    /// Size class of the pet
    PetSize { Small => "small", Medium => "medium", Large => "large" } default Medium
);

string_enum!(
    /// Kind of animal
    PetType { Dog => "dog", Cat => "cat", Bird => "bird", Rabbit => "rabbit", Other => "other" } default Dog
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicalHistory {
    pub vaccinated: bool,
    pub sterilized: bool,
    pub health_issues: String,
}

/// The user-editable part of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PetDraft {
    pub name: String,
    pub breed: String,
    pub age: u32,
    pub gender: Gender,
    pub size: PetSize,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub description: String,
    pub medical_history: MedicalHistory,
    pub location: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub adoptable: bool,
}

impl Default for PetDraft {
    fn default() -> Self {
        PetDraft {
            name: String::new(),
            breed: String::new(),
            age: 0,
            gender: Gender::default(),
            size: PetSize::default(),
            pet_type: PetType::default(),
            description: String::new(),
            medical_history: MedicalHistory::default(),
            location: String::new(),
            contact_email: String::new(),
            contact_phone: String::new(),
            adoptable: true,
        }
    }
}

impl PetDraft {
    /// A fresh draft with the contact email prefilled from the signed-in user
    pub fn for_contact(email: impl Into<String>) -> Self {
        PetDraft {
            contact_email: email.into(),
            ..PetDraft::default()
        }
    }
}

/// A published listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(flatten)]
    pub info: PetDraft,
    #[serde(rename = "photoURLs", default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub seller_id: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Pet {
    /// First photo, used as the cover image
    pub fn cover_photo(&self) -> Option<&str> {
        self.photo_urls.first().map(String::as_str)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.seller_id == user_id
    }
}
