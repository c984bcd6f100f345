//! Filtering types and utilities for pet listings

use crate::model::pet::{Gender, Pet, PetSize, PetType};
use crate::model::sorting::{sort_pets, SortOption};

/// Trait for items that can be matched by a free-text search
pub trait Filterable {
    /// Text fields the search query is matched against
    fn searchable_fields(&self) -> Vec<&str>;
}

impl Filterable for Pet {
    fn searchable_fields(&self) -> Vec<&str> {
        vec![
            self.info.name.as_str(),
            self.info.breed.as_str(),
            self.info.description.as_str(),
            self.info.location.as_str(),
        ]
    }
}

/// Filter items by a search query (case-insensitive partial match on any field)
pub fn filter_items<'a, T: Filterable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    if query.is_empty() {
        return items.iter().collect();
    }
    let query_lower = query.to_lowercase();
    items
        .iter()
        .filter(|item| {
            item.searchable_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&query_lower))
        })
        .collect()
}

/// Listing filters; `None` fields do not filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetFilter {
    pub search: String,
    pub pet_type: Option<PetType>,
    pub gender: Option<Gender>,
    pub size: Option<PetSize>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
}

impl PetFilter {
    pub fn is_empty(&self) -> bool {
        *self == PetFilter::default()
    }

    /// Whether a pet passes every attribute filter (the search term is not checked here)
    pub fn matches_attributes(&self, pet: &Pet) -> bool {
        self.pet_type.map_or(true, |t| pet.info.pet_type == t)
            && self.gender.map_or(true, |g| pet.info.gender == g)
            && self.size.map_or(true, |s| pet.info.size == s)
            && self.min_age.map_or(true, |min| pet.info.age >= min)
            && self.max_age.map_or(true, |max| pet.info.age <= max)
    }
}

/// Filters plus ordering applied to a listing page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub filter: PetFilter,
    pub sort: SortOption,
    /// Keep at most this many pets after ordering
    pub limit: Option<usize>,
}

impl ListingQuery {
    /// Apply the search, attribute filters and ordering to a set of pets
    pub fn apply(&self, pets: &[Pet]) -> Vec<Pet> {
        let mut result: Vec<Pet> = filter_items(pets, self.filter.search.trim())
            .into_iter()
            .filter(|pet| self.filter.matches_attributes(pet))
            .cloned()
            .collect();
        sort_pets(&mut result, self.sort);
        if let Some(limit) = self.limit {
            result.truncate(limit);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pet::PetDraft;
    use chrono::{Duration, Utc};

    fn pet(name: &str, breed: &str, pet_type: PetType, age: u32, days_ago: i64) -> Pet {
        Pet {
            id: name.to_lowercase(),
            info: PetDraft {
                name: name.to_string(),
                breed: breed.to_string(),
                pet_type,
                age,
                description: format!("{} is friendly", name),
                location: "Berlin".to_string(),
                ..PetDraft::default()
            },
            photo_urls: vec![],
            seller_id: "u1".to_string(),
            created_at: Utc::now() - Duration::days(days_ago),
            updated_at: None,
        }
    }

    fn sample() -> Vec<Pet> {
        vec![
            pet("Rex", "Labrador", PetType::Dog, 4, 3),
            pet("Tom", "Siamese", PetType::Cat, 2, 1),
            pet("Kiwi", "Parrot", PetType::Bird, 9, 2),
        ]
    }

    #[test]
    fn test_search_matches_any_field() {
        let pets = sample();
        let result = filter_items(&pets, "siam");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].info.name, "Tom");

        let result = filter_items(&pets, "BERLIN");
        assert_eq!(result.len(), 3);

        let result = filter_items(&pets, "kiwi is");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_search_no_matches_returns_empty() {
        let pets = sample();
        assert!(filter_items(&pets, "hamster").is_empty());
    }

    #[test]
    fn test_empty_query_is_identity_in_newest_order() {
        let pets = sample();
        let result = ListingQuery::default().apply(&pets);
        let names: Vec<_> = result.iter().map(|p| p.info.name.as_str()).collect();
        assert_eq!(names, vec!["Tom", "Kiwi", "Rex"]);
    }

    #[test]
    fn test_type_filter() {
        let query = ListingQuery {
            filter: PetFilter {
                pet_type: Some(PetType::Cat),
                ..PetFilter::default()
            },
            ..ListingQuery::default()
        };
        let result = query.apply(&sample());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].info.name, "Tom");
    }

    #[test]
    fn test_age_bounds_are_inclusive() {
        let query = ListingQuery {
            filter: PetFilter {
                min_age: Some(2),
                max_age: Some(4),
                ..PetFilter::default()
            },
            sort: SortOption::NameAsc,
            limit: None,
        };
        let result = query.apply(&sample());
        let names: Vec<_> = result.iter().map(|p| p.info.name.as_str()).collect();
        assert_eq!(names, vec!["Rex", "Tom"]);
    }

    #[test]
    fn test_limit_applies_after_sorting() {
        let query = ListingQuery {
            sort: SortOption::NameAsc,
            limit: Some(2),
            ..ListingQuery::default()
        };
        let result = query.apply(&sample());
        let names: Vec<_> = result.iter().map(|p| p.info.name.as_str()).collect();
        assert_eq!(names, vec!["Kiwi", "Rex"]);
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(PetFilter::default().is_empty());
        let filter = PetFilter {
            gender: Some(Gender::Female),
            ..PetFilter::default()
        };
        assert!(!filter.is_empty());
    }
}
