//! Sort orders for pet listings

use crate::model::pet::Pet;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Ordering of a listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    Newest,
    Oldest,
    NameAsc,
    NameDesc,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Newest => "newest",
            SortOption::Oldest => "oldest",
            SortOption::NameAsc => "name_asc",
            SortOption::NameDesc => "name_desc",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortOption::Newest),
            "oldest" => Ok(SortOption::Oldest),
            "name_asc" => Ok(SortOption::NameAsc),
            "name_desc" => Ok(SortOption::NameDesc),
            other => Err(format!("unknown sort option: {}", other)),
        }
    }
}

/// Compare names the way a reader expects: case-insensitive first, then exact
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort pets in place
pub fn sort_pets(pets: &mut [Pet], option: SortOption) {
    match option {
        SortOption::Newest => pets.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOption::Oldest => pets.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOption::NameAsc => pets.sort_by(|a, b| compare_names(&a.info.name, &b.info.name)),
        SortOption::NameDesc => pets.sort_by(|a, b| compare_names(&b.info.name, &a.info.name)),
    }
}
