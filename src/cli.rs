use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use petmarket::model::filtering::{ListingQuery, PetFilter};
use petmarket::model::pet::{Gender, PetDraft, PetSize, PetType};
use petmarket::model::sorting::SortOption;
use petmarket::utils::version;

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PETMARKET_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PETMARKET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the signed-in user
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Send a password reset email
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Upload photos and print their URLs
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Publish a pet for adoption
    Publish {
        #[command(flatten)]
        details: PetArgs,
        /// Photo of the pet, repeat for up to 5 photos
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },
    /// List pets open for adoption
    List {
        #[command(flatten)]
        query: ListArgs,
    },
    /// Show the newest pets open for adoption
    Featured,
    /// Show a pet with its seller
    Show { id: String },
    /// List your own pets
    Mine,
    /// Change the details of one of your pets
    Update {
        id: String,
        #[command(flatten)]
        details: PetArgs,
    },
    /// Delete one of your pets
    Delete { id: String },
    /// Manage favorite pets
    Favorite {
        #[command(subcommand)]
        action: FavoriteCommand,
    },
    /// Show or change your profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Delete your account together with your pets
    DeleteAccount {
        #[arg(long, env = "PETMARKET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print a resized delivery URL for an uploaded image
    ImageUrl {
        url: String,
        #[arg(long, default_value_t = 400)]
        width: u32,
        #[arg(long, default_value_t = 300)]
        height: u32,
        #[arg(long, default_value = "auto")]
        quality: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum FavoriteCommand {
    Add { id: String },
    Remove { id: String },
    /// Add the pet if it is not a favorite yet, remove it otherwise
    Toggle { id: String },
    List,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
}

/// Listing fields; unset fields keep their current value
#[derive(Args, Debug, Default)]
pub struct PetArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub breed: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    #[arg(long)]
    pub gender: Option<Gender>,
    #[arg(long)]
    pub size: Option<PetSize>,
    #[arg(long = "type")]
    pub pet_type: Option<PetType>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub vaccinated: Option<bool>,
    #[arg(long)]
    pub sterilized: Option<bool>,
    #[arg(long)]
    pub health_issues: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub contact_email: Option<String>,
    #[arg(long)]
    pub contact_phone: Option<String>,
    #[arg(long)]
    pub adoptable: Option<bool>,
}

impl PetArgs {
    pub fn apply_to(self, draft: &mut PetDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(breed) = self.breed {
            draft.breed = breed;
        }
        if let Some(age) = self.age {
            draft.age = age;
        }
        if let Some(gender) = self.gender {
            draft.gender = gender;
        }
        if let Some(size) = self.size {
            draft.size = size;
        }
        if let Some(pet_type) = self.pet_type {
            draft.pet_type = pet_type;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(vaccinated) = self.vaccinated {
            draft.medical_history.vaccinated = vaccinated;
        }
        if let Some(sterilized) = self.sterilized {
            draft.medical_history.sterilized = sterilized;
        }
        if let Some(health_issues) = self.health_issues {
            draft.medical_history.health_issues = health_issues;
        }
        if let Some(location) = self.location {
            draft.location = location;
        }
        if let Some(contact_email) = self.contact_email {
            draft.contact_email = contact_email;
        }
        if let Some(contact_phone) = self.contact_phone {
            draft.contact_phone = contact_phone;
        }
        if let Some(adoptable) = self.adoptable {
            draft.adoptable = adoptable;
        }
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Match against name, breed, description and location
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long = "type")]
    pub pet_type: Option<PetType>,
    #[arg(long)]
    pub gender: Option<Gender>,
    #[arg(long)]
    pub size: Option<PetSize>,
    #[arg(long)]
    pub min_age: Option<u32>,
    #[arg(long)]
    pub max_age: Option<u32>,
    /// newest, oldest, name_asc or name_desc
    #[arg(long, default_value = "newest")]
    pub sort: SortOption,
    /// Show at most this many pets
    #[arg(long)]
    pub limit: Option<usize>,
}

impl From<ListArgs> for ListingQuery {
    fn from(args: ListArgs) -> Self {
        ListingQuery {
            filter: PetFilter {
                search: args.search,
                pet_type: args.pet_type,
                gender: args.gender,
                size: args.size,
                min_age: args.min_age,
                max_age: args.max_age,
            },
            sort: args.sort,
            limit: args.limit,
        }
    }
}
