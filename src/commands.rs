use crate::cli::{Command, FavoriteCommand, ProfileCommand};
use color_eyre::eyre::{self, eyre};
use petmarket::model::file_handle::FileHandle;
use petmarket::model::filtering::ListingQuery;
use petmarket::model::pet::{Pet, PetDraft};
use petmarket::model::user::AuthUser;
use petmarket::services::batch_upload::BatchUploader;
use petmarket::services::cloudinary::{optimized_image_url, CloudinaryUploader, ImageTransform};
use petmarket::services::document_store::LocalDocumentStore;
use petmarket::services::identity::FirebaseIdentity;
use petmarket::services::pet_service::{PetService, FEATURED_COUNT};
use petmarket::services::s3_uploader::S3Uploader;
use petmarket::services::session::Session;
use petmarket::services::storage::{ProgressCallback, Uploader};
use petmarket::settings::app_config::{load_config, AppConfig, StorageBackend};
use petmarket::settings::session_file::{clear_session, load_session, save_session, session_path};
use petmarket::utils::{format_progress_bar, format_size};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

const PROGRESS_BAR_WIDTH: usize = 30;

/// Everything a command needs, wired from the configuration
struct App {
    config: AppConfig,
    session: Session,
    pets: PetService,
    uploads: BatchUploader,
    session_file: PathBuf,
}

impl App {
    async fn new() -> eyre::Result<Self> {
        let config = load_config()?;
        let store = Arc::new(LocalDocumentStore::open(config.store_path()).await?);
        let identity = Arc::new(FirebaseIdentity::new(&config.identity));
        let session = Session::new(identity, store.clone());
        let session_file = session_path();
        session.restore(load_session(&session_file));

        let uploader: Arc<dyn Uploader> = match config.backend {
            StorageBackend::Cloudinary => Arc::new(CloudinaryUploader::new(config.cloudinary.clone())),
            StorageBackend::S3 => Arc::new(S3Uploader::new(config.s3.clone())),
        };
        let uploads = BatchUploader::with_prefix(uploader, config.upload_prefix.clone());
        let pets = PetService::new(store, uploads.clone());

        Ok(App {
            config,
            session,
            pets,
            uploads,
            session_file,
        })
    }

    fn signed_in(&self) -> eyre::Result<AuthUser> {
        self.session
            .current_user()
            .ok_or_else(|| eyre!("You are not signed in, run `petmarket login` first"))
    }

    /// Mirror the session state to disk after a command
    fn persist_session(&self) -> eyre::Result<()> {
        match self.session.current_user() {
            Some(user) => save_session(&self.session_file, &user),
            None => clear_session(&self.session_file),
        }
    }
}

pub async fn run(command: Command) -> eyre::Result<()> {
    let app = App::new().await?;
    let result = dispatch(&app, command).await;
    app.persist_session()?;
    result
}

async fn dispatch(app: &App, command: Command) -> eyre::Result<()> {
    match command {
        Command::Register {
            email,
            password,
            name,
        } => {
            let user = app.session.register(&email, &password, &name).await?;
            println!("Welcome, {}! Signed in as {}", name, user.email);
        }
        Command::Login { email, password } => {
            let user = app.session.login(&email, &password).await?;
            println!("Signed in as {}", user.email);
        }
        Command::Logout => {
            app.session.logout();
            println!("Signed out");
        }
        Command::Whoami => match app.session.current_user() {
            Some(user) => println!(
                "{} <{}> ({})",
                user.display_name.as_deref().unwrap_or("-"),
                user.email,
                user.uid
            ),
            None => println!("Not signed in"),
        },
        Command::ResetPassword { email } => {
            app.session.reset_password(&email).await?;
            println!("Password reset email sent to {}", email);
        }
        Command::Upload { files } => {
            let user = app.signed_in()?;
            app.config.validate()?;
            let handles = file_handles(&files)?;
            let urls = app
                .uploads
                .upload_many(&handles, &user.uid, Some(progress_printer()))
                .await?;
            eprintln!();
            for url in urls {
                println!("{}", url);
            }
        }
        Command::Publish { details, photos } => {
            let user = app.signed_in()?;
            app.config.validate()?;
            let mut draft = PetDraft::for_contact(user.email.clone());
            details.apply_to(&mut draft);
            if draft.name.trim().is_empty() {
                return Err(eyre!("A pet needs a name, pass --name"));
            }
            let handles = file_handles(&photos)?;
            let pet = app
                .pets
                .publish_pet(Some(&user), draft, &handles, Some(progress_printer()))
                .await;
            if !handles.is_empty() {
                eprintln!();
            }
            let pet = pet?;
            println!("Published {} as {}", pet.info.name, pet.id);
        }
        Command::List { query } => {
            let pets = app.pets.list_adoptable().await?;
            let shown = ListingQuery::from(query).apply(&pets);
            if shown.is_empty() {
                println!("No pets found");
            }
            for pet in &shown {
                print_summary(pet);
            }
        }
        Command::Featured => {
            for pet in app.pets.featured_pets(FEATURED_COUNT).await? {
                print_summary(&pet);
            }
        }
        Command::Show { id } => {
            let pet = app.pets.get_pet(&id).await?;
            print_details(&pet);
            if let Some(seller) = app.pets.seller_profile(&pet).await? {
                println!("Seller:      {} <{}>", seller.name, seller.email);
            }
            if let Some(user) = app.session.current_user() {
                if app.pets.is_favorite(&user.uid, &pet.id).await {
                    println!("In your favorites");
                }
            }
        }
        Command::Mine => {
            let user = app.signed_in()?;
            for pet in app.pets.user_pets(&user.uid).await? {
                print_summary(&pet);
            }
        }
        Command::Update { id, details } => {
            let user = app.signed_in()?;
            let mut draft = app.pets.get_pet(&id).await?.info;
            details.apply_to(&mut draft);
            let pet = app.pets.update_pet(&id, &draft, &user.uid).await?;
            println!("Updated {}", pet.info.name);
        }
        Command::Delete { id } => {
            let user = app.signed_in()?;
            app.pets.delete_pet(&id, &user.uid).await?;
            println!("Deleted {}", id);
        }
        Command::Favorite { action } => favorite(app, action).await?,
        Command::Profile { action } => profile(app, action).await?,
        Command::DeleteAccount { password } => {
            app.pets.delete_account(&app.session, &password).await?;
            println!("Your account has been deleted");
        }
        Command::ImageUrl {
            url,
            width,
            height,
            quality,
        } => {
            let transform = ImageTransform {
                width,
                height,
                quality,
            };
            println!("{}", optimized_image_url(&url, &transform));
        }
    }
    Ok(())
}

async fn favorite(app: &App, action: FavoriteCommand) -> eyre::Result<()> {
    let user = app.signed_in()?;
    match action {
        FavoriteCommand::Add { id } => {
            let pet = app.pets.get_pet(&id).await?;
            app.pets.add_favorite(&user.uid, &pet).await?;
            println!("Added {} to favorites", pet.info.name);
        }
        FavoriteCommand::Remove { id } => {
            app.pets.remove_favorite(&user.uid, &id).await?;
            println!("Removed {} from favorites", id);
        }
        FavoriteCommand::Toggle { id } => {
            let pet = app.pets.get_pet(&id).await?;
            if app.pets.toggle_favorite(&user.uid, &pet).await? {
                println!("Added {} to favorites", pet.info.name);
            } else {
                println!("Removed {} from favorites", pet.info.name);
            }
        }
        FavoriteCommand::List => {
            for favorite in app.pets.favorites(&user.uid).await? {
                println!(
                    "{:<34} {:<16} {:<16} {:>3}y  {}",
                    favorite.id, favorite.pet_name, favorite.pet_breed, favorite.pet_age, favorite.pet_location
                );
            }
        }
    }
    Ok(())
}

async fn profile(app: &App, action: ProfileCommand) -> eyre::Result<()> {
    let user = app.signed_in()?;
    match action {
        ProfileCommand::Show => {
            let profile = app.pets.profile(&user.uid).await?;
            println!("Name:    {}", profile.name);
            println!("Email:   {}", profile.email);
            println!("Phone:   {}", profile.contact_details.phone);
            println!("Address: {}", profile.contact_details.address);
        }
        ProfileCommand::Update {
            name,
            phone,
            address,
        } => {
            let current = app.pets.profile(&user.uid).await?;
            let mut details = current.contact_details;
            if let Some(phone) = phone {
                details.phone = phone;
            }
            if let Some(address) = address {
                details.address = address;
            }
            let name = name.unwrap_or(current.name);
            app.pets.update_profile(&user.uid, &name, &details).await?;
            println!("Profile updated");
        }
    }
    Ok(())
}

fn file_handles(paths: &[PathBuf]) -> eyre::Result<Vec<FileHandle>> {
    paths
        .iter()
        .map(|path| {
            let handle = FileHandle::from_path(path);
            let size = std::fs::metadata(path)
                .map_err(|e| eyre!("Cannot read {}: {}", path.display(), e))?
                .len();
            tracing::debug!("Queued {} ({})", handle.name, format_size(size));
            Ok(handle)
        })
        .collect()
}

/// Redraws a single progress line on stderr
fn progress_printer() -> ProgressCallback {
    Arc::new(|percent: u8| {
        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "\r{} {:>3}%",
            format_progress_bar(percent, PROGRESS_BAR_WIDTH),
            percent
        );
        let _ = stderr.flush();
    })
}

fn print_summary(pet: &Pet) {
    println!(
        "{:<34} {:<16} {:<8} {:<16} {:>3}y  {}",
        pet.id, pet.info.name, pet.info.pet_type, pet.info.breed, pet.info.age, pet.info.location
    );
}

fn print_details(pet: &Pet) {
    let info = &pet.info;
    println!("{} ({})", info.name, pet.id);
    println!("Type:        {} / {}", info.pet_type, info.breed);
    println!("Age:         {}", info.age);
    println!("Gender/size: {} / {}", info.gender, info.size);
    println!("Location:    {}", info.location);
    println!(
        "Medical:     vaccinated: {}, sterilized: {}",
        info.medical_history.vaccinated, info.medical_history.sterilized
    );
    if !info.medical_history.health_issues.is_empty() {
        println!("Health:      {}", info.medical_history.health_issues);
    }
    println!("Contact:     {} {}", info.contact_email, info.contact_phone);
    println!("Adoptable:   {}", if info.adoptable { "yes" } else { "no" });
    if !info.description.is_empty() {
        println!("\n{}\n", info.description);
    }
    for url in &pet.photo_urls {
        println!("Photo:       {}", url);
    }
    println!("Listed:      {}", pet.created_at.format("%Y-%m-%d"));
}
