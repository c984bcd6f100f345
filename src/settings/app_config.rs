use crate::services::batch_upload::DEFAULT_UPLOAD_PREFIX;
use crate::utils::{get_config_dir, get_data_dir};
use color_eyre::eyre;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "PETMARKET";
const ENV_SEPARATOR: &str = "__";

/// Where uploaded photos are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Cloudinary,
    S3,
}

/// Bucket and credentials of an S3 (or S3 compatible) storage
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct S3Settings {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: String,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    /// Base URL objects are served from, e.g. a CDN in front of the bucket
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CloudinarySettings {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    pub api_key: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    pub upload_prefix: String,
    pub backend: StorageBackend,
    #[serde(default)]
    pub s3: S3Settings,
    #[serde(default)]
    pub cloudinary: CloudinarySettings,
    #[serde(default)]
    pub identity: IdentitySettings,
    /// Document store file; defaults to `store.json` in the data directory
    #[serde(default)]
    pub store_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn store_path(&self) -> PathBuf {
        self.store_file
            .clone()
            .unwrap_or_else(|| get_data_dir().join("store.json"))
    }

    /// Fail early when the selected backend is missing required settings
    pub fn validate(&self) -> eyre::Result<()> {
        match self.backend {
            StorageBackend::Cloudinary => {
                if self.cloudinary.cloud_name.is_empty() || self.cloudinary.upload_preset.is_empty() {
                    eyre::bail!("Missing [cloudinary] cloud_name/upload_preset in configuration");
                }
            }
            StorageBackend::S3 => {
                let s3 = &self.s3;
                if s3.access_key.is_empty() || s3.secret_key.is_empty() || s3.region.is_empty() || s3.bucket.is_empty() {
                    eyre::bail!("Missing [s3] access_key/secret_key/region/bucket in configuration");
                }
            }
        }
        Ok(())
    }
}

/// Load the configuration from the config directory and the environment
pub fn load_config() -> eyre::Result<AppConfig> {
    load_config_from(&get_config_dir())
}

/// Defaults, then `<dir>/config.toml` if present, then `PETMARKET_*` variables
/// (`PETMARKET_S3__BUCKET` sets `s3.bucket`)
pub fn load_config_from(dir: &Path) -> eyre::Result<AppConfig> {
    let path = dir.join(CONFIG_FILE);
    let config = config::Config::builder()
        .set_default("upload_prefix", DEFAULT_UPLOAD_PREFIX)?
        .set_default("backend", "cloudinary")?
        .add_source(
            config::File::from(path.as_path())
                .format(config::FileFormat::Toml)
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR),
        )
        .build()?;
    let app_config: AppConfig = config.try_deserialize()?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(app_config)
}
