//! The signed-in user kept between CLI invocations

use crate::model::user::AuthUser;
use crate::utils::get_data_dir;
use color_eyre::eyre;
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSION_FILE: &str = "session.json";

pub fn session_path() -> PathBuf {
    get_data_dir().join(SESSION_FILE)
}

/// Read the stored user; a missing or unreadable file means signed out
pub fn load_session(path: &Path) -> Option<AuthUser> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!("Ignoring unreadable session file {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_session(path: &Path, user: &AuthUser) -> eyre::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(user)?)?;
    Ok(())
}

pub fn clear_session(path: &Path) -> eyre::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user() -> AuthUser {
        AuthUser {
            uid: "u1".into(),
            email: "ann@example.com".into(),
            display_name: Some("Ann".into()),
            id_token: "token".into(),
            refresh_token: "refresh".into(),
        }
    }

    #[test]
    fn test_save_load_clear() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(SESSION_FILE);

        assert_eq!(load_session(&path), None);
        save_session(&path, &user()).unwrap();
        assert_eq!(load_session(&path), Some(user()));
        clear_session(&path).unwrap();
        assert_eq!(load_session(&path), None);
        assert!(clear_session(&path).is_ok());
    }

    #[test]
    fn test_corrupt_session_is_signed_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SESSION_FILE);
        fs::write(&path, "not json").unwrap();
        assert_eq!(load_session(&path), None);
    }
}
