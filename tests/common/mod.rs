//! Hand-rolled collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use petmarket::model::error::{AuthError, AuthResult, UploadError, UploadResult};
use petmarket::model::file_handle::FileHandle;
use petmarket::model::user::AuthUser;
use petmarket::services::identity::IdentityProvider;
use petmarket::services::storage::{ProgressCallback, Uploader};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Started(String),
    Finished(String),
}

/// Uploader that replays scripted local percentages and records every call
#[derive(Default)]
pub struct ScriptedUploader {
    /// Local percentages reported for each file, by position
    pub steps: Vec<Vec<u8>>,
    /// Position of the file that fails, if any
    pub fail_at: Option<usize>,
    pub events: Mutex<Vec<UploadEvent>>,
    calls: Mutex<usize>,
}

impl ScriptedUploader {
    pub fn new(steps: Vec<Vec<u8>>, fail_at: Option<usize>) -> Self {
        ScriptedUploader {
            steps,
            fail_at,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<UploadEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn started(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, UploadEvent::Started(_)))
            .count()
    }
}

#[async_trait]
impl Uploader for ScriptedUploader {
    async fn upload_one(
        &self,
        file: &FileHandle,
        destination_path: &str,
        on_progress: Option<ProgressCallback>,
    ) -> UploadResult<String> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            let index = *calls;
            *calls += 1;
            index
        };
        self.events
            .lock()
            .unwrap()
            .push(UploadEvent::Started(file.name.clone()));

        for step in self.steps.get(index).cloned().unwrap_or_default() {
            if let Some(callback) = &on_progress {
                callback(step);
            }
            tokio::task::yield_now().await;
        }

        if self.fail_at == Some(index) {
            return Err(UploadError::Network(format!("{} dropped", file.name)));
        }
        if let Some(callback) = &on_progress {
            callback(100);
        }
        self.events
            .lock()
            .unwrap()
            .push(UploadEvent::Finished(file.name.clone()));
        Ok(format!("https://cdn.example/{}/{}", destination_path, file.name))
    }
}

pub fn files(count: usize) -> Vec<FileHandle> {
    (0..count)
        .map(|i| FileHandle::new(format!("photo-{}.jpg", i), format!("/tmp/photo-{}.jpg", i)))
        .collect()
}

/// Progress callback that collects every value it receives
pub fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));
    (callback, seen)
}

pub fn user(uid: &str) -> AuthUser {
    AuthUser {
        uid: uid.to_string(),
        email: format!("{}@example.com", uid),
        display_name: None,
        id_token: format!("token-{}", uid),
        refresh_token: "refresh".to_string(),
    }
}

/// Identity provider accepting a single password for every account
pub struct FixedPasswordIdentity {
    pub password: String,
    pub deleted: Mutex<Vec<String>>,
}

impl FixedPasswordIdentity {
    pub fn new(password: &str) -> Self {
        FixedPasswordIdentity {
            password: password.to_string(),
            deleted: Mutex::new(Vec::new()),
        }
    }

    fn uid_for(email: &str) -> String {
        email.split('@').next().unwrap_or(email).to_string()
    }
}

#[async_trait]
impl IdentityProvider for FixedPasswordIdentity {
    async fn sign_up(&self, email: &str, _password: &str) -> AuthResult<AuthUser> {
        Ok(user(&Self::uid_for(email)))
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        if password != self.password {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user(&Self::uid_for(email)))
    }

    async fn update_display_name(&self, user: &AuthUser, display_name: &str) -> AuthResult<AuthUser> {
        let mut named = user.clone();
        named.display_name = Some(display_name.to_string());
        Ok(named)
    }

    async fn send_password_reset(&self, _email: &str) -> AuthResult<()> {
        Ok(())
    }

    async fn delete_account(&self, user: &AuthUser) -> AuthResult<()> {
        self.deleted.lock().unwrap().push(user.uid.clone());
        Ok(())
    }
}
