//! Signed-in user context
//!
//! The current user lives in a watch channel so any number of observers can
//! follow sign-in and sign-out without a global.

use crate::model::error::{AuthError, AuthResult, PetResult};
use crate::model::user::AuthUser;
use crate::services::document_store::DocumentStore;
use crate::services::identity::IdentityProvider;
use crate::services::profiles;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

pub struct Session {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    current: watch::Sender<Option<AuthUser>>,
}

impl Session {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        let (current, _) = watch::channel(None);
        Session {
            identity,
            store,
            current,
        }
    }

    /// Resume a previously persisted user without contacting the provider
    pub fn restore(&self, user: Option<AuthUser>) {
        self.current.send_replace(user);
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    pub fn require_user(&self) -> AuthResult<AuthUser> {
        self.current_user().ok_or(AuthError::NotSignedIn)
    }

    /// Stream of user changes, starting with the current value
    pub fn subscribe(&self) -> WatchStream<Option<AuthUser>> {
        WatchStream::new(self.current.subscribe())
    }

    /// Create an account, set its display name and write its profile
    pub async fn register(&self, email: &str, password: &str, name: &str) -> PetResult<AuthUser> {
        let user = self.identity.sign_up(email, password).await?;
        let user = self.identity.update_display_name(&user, name).await?;
        profiles::create_profile(self.store.as_ref(), &user, name, false).await?;
        tracing::info!("Registered account {}", user.uid);
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let user = self.identity.sign_in(email, password).await?;
        self.ensure_profile(&user).await;
        tracing::info!("Signed in as {}", user.uid);
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Accounts created elsewhere get a profile on first sign-in
    async fn ensure_profile(&self, user: &AuthUser) {
        let store = self.store.as_ref();
        match profiles::get_profile(store, &user.uid).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let name = user.display_name.clone().unwrap_or_else(|| "User".to_string());
                if let Err(e) = profiles::create_profile(store, user, &name, true).await {
                    tracing::warn!("Failed to create profile for {}: {}", user.uid, e);
                }
            }
            Err(e) => tracing::warn!("Failed to read profile for {}: {}", user.uid, e),
        }
    }

    pub fn logout(&self) {
        if let Some(user) = self.current.send_replace(None) {
            tracing::info!("Signed out {}", user.uid);
        }
    }

    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        self.identity.send_password_reset(email).await
    }

    /// Confirm the signed-in user's password, refreshing their tokens
    pub async fn reauthenticate(&self, password: &str) -> AuthResult<AuthUser> {
        let user = self.require_user()?;
        let fresh = self.identity.sign_in(&user.email, password).await?;
        if fresh.uid != user.uid {
            return Err(AuthError::InvalidCredentials);
        }
        self.current.send_replace(Some(fresh.clone()));
        Ok(fresh)
    }

    /// Remove the signed-in identity and sign out
    pub async fn delete_identity(&self) -> AuthResult<()> {
        let user = self.require_user()?;
        self.identity.delete_account(&user).await?;
        self.current.send_replace(None);
        tracing::info!("Deleted identity {}", user.uid);
        Ok(())
    }
}
