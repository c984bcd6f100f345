//! Identity provider seam and its Identity Toolkit REST implementation

use crate::model::error::{AuthError, AuthResult};
use crate::model::user::AuthUser;
use crate::settings::app_config::IdentitySettings;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Email/password account operations offered by the identity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser>;

    async fn update_display_name(&self, user: &AuthUser, display_name: &str) -> AuthResult<AuthUser>;

    async fn send_password_reset(&self, email: &str) -> AuthResult<()>;

    async fn delete_account(&self, user: &AuthUser) -> AuthResult<()>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Identity Toolkit (`accounts:*`) REST client
#[derive(Clone)]
pub struct FirebaseIdentity {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FirebaseIdentity {
    pub fn new(settings: &IdentitySettings) -> Self {
        FirebaseIdentity {
            http_client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_IDENTITY_BASE_URL.to_string()),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.base_url.trim_end_matches('/'),
            method,
            self.api_key
        )
    }

    async fn call<B: Serialize + ?Sized, R: DeserializeOwned>(&self, method: &str, body: &B) -> AuthResult<R> {
        let response = self
            .http_client
            .post(self.endpoint(method))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !status.is_success() {
            let code = serde_json::from_str::<ErrorResponse>(&text)
                .map(|r| r.error.message)
                .unwrap_or_else(|_| format!("{} {}", status, text.trim()));
            tracing::debug!("accounts:{} failed: {}", method, code);
            return Err(AuthError::from_code(&code));
        }
        serde_json::from_str(&text)
            .map_err(|e| AuthError::Other(format!("unexpected identity response: {}", e)))
    }

    fn user_from(response: TokenResponse, previous: Option<&AuthUser>) -> AuthUser {
        AuthUser {
            uid: response.local_id,
            email: response.email,
            display_name: response
                .display_name
                .filter(|name| !name.is_empty())
                .or_else(|| previous.and_then(|p| p.display_name.clone())),
            id_token: response
                .id_token
                .or_else(|| previous.map(|p| p.id_token.clone()))
                .unwrap_or_default(),
            refresh_token: response
                .refresh_token
                .or_else(|| previous.map(|p| p.refresh_token.clone()))
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: TokenResponse = self.call("signUp", &request).await?;
        Ok(Self::user_from(response, None))
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: TokenResponse = self.call("signInWithPassword", &request).await?;
        Ok(Self::user_from(response, None))
    }

    async fn update_display_name(&self, user: &AuthUser, display_name: &str) -> AuthResult<AuthUser> {
        let request = json!({
            "idToken": user.id_token,
            "displayName": display_name,
            "returnSecureToken": true,
        });
        let response: TokenResponse = self.call("update", &request).await?;
        let mut updated = Self::user_from(response, Some(user));
        updated.display_name = Some(display_name.to_string());
        Ok(updated)
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let request = json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
        });
        let _: serde_json::Value = self.call("sendOobCode", &request).await?;
        Ok(())
    }

    async fn delete_account(&self, user: &AuthUser) -> AuthResult<()> {
        let request = json!({ "idToken": user.id_token });
        let _: serde_json::Value = self.call("delete", &request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::http_stub::serve_once;

    fn identity_at(base_url: String) -> FirebaseIdentity {
        FirebaseIdentity::new(&IdentitySettings {
            api_key: "test-key".to_string(),
            base_url: Some(base_url),
        })
    }

    fn identity() -> FirebaseIdentity {
        FirebaseIdentity::new(&IdentitySettings {
            api_key: "test-key".to_string(),
            base_url: None,
        })
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            identity().endpoint("signUp"),
            "https://identitytoolkit.googleapis.com/v1/accounts:signUp?key=test-key"
        );
    }

    #[test]
    fn test_user_from_sign_in_response() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"localId":"u1","email":"a@x.io","displayName":"","idToken":"t","refreshToken":"r","registered":true}"#,
        )
        .unwrap();
        let user = FirebaseIdentity::user_from(response, None);
        assert_eq!(user.uid, "u1");
        assert_eq!(user.display_name, None);
        assert_eq!(user.id_token, "t");
    }

    #[test]
    fn test_user_from_update_response_keeps_tokens() {
        let previous = AuthUser {
            uid: "u1".into(),
            email: "a@x.io".into(),
            display_name: None,
            id_token: "old-token".into(),
            refresh_token: "old-refresh".into(),
        };
        let response: TokenResponse =
            serde_json::from_str(r#"{"localId":"u1","email":"a@x.io","displayName":"Ann"}"#).unwrap();
        let user = FirebaseIdentity::user_from(response, Some(&previous));
        assert_eq!(user.display_name.as_deref(), Some("Ann"));
        assert_eq!(user.id_token, "old-token");
        assert_eq!(user.refresh_token, "old-refresh");
    }

    #[tokio::test]
    async fn test_sign_in_against_server() {
        let (base, request) = serve_once(
            200,
            r#"{"localId":"u1","email":"ann@example.com","displayName":"Ann","idToken":"t1","refreshToken":"r1","registered":true}"#,
        )
        .await;

        let user = identity_at(base).sign_in("ann@example.com", "secret1").await.unwrap();

        assert_eq!(user.uid, "u1");
        assert_eq!(user.display_name.as_deref(), Some("Ann"));
        assert_eq!(user.id_token, "t1");
        let request = request.await.unwrap();
        assert!(request.starts_with("POST /accounts:signInWithPassword?key=test-key "));
        assert!(request.contains(r#""returnSecureToken":true"#));
    }

    #[tokio::test]
    async fn test_error_code_from_server() {
        let (base, _request) = serve_once(
            400,
            r#"{"error":{"code":400,"message":"INVALID_LOGIN_CREDENTIALS","errors":[]}}"#,
        )
        .await;

        let result = identity_at(base).sign_in("ann@example.com", "wrong").await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_password_reset_against_server() {
        let (base, request) = serve_once(200, r#"{"email":"ann@example.com"}"#).await;

        identity_at(base).send_password_reset("ann@example.com").await.unwrap();

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /accounts:sendOobCode?key=test-key "));
        assert!(request.contains(r#""requestType":"PASSWORD_RESET""#));
    }
}
