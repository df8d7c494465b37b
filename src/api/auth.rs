use log::{debug, info, warn};

use super::ApiClient;
use crate::error::ApiError;
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::storage::StoredAuth;

impl ApiClient {
    /// Exchange credentials for a bearer token and cache it.
    pub async fn login(&self, email: &str, password: &str) -> Result<StoredAuth, ApiError> {
        debug!("Logging in as {}", email);
        let request = LoginRequest {
            email: email.trim().to_owned(),
            password: password.to_owned(),
        };
        let response: LoginResponse = self.post("/auth/login", &request).await?;
        info!("Logged in as {}", response.user.name);

        let auth = StoredAuth {
            token: response.token,
            user: response.user,
        };
        self.auth().store(auth.clone());
        Ok(auth)
    }

    /// Best-effort server logout; the local token is purged either way.
    pub async fn logout(&self) {
        if let Err(e) = self.post_ack("/auth/logout", &serde_json::json!({})).await {
            warn!("Logout request failed: {}", e);
        }
        self.auth().purge();
    }
}
