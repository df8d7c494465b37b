use std::sync::Arc;

use log::{debug, error, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ApiError;
use crate::storage::AuthStore;

pub mod auth;
pub mod quiz;
pub mod session;

/// `{success, data, message?, errors?}` wrapper around every response body.
#[derive(Deserialize, Debug)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

/// REST client shared by every screen.
///
/// All requests go through [`ApiClient::send`], which attaches the bearer token and
/// purges it when the server answers 401.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    auth: Arc<AuthStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, auth: Arc<AuthStore>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').into(),
            auth,
        }
    }

    pub fn auth(&self) -> &Arc<AuthStore> {
        &self.auth
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let envelope = self.send(self.http.get(self.url(path))).await?;
        envelope.data.ok_or(ApiError::MissingData)
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let envelope = self.send(self.http.post(self.url(path)).json(body)).await?;
        envelope.data.ok_or(ApiError::MissingData)
    }

    /// POST whose success payload carries nothing we use.
    pub(crate) async fn post_ack<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send::<serde::de::IgnoredAny>(self.http.post(self.url(path)).json(body))
            .await
            .map(|_| ())
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<ApiEnvelope<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let request = match self.auth.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let resp = request.header("Accept", "application/json").send().await?;
        let status = resp.status();
        let url = resp.url().path().to_owned();

        if status == StatusCode::UNAUTHORIZED {
            warn!("{} answered 401; signing out", url);
            self.auth.purge();
            return Err(ApiError::Unauthorized);
        }

        let body = resp.bytes().await?;
        if !status.is_success() {
            error!("{} failed with {}", url, status);
            let message = serde_json::from_slice::<ApiEnvelope<serde::de::IgnoredAny>>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_owned());
            return Err(ApiError::Rejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_slice(&body)?;
        if !envelope.success {
            debug!("{} rejected: {:?}", url, envelope.errors);
            return Err(ApiError::Rejected {
                status: None,
                message: envelope.message.unwrap_or_default(),
            });
        }
        Ok(envelope)
    }
}
