//! Base HTTP client with shared logic

use crate::infrastructure::model::types::ModelError;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// How requests authenticate against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Bearer(String),
    /// A key was configured but its environment variable is unset.
    Unresolved(String),
}

/// Base HTTP client with shared functionality
#[derive(Clone)]
pub struct HttpClientBase {
    pub id: String,
    pub url: String,
    pub auth: Auth,
    pub http: Client,
}

impl HttpClientBase {
    pub fn new(id: impl Into<String>, url: impl Into<String>, auth: Auth, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            id: id.into(),
            url: url.into(),
            auth,
            http,
        }
    }

    /// POST a JSON body, attaching bearer auth when a key is configured.
    pub async fn post_json<Req>(&self, body: &Req) -> Result<Response, ModelError>
    where
        Req: serde::Serialize,
    {
        let request = self.authorize(self.http.post(&self.url))?;
        request
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::network(&self.id, e))
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ModelError> {
        match &self.auth {
            Auth::None => Ok(request),
            Auth::Bearer(key) => Ok(request.bearer_auth(key)),
            Auth::Unresolved(env_var) => Err(ModelError::missing_api_key(&self.id, env_var)),
        }
    }
}
