use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::api::{BoxFuture, Created, ManagementApi, ObjectKey, ObjectKind};
use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError};

/// reqwest-backed [`ManagementApi`].
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: String,
    username: String,
    password: String,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(config.insecure);

        if let Some(path) = &config.cacert_file {
            let pem = std::fs::read(path).map_err(|source| ConfigError::CaCert {
                path: path.clone(),
                source,
            })?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base: config.endpoint.trim().trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let resp = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => format!("(failed to read response body: {e})"),
        };
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let resp = self.send(self.http.get(url)).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The authenticated user as the broker sees it. Used as a connectivity
    /// and credentials check.
    pub async fn whoami(&self) -> Result<Value, ApiError> {
        self.get_json(&self.url("whoami")).await
    }

    /// Every object in a collection.
    pub async fn list(&self, kind: ObjectKind) -> Result<Vec<Value>, ApiError> {
        let value = self.get_json(&self.url(kind.collection())).await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl ManagementApi for HttpClient {
    fn get(&self, key: &ObjectKey) -> BoxFuture<'_, Result<Value, ApiError>> {
        let url = self.url(&key.path());
        Box::pin(async move {
            tracing::debug!(url = %url, "GET");
            self.get_json(&url).await
        })
    }

    fn create(&self, key: &ObjectKey, body: &Value) -> BoxFuture<'_, Result<Created, ApiError>> {
        let url = self.url(&key.path());
        let body = body.clone();
        // Bindings are the one collection where the server assigns the address.
        let post = key.kind == ObjectKind::Binding;
        Box::pin(async move {
            let request = if post {
                self.http.post(&url)
            } else {
                self.http.put(&url)
            };
            tracing::debug!(url = %url, post, "create");
            let resp = self.send(request.json(&body)).await?;
            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            tracing::debug!(status = %resp.status(), location = ?location, "create response");
            Ok(Created { location })
        })
    }

    fn update(&self, key: &ObjectKey, body: &Value) -> BoxFuture<'_, Result<(), ApiError>> {
        let url = self.url(&key.path());
        let body = body.clone();
        Box::pin(async move {
            tracing::debug!(url = %url, "PUT");
            let resp = self.send(self.http.put(&url).json(&body)).await?;
            tracing::debug!(status = %resp.status(), "update response");
            Ok(())
        })
    }

    fn delete(&self, key: &ObjectKey) -> BoxFuture<'_, Result<(), ApiError>> {
        let url = self.url(&key.path());
        Box::pin(async move {
            tracing::debug!(url = %url, "DELETE");
            let resp = self.send(self.http.delete(&url)).await?;
            tracing::debug!(status = %resp.status(), "delete response");
            Ok(())
        })
    }
}
