//! Async HTTP client wrapping the laboratory gateway.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

/// Connection settings for the gateway.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Bearer token issued by the identity provider, if any.
  pub token:    Option<String>,
  pub timeout:  Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8888".to_string(),
      token:    None,
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Async HTTP client for the laboratory REST services.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(Error::Build)?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn send(
    &self,
    method: Method,
    path: &str,
    req: RequestBuilder,
  ) -> Result<Response> {
    let resp = req.send().await.map_err(|source| Error::Request {
      method: method.clone(),
      path: path.to_owned(),
      source,
    })?;
    tracing::debug!(%method, path, status = %resp.status(), "backend call");
    Ok(resp)
  }

  fn check(method: Method, path: &str, resp: Response) -> Result<Response> {
    if resp.status().is_success() {
      Ok(resp)
    } else {
      Err(Error::Status {
        method,
        path: path.to_owned(),
        status: resp.status(),
      })
    }
  }

  // ── Verbs ─────────────────────────────────────────────────────────────────

  /// `GET <path>` decoded as `T`.
  pub(crate) async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    what: &'static str,
  ) -> Result<T> {
    let req = self.request(Method::GET, path);
    let resp = self.send(Method::GET, path, req).await?;
    let resp = Self::check(Method::GET, path, resp)?;
    resp.json().await.map_err(|source| Error::Decode { what, source })
  }

  /// `GET <path>`; a 404 yields `None`.
  pub(crate) async fn get_optional<T: DeserializeOwned>(
    &self,
    path: &str,
    what: &'static str,
  ) -> Result<Option<T>> {
    let req = self.request(Method::GET, path);
    let resp = self.send(Method::GET, path, req).await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let resp = Self::check(Method::GET, path, resp)?;
    resp
      .json()
      .await
      .map(Some)
      .map_err(|source| Error::Decode { what, source })
  }

  /// `POST <path>` with a JSON body, decoding the response as `T`.
  pub(crate) async fn post_json<B, T>(
    &self,
    path: &str,
    body: &B,
    what: &'static str,
  ) -> Result<T>
  where
    B: Serialize + Sync,
    T: DeserializeOwned,
  {
    let req = self.request(Method::POST, path).json(body);
    let resp = self.send(Method::POST, path, req).await?;
    let resp = Self::check(Method::POST, path, resp)?;
    resp.json().await.map_err(|source| Error::Decode { what, source })
  }

  /// `POST <path>` with a JSON body, ignoring the response body.
  pub(crate) async fn post<B: Serialize + Sync>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<()> {
    let req = self.request(Method::POST, path).json(body);
    let resp = self.send(Method::POST, path, req).await?;
    Self::check(Method::POST, path, resp)?;
    Ok(())
  }

  /// `PUT <path>` with a JSON body, ignoring the response body.
  pub(crate) async fn put<B: Serialize + Sync>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<()> {
    let req = self.request(Method::PUT, path).json(body);
    let resp = self.send(Method::PUT, path, req).await?;
    Self::check(Method::PUT, path, resp)?;
    Ok(())
  }

  /// `DELETE <path>`.
  pub(crate) async fn delete(&self, path: &str) -> Result<()> {
    let req = self.request(Method::DELETE, path);
    let resp = self.send(Method::DELETE, path, req).await?;
    Self::check(Method::DELETE, path, resp)?;
    Ok(())
  }
}
