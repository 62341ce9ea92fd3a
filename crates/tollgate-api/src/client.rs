// Async HTTP client for the tollgate entitlement backend.
//
// Base path: /api/
// Auth: X-API-KEY header
//
// One REST collection per entity kind:
//   GET    /api/{kind}          list (bare array or { "data": [...] })
//   GET    /api/{kind}/{id}     fetch one
//   POST   /api/{kind}          create
//   PATCH  /api/{kind}/{id}     partial update
//   DELETE /api/{kind}/{id}     delete

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::Error;

// ── Entity kinds ─────────────────────────────────────────────────────

/// The persisted collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Vouchers,
    Subscriptions,
    Payments,
}

impl EntityKind {
    /// Relative path segment under `/api/`.
    pub fn path(self) -> &'static str {
        match self {
            Self::Vouchers => "vouchers",
            Self::Subscriptions => "subscriptions",
            Self::Payments => "payments",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// ── Wire envelopes ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// List responses come either bare or wrapped in `{ "data": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListEnvelope<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

/// Single-record responses may also be wrapped in `{ "data": {...} }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordEnvelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> RecordEnvelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the entitlement backend.
///
/// Record and request types are chosen by the caller; the client only
/// knows about collections, URLs, and error bodies. Every method makes
/// exactly one attempt.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `X-API-KEY` as a default header on every request.
    pub fn from_api_key(
        base_url: &str,
        api_key: &secrecy::SecretString,
        transport: &crate::TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert("X-API-KEY", key_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL path ends in `/api/`.
    ///
    /// `https://host` and `https://host/api` both become `https://host/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    /// The normalized base URL (always ends in `/api/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn collection_url(&self, kind: EntityKind) -> Result<Url, Error> {
        Ok(self.base_url.join(kind.path())?)
    }

    /// Ids are opaque; push them as a single percent-encoded segment.
    fn record_url(&self, kind: EntityKind, id: &str) -> Result<Url, Error> {
        let mut url = self.collection_url(kind)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::InvalidApiKey;
        }

        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            Error::Api {
                status: status.as_u16(),
                message: err.message.unwrap_or_else(|| status.to_string()),
                code: err.code,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            }
        }
    }

    // ── Entities ─────────────────────────────────────────────────────

    /// Fetch every record of a collection.
    pub async fn list_entities<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<T>, Error> {
        let url = self.collection_url(kind)?;
        let envelope: ListEnvelope<T> = self.get(url).await?;
        Ok(envelope.into_vec())
    }

    /// Fetch a single record by id.
    pub async fn get_entity<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<T, Error> {
        let url = self.record_url(kind, id)?;
        let envelope: RecordEnvelope<T> = self.get(url).await?;
        Ok(envelope.into_inner())
    }

    /// Create a record; returns the backend's stored representation.
    pub async fn create_entity<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        kind: EntityKind,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.collection_url(kind)?;
        let envelope: RecordEnvelope<T> = self.post(url, body).await?;
        Ok(envelope.into_inner())
    }

    /// Apply a partial update to a record.
    pub async fn update_entity<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        kind: EntityKind,
        id: &str,
        patch: &B,
    ) -> Result<T, Error> {
        let url = self.record_url(kind, id)?;
        let envelope: RecordEnvelope<T> = self.patch(url, patch).await?;
        Ok(envelope.into_inner())
    }

    pub async fn delete_entity(&self, kind: EntityKind, id: &str) -> Result<(), Error> {
        let url = self.record_url(kind, id)?;
        self.delete(url).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_api_suffix() {
        let url = ApiClient::normalize_base_url("https://billing.example.com").unwrap();
        assert_eq!(url.as_str(), "https://billing.example.com/api/");
    }

    #[test]
    fn base_url_with_api_suffix_is_kept() {
        let url = ApiClient::normalize_base_url("https://billing.example.com/api/").unwrap();
        assert_eq!(url.as_str(), "https://billing.example.com/api/");

        let url = ApiClient::normalize_base_url("http://localhost:8080/portal/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/portal/api/");
    }

    #[test]
    fn record_url_encodes_opaque_ids() {
        let client =
            ApiClient::from_reqwest("https://billing.example.com", reqwest::Client::new()).unwrap();
        let url = client.record_url(EntityKind::Vouchers, "abc/def").unwrap();
        assert_eq!(url.as_str(), "https://billing.example.com/api/vouchers/abc%2Fdef");
    }

    #[test]
    fn list_envelope_accepts_both_shapes() {
        let bare: ListEnvelope<u32> = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2, 3]);

        let wrapped: ListEnvelope<u32> = serde_json::from_str(r#"{"data":[4,5]}"#).unwrap();
        assert_eq!(wrapped.into_vec(), vec![4, 5]);
    }
}
