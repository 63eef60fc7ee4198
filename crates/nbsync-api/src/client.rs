// Hand-crafted async HTTP client for the NetBox REST API.
//
// Base path: /api/
// Auth: `Authorization: Token <key>` (v1 tokens) or `Bearer nbt_...` (v2 tokens)

use async_stream::try_stream;
use futures_util::Stream;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{Object, Page};
use crate::transport::TransportConfig;

/// Default number of objects requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 250;

/// Prefix carried by NetBox v2 API tokens, which use the `Bearer` scheme.
const V2_TOKEN_PREFIX: &str = "nbt_";

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the NetBox REST API.
///
/// Every endpoint is addressed by its relative path under `/api/`
/// (e.g. `"dcim/devices/"`). Objects travel as untyped JSON maps.
pub struct NetboxClient {
    http: reqwest::Client,
    base_url: Url,
    page_size: u32,
}

impl NetboxClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, API token, and transport config.
    ///
    /// Injects the `Authorization` header on every request. The base URL
    /// may be the instance root (`https://netbox.example.com`) or already
    /// point at `/api`.
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth_value = HeaderValue::from_str(&authorization_value(token.expose_secret()))
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the page size used for list requests.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Build the base URL ending in `/api/`.
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

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"dcim/sites/"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
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
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let path = resp.url().path().to_owned();
        let raw = resp.text().await.unwrap_or_default();
        let message = error_message(status, &raw);

        match status {
            reqwest::StatusCode::UNAUTHORIZED => Error::Authentication { message },
            reqwest::StatusCode::FORBIDDEN => Error::Forbidden { message },
            reqwest::StatusCode::NOT_FOUND => Error::NotFound { path },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    // ── Pagination ───────────────────────────────────────────────────

    async fn fetch_page(
        &self,
        path: &str,
        filters: &[(String, String)],
        offset: u64,
    ) -> Result<Page<Object>, Error> {
        let mut params: Vec<(&str, String)> = filters
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        params.push(("limit", self.page_size.to_string()));
        params.push(("offset", offset.to_string()));

        self.get(path, &params).await
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Verify URL and token with a cheap authenticated read.
    pub async fn status(&self) -> Result<(), Error> {
        let _: Page<Value> = self
            .get("dcim/sites/", &[("limit", "1".to_owned())])
            .await?;
        Ok(())
    }

    /// List every object matching the given query filters, following
    /// pagination until the server reports no further page.
    pub async fn list(
        &self,
        path: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<Object>, Error> {
        let mut all = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let page = self.fetch_page(path, filters, offset).await?;
            let received = page.results.len();
            let last = page.next.is_none() || received == 0;
            all.extend(page.results);

            if last || u64::try_from(all.len()).unwrap_or(u64::MAX) >= page.count {
                break;
            }
            offset += u64::try_from(received).unwrap_or(u64::MAX);
        }

        Ok(all)
    }

    /// Lazily stream every object of a collection, one page at a time.
    ///
    /// Each call starts a fresh iteration from offset zero.
    pub fn iterate<'a>(
        &'a self,
        path: &'a str,
    ) -> impl Stream<Item = Result<Object, Error>> + Send + 'a {
        try_stream! {
            let mut offset: u64 = 0;
            loop {
                let page = self.fetch_page(path, &[], offset).await?;
                let received = page.results.len();
                let last = page.next.is_none() || received == 0;
                for obj in page.results {
                    yield obj;
                }
                if last {
                    break;
                }
                offset += u64::try_from(received).unwrap_or(u64::MAX);
            }
        }
    }

    /// Create one object (`POST {path}`).
    pub async fn create(&self, path: &str, body: &Object) -> Result<Object, Error> {
        self.post(path, body).await
    }

    /// Partially update one object (`PATCH {path}{id}/`).
    ///
    /// Fields absent from `body` are left untouched by the server.
    pub async fn update(&self, path: &str, id: i64, body: &Object) -> Result<Object, Error> {
        self.patch(&format!("{path}{id}/"), body).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn authorization_value(token: &str) -> String {
    if token.starts_with(V2_TOKEN_PREFIX) {
        format!("Bearer {token}")
    } else {
        format!("Token {token}")
    }
}

/// Turn an error body into a single readable line.
///
/// NetBox answers validation failures with `{"field": ["msg", ...]}`,
/// `{"__all__": [...]}` or `{"detail": "..."}`; bulk requests wrap those
/// in a list.
fn error_message(status: reqwest::StatusCode, raw: &str) -> String {
    let flattened = serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| flatten_error_body(&v))
        .filter(|m| !m.is_empty());

    match flattened {
        Some(msg) => msg,
        None if raw.trim().is_empty() => status.to_string(),
        None => raw.chars().take(200).collect(),
    }
}

fn flatten_error_body(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            if let Some(detail) = map.get("detail").and_then(Value::as_str) {
                return Some(detail.to_owned());
            }
            let parts: Vec<String> = map
                .iter()
                .map(|(field, msgs)| {
                    let msg = flatten_messages(msgs);
                    if field == "__all__" || field == "non_field_errors" {
                        msg
                    } else {
                        format!("{field}: {msg}")
                    }
                })
                .collect();
            Some(parts.join("; "))
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(flatten_error_body).collect();
            Some(parts.join("; "))
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn flatten_messages(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten_messages)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => flatten_error_body(value).unwrap_or_default(),
        other => other.to_string(),
    }
}
