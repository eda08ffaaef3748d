// src/integrations/hosted/client.rs
//
// REST client for the hosted data/auth/storage service
//
// ARCHITECTURE:
// - Collections under /rest/v1/{collection}, filtered with query params
// - Storage under /storage/v1/object/{bucket}/{path}
// - Auth under /auth/v1
// - Every request carries `apikey` and a bearer token (the session
//   token when signed in, the anon key otherwise)
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Status failures become AppError::Backend with the response body

use std::fmt::Display;
use std::sync::RwLock;
use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Filter/order/limit parameters for a collection request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn in_list(mut self, column: &str, ids: &[Uuid]) -> Self {
        let list = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.to_string(), format!("in.({})", list)));
        self
    }

    pub fn order(mut self, column: &str, descending: bool) -> Self {
        let dir = if descending { "desc" } else { "asc" };
        self.params.push(("order".to_string(), format!("{}.{}", column, dir)));
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.params.push(("limit".to_string(), n.to_string()));
        self
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.params.push(("offset".to_string(), n.to_string()));
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k == name)
    }

    /// Conflict target for idempotent inserts
    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.params.push(("on_conflict".to_string(), columns.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// How an insert treats rows that collide with an existing key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Fail,
    Merge,
}

impl Conflict {
    fn prefer(&self) -> &'static str {
        match self {
            Conflict::Fail => "return=minimal",
            Conflict::Merge => "return=minimal,resolution=merge-duplicates",
        }
    }
}

/// Rows requested per page by `select_all`
pub const PAGE_ROWS: u32 = 1000;

/// Page `offset..offset + PAGE_ROWS` of `query`, ordered by `id` unless
/// the query already orders its rows
pub fn page_query(query: &Query, offset: usize) -> Query {
    let mut page = query.clone();
    if !page.has("order") {
        page = page.order("id", false);
    }
    page.limit(PAGE_ROWS).offset(offset)
}

/// Total from a `Content-Range` header (`0-9/42`, `*/0`)
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

pub struct HostedClient {
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
    http: Client,
}

impl HostedClient {
    pub fn new(base_url: &str, anon_key: &str, access_token: Option<String>) -> AppResult<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(access_token),
            http,
        })
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    pub fn rest_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    pub fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, endpoint)
    }

    pub fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    pub fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    /// Request with `apikey` and bearer headers set
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    /// Pass successful responses through; turn the rest into `Backend`
    pub async fn check(response: Response, what: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Backend(format!("{} failed with {}: {}", what, status, body)))
    }

    // ========================================================================
    // COLLECTIONS
    // ========================================================================

    pub async fn select<T>(&self, collection: &str, query: &Query) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, &self.rest_url(collection))
            .header(header::ACCEPT, "application/json")
            .query(query.params())
            .send()
            .await?;
        let response = Self::check(response, &format!("select {}", collection)).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    /// Every matching row, read page by page.
    ///
    /// The server may cap a page below `PAGE_ROWS`, so reading stops only
    /// on an empty page. Costs one request per page plus one.
    pub async fn select_all<T>(&self, collection: &str, query: &Query) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut rows = Vec::new();
        loop {
            let page: Vec<T> = self.select(collection, &page_query(query, rows.len())).await?;
            if page.is_empty() {
                return Ok(rows);
            }
            rows.extend(page);
        }
    }

    /// Exact row count, without transferring rows
    pub async fn count(&self, collection: &str, query: &Query) -> AppResult<u64> {
        let response = self
            .request(Method::HEAD, &self.rest_url(collection))
            .header("Prefer", "count=exact")
            .query(query.params())
            .send()
            .await?;
        let response = Self::check(response, &format!("count {}", collection)).await?;

        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| {
                AppError::Backend(format!("count {}: missing Content-Range", collection))
            })
    }

    pub async fn insert<T>(&self, collection: &str, rows: &T, conflict: Conflict, query: &Query) -> AppResult<()>
    where
        T: Serialize + ?Sized,
    {
        let response = self
            .request(Method::POST, &self.rest_url(collection))
            .header("Prefer", conflict.prefer())
            .query(query.params())
            .json(rows)
            .send()
            .await?;
        Self::check(response, &format!("insert {}", collection)).await?;
        Ok(())
    }

    /// Patch matching rows; returns how many matched
    pub async fn update<T>(&self, collection: &str, query: &Query, patch: &T) -> AppResult<u64>
    where
        T: Serialize + ?Sized,
    {
        let response = self
            .request(Method::PATCH, &self.rest_url(collection))
            .header("Prefer", "return=representation")
            .query(query.params())
            .json(patch)
            .send()
            .await?;
        let response = Self::check(response, &format!("update {}", collection)).await?;
        let rows: Vec<serde_json::Value> = response.json().await?;
        Ok(rows.len() as u64)
    }

    /// Delete matching rows; returns how many were removed
    pub async fn delete(&self, collection: &str, query: &Query) -> AppResult<u64> {
        let response = self
            .request(Method::DELETE, &self.rest_url(collection))
            .header("Prefer", "return=representation")
            .query(query.params())
            .send()
            .await?;
        let response = Self::check(response, &format!("delete {}", collection)).await?;
        let rows: Vec<serde_json::Value> = response.json().await?;
        Ok(rows.len() as u64)
    }
}
