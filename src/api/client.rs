//! Typed client for the catalog admin endpoints.
//!
//! Every response is a JSON envelope `{status, message?, data?}`. A request
//! succeeds only when the HTTP status is 2xx and `status == "success"`.

use super::error::ApiError;
use super::forms::{CategoryForm, SortOrderBody, SubcategoryForm};
use crate::catalog::{Category, Product, Subcategory};
use futures::StreamExt;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Upper bound on a single response body.
const MAX_RESPONSE_SIZE: usize = 8 * 1024 * 1024;

/// Retries for idempotent reads (writes are never retried).
const MAX_READ_RETRIES: u32 = 2;

const CATEGORIES_PATH: &str = "api/admin/product-categories";
const SUBCATEGORIES_PATH: &str = "api/admin/product-subcategories";
const PRODUCTS_PATH: &str = "api/admin/products";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    message: Option<String>,
    data: Option<T>,
}

/// Identity of a created or updated row plus the backend's confirmation text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveReceipt {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(skip)]
    pub message: Option<String>,
}

/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl CatalogClient {
    /// `base` must end with `/` so relative endpoint paths join beneath it
    /// (see `util::parse_base_url`).
    pub fn new(http: reqwest::Client, base: Url, timeout: Duration) -> Self {
        Self {
            http,
            base,
            timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    // ------------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------------

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_data(CATEGORIES_PATH, &[]).await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category, ApiError> {
        self.get_data(&format!("{}/{}", CATEGORIES_PATH, id), &[])
            .await
    }

    pub async fn create_category(&self, form: CategoryForm) -> Result<SaveReceipt, ApiError> {
        let form = form.validate()?;
        self.write(Method::POST, CATEGORIES_PATH, &form).await
    }

    pub async fn update_category(
        &self,
        id: i64,
        form: CategoryForm,
    ) -> Result<SaveReceipt, ApiError> {
        let form = form.validate()?;
        self.write(Method::PUT, &format!("{}/{}", CATEGORIES_PATH, id), &form)
            .await
    }

    // ------------------------------------------------------------------------
    // Subcategories
    // ------------------------------------------------------------------------

    /// Subcategories of one category, as ordered by the backend.
    pub async fn list_subcategories(&self, category_id: i64) -> Result<Vec<Subcategory>, ApiError> {
        let category_id = category_id.to_string();
        self.get_data(SUBCATEGORIES_PATH, &[("category_id", &category_id)])
            .await
    }

    /// Every subcategory regardless of category.
    pub async fn list_all_subcategories(&self) -> Result<Vec<Subcategory>, ApiError> {
        self.get_data(SUBCATEGORIES_PATH, &[]).await
    }

    pub async fn get_subcategory(&self, id: i64) -> Result<Subcategory, ApiError> {
        self.get_data(&format!("{}/subcategories/{}", CATEGORIES_PATH, id), &[])
            .await
    }

    pub async fn create_subcategory(&self, form: SubcategoryForm) -> Result<SaveReceipt, ApiError> {
        let form = form.validate()?;
        self.write(Method::POST, SUBCATEGORIES_PATH, &form).await
    }

    pub async fn update_subcategory(
        &self,
        id: i64,
        form: SubcategoryForm,
    ) -> Result<SaveReceipt, ApiError> {
        let form = form.validate()?;
        self.write(Method::PUT, &format!("{}/{}", SUBCATEGORIES_PATH, id), &form)
            .await
    }

    /// Partial update touching only `sort_order`.
    pub async fn update_subcategory_sort_order(
        &self,
        id: i64,
        sort_order: i64,
    ) -> Result<SaveReceipt, ApiError> {
        self.write(
            Method::PUT,
            &format!("{}/{}", SUBCATEGORIES_PATH, id),
            &SortOrderBody { sort_order },
        )
        .await
    }

    // ------------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------------

    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_data(PRODUCTS_PATH, &[]).await
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, ApiError> {
        self.get_data(&format!("{}/{}", PRODUCTS_PATH, id), &[])
            .await
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    /// GET with retry on transient failures: 250ms, 500ms.
    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let mut retry_count = 0;

        loop {
            let request = self.http.get(url.clone());
            match self.send::<T>(request).await {
                Ok((Some(data), _)) => return Ok(data),
                Ok((None, _)) => return Err(ApiError::MissingData),
                Err(e) if e.is_retryable() && retry_count < MAX_READ_RETRIES => {
                    let delay = 250u64 << retry_count;
                    tracing::debug!(
                        error = %e,
                        path,
                        retry = retry_count + 1,
                        delay_ms = delay,
                        "Retrying catalog read after transient error"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn write<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<SaveReceipt, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "Sending catalog write");

        let request = self.http.request(method, url).json(body);
        let (data, message) = self.send::<SaveReceipt>(request).await?;
        let mut receipt = data.ok_or(ApiError::MissingData)?;
        receipt.message = message;
        Ok(receipt)
    }

    /// Send a request and unwrap the envelope.
    ///
    /// Returns the `data` payload (if any) and the envelope message.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<(Option<T>, Option<String>), ApiError> {
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))?
            .map_err(ApiError::Network)?;

        let status = response.status();
        let body = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;

        let envelope = match serde_json::from_slice::<Envelope<T>>(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(ApiError::Decode(e)),
            Err(_) => {
                // Error page without an envelope; try to salvage a message.
                return Err(match error_message(&body) {
                    Some(message) => ApiError::Server {
                        status: status.as_u16(),
                        message,
                    },
                    None => ApiError::HttpStatus(status.as_u16()),
                });
            }
        };

        if !status.is_success() || envelope.status != "success" {
            let message = envelope.message.filter(|m| !m.trim().is_empty());
            tracing::debug!(
                status = status.as_u16(),
                envelope_status = %envelope.status,
                message = message.as_deref().unwrap_or(""),
                "Catalog request rejected"
            );
            return Err(match message {
                Some(message) => ApiError::Server {
                    status: status.as_u16(),
                    message,
                },
                None if !status.is_success() => ApiError::HttpStatus(status.as_u16()),
                None => ApiError::Server {
                    status: status.as_u16(),
                    message: "Request failed".to_string(),
                },
            });
        }

        Ok((envelope.data, envelope.message))
    }
}

/// Best-effort `message` from a body whose `data` did not decode.
fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
