//! Catalog service trait, HTTP client and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use domain::{Money, Product};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{ServiceError, http_client, join_segments, parse_base_url};

/// Batch resolution of products owned by the catalog service.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Returns the products among `ids` that exist in the catalog.
    ///
    /// Unknown IDs are left out of the result rather than reported as
    /// errors. An empty `ids` slice asks the catalog for an unfiltered page,
    /// so order workflows never pass one.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    /// Unit price in decimal currency units.
    price: f64,
}

impl TryFrom<ProductResponse> for Product {
    type Error = ServiceError;

    fn try_from(p: ProductResponse) -> Result<Self, Self::Error> {
        let price = Money::from_decimal(p.price)
            .ok_or_else(|| ServiceError::Decode(format!("invalid price for product {}", p.id)))?;
        Ok(Product::new(p.id, p.name, p.description, price))
    }
}

/// Catalog service client speaking JSON over HTTP.
///
/// `GET {base}/products?ids=P1,P2` answers `200 [{"id", "name", "description", "price"}]`.
#[derive(Debug, Clone)]
pub struct HttpCatalogService {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpCatalogService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        Ok(Self {
            client: http_client()?,
            base_url: parse_base_url(base_url)?,
        })
    }
}

#[async_trait]
impl CatalogService for HttpCatalogService {
    #[tracing::instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, ServiceError> {
        let joined = ids
            .iter()
            .map(ProductId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = join_segments(&self.base_url, &["products"]);

        let response = self
            .client
            .get(url)
            .query(&[("ids", joined.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Unavailable(format!(
                "catalog service returned {status}"
            )));
        }

        let body: Vec<ProductResponse> = response
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        let products = body
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(resolved = products.len(), "catalog lookup complete");
        Ok(products)
    }
}

/// In-memory catalog service for testing.
///
/// Prices can be changed between calls to simulate a live catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogService {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    fail: Arc<AtomicBool>,
    delay_ms: Arc<AtomicU64>,
    requests: Arc<RwLock<Vec<Vec<ProductId>>>>,
    completed: Arc<AtomicUsize>,
}

impl InMemoryCatalogService {
    /// Creates a new empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub async fn upsert(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    /// Changes the current price of a product, if it exists.
    pub async fn set_price(&self, id: &ProductId, price: Money) {
        if let Some(product) = self.products.write().await.get_mut(id) {
            product.price = price;
        }
    }

    /// Removes a product from the catalog.
    pub async fn remove(&self, id: &ProductId) {
        self.products.write().await.remove(id);
    }

    /// Makes every lookup fail as if the service were down.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Delays every lookup, to exercise deadlines and cancellation.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// ID lists of every lookup started, in call order.
    pub async fn requests(&self) -> Vec<Vec<ProductId>> {
        self.requests.read().await.clone()
    }

    /// Number of lookups started.
    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Number of lookups that ran to completion (were not cancelled).
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalogService {
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, ServiceError> {
        self.requests.write().await.push(ids.to_vec());

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("catalog service down".to_string()));
        }

        let products = self.products.read().await;
        if ids.is_empty() {
            let mut all: Vec<Product> = products.values().cloned().collect();
            all.sort_by(|a, b| a.id.cmp(&b.id));
            return Ok(all);
        }
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }
}
