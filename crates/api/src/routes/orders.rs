//! Order placement and account order listing endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::SecondsFormat;
use common::AccountId;
use domain::{LineItemRequest, Order, OrderedProduct};
use order_store::OrderStore;
use orchestrator::{AccountService, CatalogService, Deadline, OrderOrchestrator};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Optional request header carrying the caller's deadline in milliseconds.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Shared application state accessible from all handlers.
pub struct AppState<S, A, C>
where
    S: OrderStore,
    A: AccountService,
    C: CatalogService,
{
    pub orchestrator: OrderOrchestrator<S, A, C>,
    pub request_timeout: Duration,
    pub max_request_timeout: Duration,
}

impl<S, A, C> AppState<S, A, C>
where
    S: OrderStore,
    A: AccountService,
    C: CatalogService,
{
    pub fn new(
        orchestrator: OrderOrchestrator<S, A, C>,
        request_timeout: Duration,
        max_request_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator,
            request_timeout,
            max_request_timeout,
        }
    }

    /// Builds the deadline for one request from the timeout header, if any.
    ///
    /// Client-supplied timeouts are capped at `max_request_timeout`.
    pub fn deadline(&self, headers: &HeaderMap) -> Result<Deadline, ApiError> {
        let Some(value) = headers.get(REQUEST_TIMEOUT_HEADER) else {
            return Ok(Deadline::after(self.request_timeout));
        };

        let millis = value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "{REQUEST_TIMEOUT_HEADER} must be a positive number of milliseconds"
                ))
            })?;

        Ok(Deadline::after(
            Duration::from_millis(millis).min(self.max_request_timeout),
        ))
    }
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub account_id: String,
    #[serde(default)]
    pub products: Vec<LineItemDto>,
}

#[derive(Debug, Deserialize)]
pub struct LineItemDto {
    pub product_id: String,
    pub quantity: i64,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub account_id: String,
    pub created_at: String,
    pub total_price: f64,
    pub products: Vec<OrderedProductResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderedProductResponse {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
}

impl From<&OrderedProduct> for OrderedProductResponse {
    fn from(item: &OrderedProduct) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.to_decimal(),
            quantity: item.quantity,
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            account_id: order.account_id.to_string(),
            created_at: order
                .created_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            total_price: order.total_price.to_decimal(),
            products: order.products.iter().map(OrderedProductResponse::from).collect(),
        }
    }
}

// -- Handlers --

/// POST /orders: place an order for an account.
#[tracing::instrument(skip_all)]
pub async fn create<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    headers: HeaderMap,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    S: OrderStore + 'static,
    A: AccountService + 'static,
    C: CatalogService + 'static,
{
    let deadline = state.deadline(&headers)?;
    let Json(req) = payload?;

    let account_id = AccountId::new(req.account_id);
    let items: Vec<LineItemRequest> = req
        .products
        .into_iter()
        .map(|p| LineItemRequest::new(p.product_id, p.quantity))
        .collect();

    let order = state
        .orchestrator
        .create_order(&account_id, &items, deadline)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /accounts/{account_id}/orders: list an account's orders, oldest first.
#[tracing::instrument(skip(state, headers))]
pub async fn list_for_account<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    headers: HeaderMap,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: OrderStore + 'static,
    A: AccountService + 'static,
    C: CatalogService + 'static,
{
    let deadline = state.deadline(&headers)?;
    let orders = state
        .orchestrator
        .list_orders_for_account(&AccountId::new(account_id), deadline)
        .await?;

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}
