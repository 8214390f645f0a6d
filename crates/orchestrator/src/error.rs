//! Orchestration error types.

use common::AccountId;
use domain::OrderError;
use order_store::StoreError;
use thiserror::Error;

use crate::services::ServiceError;

/// Errors returned by order placement and retrieval.
///
/// None of these are retried here; the caller decides whether to resend the
/// whole request.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// The request was malformed (blank account, non-positive quantity, ...).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(OrderError),

    /// The account service did not confirm the account.
    #[error("Account not found: {account_id}")]
    AccountNotFound {
        account_id: AccountId,
        #[source]
        source: ServiceError,
    },

    /// The catalog service call failed.
    #[error("Products unavailable: {0}")]
    ProductsUnavailable(#[source] ServiceError),

    /// None of the requested products could be resolved.
    #[error("Order has no products available in the catalog")]
    EmptyOrder,

    /// Writing the order failed; nothing was persisted.
    #[error("Failed to persist order: {0}")]
    OrderPersistenceFailed(#[source] StoreError),

    /// Reading orders from the store failed.
    #[error("Failed to load orders: {0}")]
    OrderLookupFailed(#[source] StoreError),

    /// The request deadline passed; in-flight calls were cancelled.
    #[error("Request deadline exceeded")]
    Timeout,
}

impl OrderingError {
    /// Stable machine-readable code, used for metrics labels and responses.
    pub fn code(&self) -> &'static str {
        match self {
            OrderingError::InvalidParameter(_) => "invalid_parameter",
            OrderingError::AccountNotFound { .. } => "account_not_found",
            OrderingError::ProductsUnavailable(_) => "products_unavailable",
            OrderingError::EmptyOrder => "empty_order",
            OrderingError::OrderPersistenceFailed(_) => "order_persistence_failed",
            OrderingError::OrderLookupFailed(_) => "order_lookup_failed",
            OrderingError::Timeout => "timeout",
        }
    }
}

impl From<OrderError> for OrderingError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NoItems => OrderingError::EmptyOrder,
            other => OrderingError::InvalidParameter(other),
        }
    }
}
