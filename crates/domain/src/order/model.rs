//! The persisted order.

use chrono::{DateTime, SubsecRound, Utc};
use common::{AccountId, OrderId};
use serde::{Deserialize, Serialize};

use super::{Money, OrderError, OrderedProduct, pricing};

/// An order placed by an account.
///
/// Orders are immutable once created. `total_price` is computed from the
/// line-item prices at creation and is never recomputed, even after the
/// line items' display prices are refreshed from the catalog on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub total_price: Money,
    pub products: Vec<OrderedProduct>,
}

impl Order {
    /// Creates a new order with a fresh ID and creation timestamp.
    ///
    /// The timestamp is truncated to microseconds so it survives a round
    /// trip through PostgreSQL unchanged.
    pub fn new(account_id: AccountId, products: Vec<OrderedProduct>) -> Result<Self, OrderError> {
        if products.is_empty() {
            return Err(OrderError::NoItems);
        }
        let total_price = pricing::total_price(&products)?;

        Ok(Self {
            id: OrderId::new(),
            account_id,
            created_at: Utc::now().trunc_subsecs(6),
            total_price,
            products,
        })
    }

    pub fn item_count(&self) -> usize {
        self.products.len()
    }

    /// Returns the line item for a product, if the order contains it.
    pub fn product(&self, product_id: &str) -> Option<&OrderedProduct> {
        self.products
            .iter()
            .find(|p| p.product_id.as_str() == product_id)
    }
}
