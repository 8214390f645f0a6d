//! Order model, validation, pricing and enrichment.

mod enrichment;
mod model;
mod pricing;
mod value_objects;

pub use enrichment::{distinct_product_ids, enrich_orders};
pub use model::Order;
pub use pricing::{
    MAX_QUANTITY, resolve_line_items, total_price, unresolved_product_ids, validate_request,
};
pub use value_objects::{
    Account, LineItemRequest, Money, OrderedProduct, Product, RequestedItem,
};

use thiserror::Error;

/// Errors that can occur while building an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Account ID is required.
    #[error("Account ID is required")]
    AccountIdRequired,

    /// A requested line item has no product ID.
    #[error("Product ID is required for every line item")]
    ProductIdRequired,

    /// A product ID contains a character reserved by catalog lookups.
    #[error("Invalid product ID: {0}")]
    InvalidProductId(String),

    /// Invalid quantity.
    #[error("Invalid quantity for product {product_id}: {quantity} (must be between 1 and 2147483647)")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// The order total does not fit in the money representation.
    #[error("Order total overflows")]
    TotalOverflow,
}
