//! Domain layer for the order service.
//!
//! This crate provides the order model and the pure, synchronous parts of
//! order placement and retrieval:
//! - Money and line-item value objects
//! - Request validation and resolution against a catalog snapshot
//! - Point-in-time totals
//! - Read-time enrichment with current catalog data

pub mod order;

pub use common::{AccountId, OrderId, ProductId};
pub use order::{
    Account, LineItemRequest, MAX_QUANTITY, Money, Order, OrderError, OrderedProduct, Product,
    RequestedItem, distinct_product_ids, enrich_orders, resolve_line_items, total_price,
    unresolved_product_ids, validate_request,
};
