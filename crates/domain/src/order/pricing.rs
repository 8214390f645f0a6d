//! Request validation, line-item resolution and point-in-time totals.
//!
//! Everything here is synchronous and side-effect free; the orchestrator
//! calls it between the remote lookups and the store write.

use std::collections::HashMap;

use common::{AccountId, ProductId};

use super::{LineItemRequest, Money, OrderError, OrderedProduct, Product, RequestedItem};

/// Largest quantity a single line item may carry; line items are stored as
/// 32-bit signed integers.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Separates product IDs in a catalog lookup, so it cannot appear in one.
const PRODUCT_ID_SEPARATOR: char = ',';

/// Validates an order request before any remote call is made.
///
/// Quantities must lie in `1..=MAX_QUANTITY`. Duplicate product IDs are
/// merged by summing their quantities, and the sum is held to the same
/// bound; the result keeps the order in which each product first appeared.
pub fn validate_request(
    account_id: &AccountId,
    items: &[LineItemRequest],
) -> Result<Vec<RequestedItem>, OrderError> {
    if account_id.is_blank() {
        return Err(OrderError::AccountIdRequired);
    }
    if items.is_empty() {
        return Err(OrderError::NoItems);
    }

    let mut merged: Vec<RequestedItem> = Vec::with_capacity(items.len());
    let mut index: HashMap<&ProductId, usize> = HashMap::with_capacity(items.len());

    for item in items {
        if item.product_id.is_blank() {
            return Err(OrderError::ProductIdRequired);
        }
        if item.product_id.as_str().contains(PRODUCT_ID_SEPARATOR) {
            return Err(OrderError::InvalidProductId(item.product_id.to_string()));
        }
        let quantity = positive_quantity(item)?;

        match index.get(&item.product_id) {
            Some(&pos) => {
                let existing = &mut merged[pos];
                existing.quantity =
                    existing
                        .quantity
                        .checked_add(quantity)
                        .filter(|q| *q <= MAX_QUANTITY)
                        .ok_or(OrderError::InvalidQuantity {
                            product_id: item.product_id.to_string(),
                            quantity: item.quantity,
                        })?;
            }
            None => {
                index.insert(&item.product_id, merged.len());
                merged.push(RequestedItem {
                    product_id: item.product_id.clone(),
                    quantity,
                });
            }
        }
    }

    Ok(merged)
}

fn positive_quantity(item: &LineItemRequest) -> Result<u32, OrderError> {
    u32::try_from(item.quantity)
        .ok()
        .filter(|q| (1..=MAX_QUANTITY).contains(q))
        .ok_or(OrderError::InvalidQuantity {
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
        })
}

/// Intersects the requested items with a catalog snapshot.
///
/// Each requested product found in the snapshot becomes a line item carrying
/// the snapshot's name, description and price. Requested products missing
/// from the snapshot are left out. Output follows request order.
pub fn resolve_line_items(requested: &[RequestedItem], catalog: &[Product]) -> Vec<OrderedProduct> {
    let by_id: HashMap<&ProductId, &Product> = catalog.iter().map(|p| (&p.id, p)).collect();

    requested
        .iter()
        .filter(|item| item.quantity > 0)
        .filter_map(|item| {
            by_id
                .get(&item.product_id)
                .map(|product| OrderedProduct::from_product(product, item.quantity))
        })
        .collect()
}

/// Returns the requested product IDs missing from a catalog snapshot.
pub fn unresolved_product_ids(requested: &[RequestedItem], catalog: &[Product]) -> Vec<ProductId> {
    requested
        .iter()
        .filter(|item| !catalog.iter().any(|p| p.id == item.product_id))
        .map(|item| item.product_id.clone())
        .collect()
}

/// Computes `Σ price × quantity` over the line items.
pub fn total_price(items: &[OrderedProduct]) -> Result<Money, OrderError> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        item.line_total()
            .and_then(|line| acc.checked_add(line))
            .ok_or(OrderError::TotalOverflow)
    })
}
