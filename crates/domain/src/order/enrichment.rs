//! Refreshing stored line items with current catalog data.

use std::collections::{HashMap, HashSet};

use common::ProductId;

use super::{Order, Product};

/// Collects the distinct product IDs referenced by a set of orders.
pub fn distinct_product_ids(orders: &[Order]) -> HashSet<ProductId> {
    orders
        .iter()
        .flat_map(|order| order.products.iter())
        .map(|item| item.product_id.clone())
        .collect()
}

/// Overwrites the name, description and unit price of every line item with
/// the matching catalog entry.
///
/// Quantities and order totals are left alone. Line items whose product is
/// no longer in the catalog keep their stored values. Returns the number of
/// line items that were refreshed.
pub fn enrich_orders(orders: &mut [Order], catalog: &[Product]) -> usize {
    let by_id: HashMap<&ProductId, &Product> = catalog.iter().map(|p| (&p.id, p)).collect();
    let mut refreshed = 0;

    for item in orders.iter_mut().flat_map(|o| o.products.iter_mut()) {
        if let Some(product) = by_id.get(&item.product_id) {
            item.name.clone_from(&product.name);
            item.description.clone_from(&product.description);
            item.price = product.price;
            refreshed += 1;
        }
    }

    refreshed
}
