use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::AccountId;
use domain::Order;
use tokio::sync::RwLock;

use crate::{Result, StoreError, store::OrderStore};

/// In-memory order store implementation for testing.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// switches to make reads or writes fail.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
    fail_on_save: Arc<AtomicBool>,
    fail_on_find: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Makes subsequent `save` calls fail without storing anything.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `find_by_account` calls fail.
    pub fn set_fail_on_find(&self, fail: bool) {
        self.fail_on_find.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: &Order) -> Result<()> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("save disabled".to_string()));
        }

        let mut orders = self.orders.write().await;
        if orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<Order>> {
        if self.fail_on_find.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("find disabled".to_string()));
        }

        let orders = self.orders.read().await;
        let mut found: Vec<Order> = orders
            .iter()
            .filter(|o| &o.account_id == account_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, OrderedProduct, Product};

    fn order_for(account: &str, products: &[(&str, i64, u32)]) -> Order {
        let items = products
            .iter()
            .map(|(id, cents, q)| {
                OrderedProduct::from_product(
                    &Product::new(*id, *id, "", Money::from_cents(*cents)),
                    *q,
                )
            })
            .collect();
        Order::new(AccountId::new(account), items).unwrap()
    }

    #[tokio::test]
    async fn save_and_find_by_account() {
        let store = InMemoryOrderStore::new();
        let order = order_for("A1", &[("P1", 1000, 2), ("P2", 500, 1)]);

        store.save(&order).await.unwrap();

        let found = store.find_by_account(&AccountId::new("A1")).await.unwrap();
        assert_eq!(found, vec![order]);
        assert!(
            store
                .find_by_account(&AccountId::new("A2"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn orders_come_back_in_creation_order() {
        let store = InMemoryOrderStore::new();
        let first = order_for("A1", &[("P1", 100, 1)]);
        let second = order_for("A1", &[("P2", 200, 1)]);

        store.save(&second).await.unwrap();
        store.save(&first).await.unwrap();

        let found = store.find_by_account(&AccountId::new("A1")).await.unwrap();
        let ids: Vec<_> = found.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn duplicate_save_is_rejected() {
        let store = InMemoryOrderStore::new();
        let order = order_for("A1", &[("P1", 100, 1)]);

        store.save(&order).await.unwrap();
        let result = store.save(&order).await;

        assert!(matches!(result, Err(StoreError::DuplicateOrder(id)) if id == order.id));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn failing_save_stores_nothing() {
        let store = InMemoryOrderStore::new();
        store.set_fail_on_save(true);

        let result = store.save(&order_for("A1", &[("P1", 100, 1)])).await;
        assert!(result.is_err());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn failing_find_reports_unavailable() {
        let store = InMemoryOrderStore::new();
        store.set_fail_on_find(true);

        let result = store.find_by_account(&AccountId::new("A1")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
