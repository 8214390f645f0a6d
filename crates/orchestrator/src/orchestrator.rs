//! Order orchestrator: placement and account-scoped retrieval.

use common::{AccountId, ProductId};
use domain::{
    LineItemRequest, Order, OrderError, distinct_product_ids, enrich_orders, resolve_line_items,
    unresolved_product_ids, validate_request,
};
use order_store::OrderStore;

use crate::deadline::Deadline;
use crate::error::OrderingError;
use crate::services::{AccountService, CatalogService};

/// Places and retrieves orders across the account service, the catalog
/// service and the order store.
///
/// Holds no per-request state; one instance serves all concurrent requests.
pub struct OrderOrchestrator<S, A, C>
where
    S: OrderStore,
    A: AccountService,
    C: CatalogService,
{
    store: S,
    accounts: A,
    catalog: C,
}

impl<S, A, C> OrderOrchestrator<S, A, C>
where
    S: OrderStore,
    A: AccountService,
    C: CatalogService,
{
    /// Creates a new orchestrator over the given collaborators.
    pub fn new(store: S, accounts: A, catalog: C) -> Self {
        Self {
            store,
            accounts,
            catalog,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for an account.
    ///
    /// The account check and the catalog lookup run concurrently under the
    /// request deadline; the first failure cancels the other call. The order
    /// is priced from that single catalog snapshot and written only after
    /// both lookups succeed.
    ///
    /// A `Timeout` while saving does not prove nothing was written: the
    /// commit may reach the database just as the deadline cancels the call.
    #[tracing::instrument(skip_all, fields(account_id = %account_id, items = items.len()))]
    pub async fn create_order(
        &self,
        account_id: &AccountId,
        items: &[LineItemRequest],
        deadline: Deadline,
    ) -> Result<Order, OrderingError> {
        let start = std::time::Instant::now();
        let result = self.place_order(account_id, items, deadline).await;

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total_price = %order.total_price,
                    line_items = order.products.len(),
                    "order created"
                );
            }
            Err(e) => {
                metrics::counter!("order_creation_failures_total", "reason" => e.code())
                    .increment(1);
                tracing::warn!(error = %e, "order creation failed");
            }
        }
        metrics::histogram!("order_creation_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn place_order(
        &self,
        account_id: &AccountId,
        items: &[LineItemRequest],
        deadline: Deadline,
    ) -> Result<Order, OrderingError> {
        // 1. Reject malformed requests before any remote call
        let requested = validate_request(account_id, items)?;
        let product_ids: Vec<ProductId> =
            requested.iter().map(|i| i.product_id.clone()).collect();

        // 2. Account check and catalog snapshot, concurrently
        let account_check = async {
            self.accounts
                .get_account(account_id)
                .await
                .map_err(|source| OrderingError::AccountNotFound {
                    account_id: account_id.clone(),
                    source,
                })
        };
        let catalog_lookup = async {
            self.catalog
                .get_products(&product_ids)
                .await
                .map_err(OrderingError::ProductsUnavailable)
        };

        let (account, snapshot) = deadline
            .run(async { tokio::try_join!(account_check, catalog_lookup) })
            .await
            .map_err(|_| OrderingError::Timeout)??;

        tracing::debug!(
            account_name = %account.name,
            resolved = snapshot.len(),
            "account confirmed and catalog snapshot taken"
        );

        // 3. Price the line items from the snapshot
        let line_items = resolve_line_items(&requested, &snapshot);
        let missing = unresolved_product_ids(&requested, &snapshot);
        if !missing.is_empty() {
            tracing::warn!(?missing, "requested products not in catalog, leaving them out");
        }
        if line_items.is_empty() {
            return Err(OrderingError::EmptyOrder);
        }
        let order = Order::new(account_id.clone(), line_items)?;

        // 4. Persist header and line items in one transaction
        deadline
            .run(self.store.save(&order))
            .await
            .map_err(|_| OrderingError::Timeout)?
            .map_err(OrderingError::OrderPersistenceFailed)?;

        Ok(order)
    }

    /// Lists an account's orders, oldest first, with line-item names,
    /// descriptions and unit prices refreshed from the catalog.
    ///
    /// Totals are returned exactly as stored. If the catalog cannot be
    /// reached in time the stored line-item data is returned instead.
    #[tracing::instrument(skip_all, fields(account_id = %account_id))]
    pub async fn list_orders_for_account(
        &self,
        account_id: &AccountId,
        deadline: Deadline,
    ) -> Result<Vec<Order>, OrderingError> {
        if account_id.is_blank() {
            return Err(OrderingError::InvalidParameter(
                OrderError::AccountIdRequired,
            ));
        }
        metrics::counter!("order_queries_total").increment(1);

        let mut orders = deadline
            .run(self.store.find_by_account(account_id))
            .await
            .map_err(|_| OrderingError::Timeout)?
            .map_err(OrderingError::OrderLookupFailed)?;

        let mut product_ids: Vec<ProductId> = distinct_product_ids(&orders).into_iter().collect();
        if product_ids.is_empty() {
            return Ok(orders);
        }
        product_ids.sort();

        // One catalog call for every product across every order
        match deadline.run(self.catalog.get_products(&product_ids)).await {
            Ok(Ok(products)) => {
                let refreshed = enrich_orders(&mut orders, &products);
                tracing::debug!(
                    orders = orders.len(),
                    products = product_ids.len(),
                    refreshed,
                    "orders enriched from catalog"
                );
            }
            Ok(Err(e)) => {
                metrics::counter!("order_enrichment_degraded_total").increment(1);
                tracing::warn!(error = %e, "catalog lookup failed, returning stored line items");
            }
            Err(_) => {
                metrics::counter!("order_enrichment_degraded_total").increment(1);
                tracing::warn!("catalog lookup timed out, returning stored line items");
            }
        }

        Ok(orders)
    }
}
