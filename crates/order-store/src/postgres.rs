use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AccountId, OrderId, ProductId};
use domain::{Money, Order, OrderedProduct};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{Result, StoreError, store::OrderStore};

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and brings the schema up to date.
    ///
    /// Fails if the database is unreachable; callers at startup wrap this in
    /// a [`crate::RetryPolicy`].
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        let store = Self::new(pool);
        store.run_migrations().await?;
        Ok(store)
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_line_item(order_id: OrderId, row: &PgRow) -> Result<Option<OrderedProduct>> {
        let Some(product_id) = row.try_get::<Option<String>, _>("product_id")? else {
            return Ok(None);
        };
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| StoreError::Corrupt {
            order_id,
            reason: format!("negative quantity {quantity} for product {product_id}"),
        })?;

        Ok(Some(OrderedProduct {
            product_id: ProductId::new(product_id),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            quantity,
        }))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id, items = order.products.len()))]
    async fn save(&self, order: &Order) -> Result<()> {
        let start = std::time::Instant::now();

        // Header and line items commit together or not at all
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, account_id, created_at, total_price_cents)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.account_id.as_str())
        .bind(order.created_at)
        .bind(order.total_price.cents())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::DuplicateOrder(order.id);
            }
            StoreError::Database(e)
        })?;

        for (position, item) in order.products.iter().enumerate() {
            let quantity = i32::try_from(item.quantity).map_err(|_| StoreError::Corrupt {
                order_id: order.id,
                reason: format!("quantity {} does not fit the schema", item.quantity),
            })?;

            sqlx::query(
                r#"
                INSERT INTO order_products (order_id, position, product_id, name, description, price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_str())
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.price.cents())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        metrics::histogram!("order_store_save_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.account_id, o.created_at, o.total_price_cents,
                   p.product_id, p.name, p.description, p.price_cents, p.quantity
            FROM orders o
            LEFT JOIN order_products p ON p.order_id = o.id
            WHERE o.account_id = $1
            ORDER BY o.created_at ASC, o.id ASC, p.position ASC
            "#,
        )
        .bind(account_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut orders: Vec<Order> = Vec::new();
        for row in rows {
            let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);

            let is_new_order = orders.last().is_none_or(|o| o.id != order_id);
            if is_new_order {
                orders.push(Order {
                    id: order_id,
                    account_id: AccountId::new(row.try_get::<String, _>("account_id")?),
                    created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                    total_price: Money::from_cents(row.try_get("total_price_cents")?),
                    products: Vec::new(),
                });
            }

            if let Some(item) = Self::row_to_line_item(order_id, &row)?
                && let Some(order) = orders.last_mut()
            {
                order.products.push(item);
            }
        }

        tracing::debug!(orders = orders.len(), "loaded orders for account");
        Ok(orders)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("order store connection pool closed");
    }
}
