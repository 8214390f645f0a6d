use async_trait::async_trait;
use common::AccountId;
use domain::Order;

use crate::Result;

/// Core trait for order persistence.
///
/// All implementations must be thread-safe (Send + Sync); a single store is
/// shared by every in-flight request.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists an order header together with all of its line items.
    ///
    /// The write is atomic: either the header and every line item become
    /// visible, or nothing does.
    async fn save(&self, order: &Order) -> Result<()>;

    /// Returns every order placed by an account, oldest first, each with its
    /// full set of stored line items.
    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<Order>>;

    /// Releases the store's resources. Called once at shutdown.
    async fn close(&self);
}
