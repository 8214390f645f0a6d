//! Order persistence for the order service.
//!
//! Orders are written as one header row plus one row per line item, inside a
//! single transaction, and read back per account in creation order.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod retry;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use retry::{RetryPolicy, retry};
pub use store::OrderStore;
