//! Order orchestration across independently owned services.
//!
//! Placing an order:
//! 1. Validate the request
//! 2. Check the account and resolve the requested products, concurrently
//! 3. Price the resolved line items from that catalog snapshot
//! 4. Persist header and line items atomically
//!
//! Reading orders loads them from the store and refreshes line-item display
//! data from the catalog, leaving totals as they were when the order was placed.

pub mod deadline;
pub mod error;
pub mod orchestrator;
pub mod services;

pub use deadline::Deadline;
pub use error::OrderingError;
pub use orchestrator::OrderOrchestrator;
pub use services::{
    AccountService, CatalogService, HttpAccountService, HttpCatalogService,
    InMemoryAccountService, InMemoryCatalogService, ServiceError,
};
