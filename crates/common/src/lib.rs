//! Identifier types shared across the order service crates.

pub mod types;

pub use types::{AccountId, OrderId, ProductId};
