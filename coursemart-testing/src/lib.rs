//! Test support shared by every coursemart storage backend.
//!
//! - [`contract`]: behavioural scenarios any `DocumentStore` must satisfy,
//!   plus the `document_store_contract_tests!` macro that turns them into
//!   `#[tokio::test]` functions for a concrete backend.
//! - [`faults`]: a wrapper store that fails chosen operations, for exercising
//!   error paths above the storage layer.

#![forbid(unsafe_code)]

pub mod contract;
pub mod faults;

pub use faults::FaultyStore;
