//! Runs the shared document store contract against the in-memory backend.

use coursemart_memory::InMemoryDocumentStore;
use coursemart_testing::document_store_contract_tests;

document_store_contract_tests! {
    suite = in_memory,
    make_store = || async { InMemoryDocumentStore::new() },
}
