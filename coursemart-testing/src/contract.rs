//! Behavioural contract for [`DocumentStore`] implementations.
//!
//! Each `test_*` function builds a fresh store with `make_store`, runs one
//! scenario and reports the first broken expectation.

use std::fmt;
use std::future::Future;

use coursemart::{Collection, Document, DocumentStore, EntityId, StoreError};
use serde_json::{json, Value};

const PRIMARY: Collection = Collection::new("contract_documents");
const SECONDARY: Collection = Collection::new("contract_other");

/// A broken expectation, tagged with the scenario that found it.
#[derive(Debug)]
pub struct ContractTestFailure {
    scenario: &'static str,
    detail: String,
}

impl ContractTestFailure {
    fn new(scenario: &'static str, detail: impl Into<String>) -> Self {
        Self {
            scenario,
            detail: detail.into(),
        }
    }

    fn store_error(scenario: &'static str, operation: &'static str, error: StoreError) -> Self {
        Self::new(
            scenario,
            format!("{operation} operation returned unexpected error: {error}"),
        )
    }

    fn assertion(scenario: &'static str, detail: impl Into<String>) -> Self {
        Self::new(scenario, detail)
    }
}

impl fmt::Display for ContractTestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.scenario, self.detail)
    }
}

impl std::error::Error for ContractTestFailure {}

/// Outcome of one contract scenario.
pub type ContractTestResult = Result<(), ContractTestFailure>;

/// A body tagged with a marker unique to this run.
///
/// Backends may share a database between tests, so scenarios only ever look
/// at documents carrying their own marker.
fn marked_body(marker: &str, sequence: u32) -> Value {
    json!({ "marker": marker, "sequence": sequence })
}

fn fresh_marker() -> String {
    EntityId::generate().to_string()
}

fn carries_marker(document: &Document, marker: &str) -> bool {
    document.body.get("marker").and_then(Value::as_str) == Some(marker)
}

async fn insert_step<S: DocumentStore>(
    scenario: &'static str,
    store: &S,
    collection: Collection,
    body: Value,
) -> Result<Document, ContractTestFailure> {
    store
        .insert(collection, body)
        .await
        .map_err(|error| ContractTestFailure::store_error(scenario, "insert", error))
}

async fn find_step<S: DocumentStore>(
    scenario: &'static str,
    store: &S,
    collection: Collection,
    id: EntityId,
) -> Result<Option<Document>, ContractTestFailure> {
    store
        .find_by_id(collection, id)
        .await
        .map_err(|error| ContractTestFailure::store_error(scenario, "find_by_id", error))
}

/// `insert` assigns a fresh id and timestamps, and the body reads back intact.
pub async fn test_insert_assigns_identity<F, Fut, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
    S: DocumentStore,
{
    const SCENARIO: &str = "insert_assigns_identity";

    let store = make_store().await;
    let marker = fresh_marker();

    let first = insert_step(SCENARIO, &store, PRIMARY, marked_body(&marker, 0)).await?;
    let second = insert_step(SCENARIO, &store, PRIMARY, marked_body(&marker, 0)).await?;

    if first.id == second.id {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("identical bodies were given the same id {}", first.id),
        ));
    }

    if first.created_at != first.updated_at {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "a fresh document should have equal creation and update times",
        ));
    }

    let found = find_step(SCENARIO, &store, PRIMARY, first.id).await?;
    match found {
        Some(document) if document == first => Ok(()),
        Some(document) => Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("read back {document:?}, inserted {first:?}"),
        )),
        None => Err(ContractTestFailure::assertion(
            SCENARIO,
            "inserted document could not be found by id",
        )),
    }
}

/// `find_by_id` of an id never inserted is `None`, not an error.
pub async fn test_find_missing_returns_none<F, Fut, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
    S: DocumentStore,
{
    const SCENARIO: &str = "find_missing_returns_none";

    let store = make_store().await;

    match find_step(SCENARIO, &store, PRIMARY, EntityId::generate()).await? {
        None => Ok(()),
        Some(document) => Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("never-inserted id returned {document:?}"),
        )),
    }
}

/// `find_all` returns documents oldest first.
pub async fn test_find_all_lists_in_insertion_order<F, Fut, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
    S: DocumentStore,
{
    const SCENARIO: &str = "find_all_lists_in_insertion_order";

    let store = make_store().await;
    let marker = fresh_marker();

    let mut inserted = Vec::new();
    for sequence in 0..3 {
        inserted.push(insert_step(SCENARIO, &store, PRIMARY, marked_body(&marker, sequence)).await?);
    }

    let listed: Vec<EntityId> = store
        .find_all(PRIMARY)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "find_all", error))?
        .into_iter()
        .filter(|document| carries_marker(document, &marker))
        .map(|document| document.id)
        .collect();
    let expected: Vec<EntityId> = inserted.iter().map(|document| document.id).collect();

    if listed == expected {
        Ok(())
    } else {
        Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("expected {expected:?} in that order, listed {listed:?}"),
        ))
    }
}

/// `replace` swaps the body but keeps the id and creation time.
pub async fn test_replace_preserves_identity<F, Fut, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
    S: DocumentStore,
{
    const SCENARIO: &str = "replace_preserves_identity";

    let store = make_store().await;
    let marker = fresh_marker();
    let original = insert_step(SCENARIO, &store, PRIMARY, marked_body(&marker, 0)).await?;

    let replaced = store
        .replace(PRIMARY, original.id, marked_body(&marker, 1))
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "replace", error))?
        .ok_or_else(|| {
            ContractTestFailure::assertion(SCENARIO, "replace reported an existing id as missing")
        })?;

    if replaced.id != original.id || replaced.created_at != original.created_at {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "replace changed the id or creation time",
        ));
    }

    if replaced.updated_at < original.updated_at {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "replace moved the update time backwards",
        ));
    }

    let found = find_step(SCENARIO, &store, PRIMARY, original.id).await?;
    match found {
        Some(document) if document.body == marked_body(&marker, 1) => Ok(()),
        other => Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("expected the replaced body, read {other:?}"),
        )),
    }
}

/// `replace` of an unknown id is `None` and creates nothing.
pub async fn test_replace_missing_returns_none<F, Fut, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
    S: DocumentStore,
{
    const SCENARIO: &str = "replace_missing_returns_none";

    let store = make_store().await;
    let missing = EntityId::generate();

    let result = store
        .replace(PRIMARY, missing, json!({}))
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "replace", error))?;

    if result.is_some() {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "replace of a missing id reported success",
        ));
    }

    match find_step(SCENARIO, &store, PRIMARY, missing).await? {
        None => Ok(()),
        Some(_) => Err(ContractTestFailure::assertion(
            SCENARIO,
            "replace of a missing id created a document",
        )),
    }
}

/// `delete` removes exactly one document and reports whether it existed.
pub async fn test_delete_removes_document<F, Fut, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
    S: DocumentStore,
{
    const SCENARIO: &str = "delete_removes_document";

    let store = make_store().await;
    let marker = fresh_marker();
    let document = insert_step(SCENARIO, &store, PRIMARY, marked_body(&marker, 0)).await?;

    let removed = store
        .delete(PRIMARY, document.id)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "delete", error))?;
    if !removed {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "delete of an existing id reported nothing removed",
        ));
    }

    if find_step(SCENARIO, &store, PRIMARY, document.id).await?.is_some() {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "deleted document is still readable",
        ));
    }

    let removed_again = store
        .delete(PRIMARY, document.id)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "delete", error))?;
    if removed_again {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "second delete of the same id reported a removal",
        ));
    }

    let listed = store
        .find_all(PRIMARY)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "find_all", error))?;
    if listed.iter().any(|listed| carries_marker(listed, &marker)) {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "deleted document is still listed",
        ));
    }

    Ok(())
}

/// Documents in one collection are invisible to another.
pub async fn test_collections_are_isolated<F, Fut, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
    S: DocumentStore,
{
    const SCENARIO: &str = "collections_are_isolated";

    let store = make_store().await;
    let marker = fresh_marker();
    let document = insert_step(SCENARIO, &store, PRIMARY, marked_body(&marker, 0)).await?;

    if find_step(SCENARIO, &store, SECONDARY, document.id).await?.is_some() {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "document was readable through another collection",
        ));
    }

    let listed = store
        .find_all(SECONDARY)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "find_all", error))?;
    if listed.iter().any(|listed| carries_marker(listed, &marker)) {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "document was listed in another collection",
        ));
    }

    let removed = store
        .delete(SECONDARY, document.id)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "delete", error))?;
    if removed {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "delete through another collection removed the document",
        ));
    }

    Ok(())
}

/// Generate one `#[tokio::test]` per contract scenario inside `mod $suite`.
///
/// Attributes given before `suite` (for example `#[ignore]`) are applied to
/// every generated test.
#[macro_export]
macro_rules! document_store_contract_tests {
    ($(#[$attr:meta])* suite = $suite:ident, make_store = $make_store:expr $(,)?) => {
        #[allow(non_snake_case)]
        mod $suite {
            #[allow(unused_imports)]
            use super::*;
            use $crate::contract::{
                test_collections_are_isolated, test_delete_removes_document,
                test_find_all_lists_in_insertion_order, test_find_missing_returns_none,
                test_insert_assigns_identity, test_replace_missing_returns_none,
                test_replace_preserves_identity,
            };

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn insert_assigns_identity_contract() {
                test_insert_assigns_identity($make_store)
                    .await
                    .expect("document store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn find_missing_returns_none_contract() {
                test_find_missing_returns_none($make_store)
                    .await
                    .expect("document store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn find_all_lists_in_insertion_order_contract() {
                test_find_all_lists_in_insertion_order($make_store)
                    .await
                    .expect("document store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn replace_preserves_identity_contract() {
                test_replace_preserves_identity($make_store)
                    .await
                    .expect("document store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn replace_missing_returns_none_contract() {
                test_replace_missing_returns_none($make_store)
                    .await
                    .expect("document store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn delete_removes_document_contract() {
                test_delete_removes_document($make_store)
                    .await
                    .expect("document store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn collections_are_isolated_contract() {
                test_collections_are_isolated($make_store)
                    .await
                    .expect("document store contract failed");
            }
        }
    };
}

pub use document_store_contract_tests;
