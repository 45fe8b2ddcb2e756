//! Identity and time types shared by every resource.

use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned identifier of a persisted entity.
///
/// `EntityId` values are always UUIDv7, so ids sort in creation order and
/// never collide across collections. Clients never choose an id: the only
/// way to mint one is [`EntityId::generate`], which storage backends call at
/// insert time.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Mint a fresh identifier.
    pub fn generate() -> Self {
        // Uuid::now_v7() always yields a v7 UUID
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() should always return a valid v7 UUID")
    }

    /// Parse an identifier taken from a request path.
    ///
    /// Returns `None` for anything that is not the textual form of a UUIDv7.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim())
            .ok()
            .and_then(|uuid| Self::try_new(uuid).ok())
    }
}

/// A point in time recorded by the store (`createdAt` / `updatedAt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a new timestamp from a UTC `DateTime`.
    pub const fn new(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Creates a timestamp representing the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying `DateTime`.
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Converts the timestamp into the underlying `DateTime`.
    pub const fn into_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.into_datetime()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generated_ids_are_unique() {
        let first = EntityId::generate();
        let second = EntityId::generate();

        assert_ne!(first, second);
    }

    #[test]
    fn parse_round_trips_display() {
        let id = EntityId::generate();

        assert_eq!(EntityId::parse(&id.to_string()), Some(id));
    }

    #[test]
    fn parse_rejects_non_v7_uuids() {
        let v4 = "67e55044-10b1-426f-9247-bb680e5fe0c8";

        assert_eq!(EntityId::parse(v4), None);
    }

    #[test]
    fn parse_rejects_mongo_style_object_ids() {
        assert_eq!(EntityId::parse("64b7f0c2e1a4b2f9c8d3e5a1"), None);
    }

    proptest! {
        #[test]
        fn parse_never_accepts_arbitrary_short_text(s in "[a-zA-Z0-9 _-]{0,30}") {
            prop_assert_eq!(EntityId::parse(&s), None);
        }
    }
}
