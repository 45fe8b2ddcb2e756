//! Shared vocabulary for the coursemart marketplace backend.
//!
//! This crate holds everything the HTTP layer and the storage adapters agree
//! on:
//!
//! - Identity and time: [`EntityId`], [`Timestamp`]
//! - Persistence seam: the [`DocumentStore`] trait and its [`Document`] type
//! - The generic CRUD contract: [`Resource`], [`Capabilities`] and
//!   [`ResourceContract`]
//! - The two resource models: [`Shop`] (courses) and [`Event`]
//! - Errors: [`StoreError`], [`ValidationError`], [`ResourceError`]
//!
//! Storage backends live in `coursemart-memory` and `coursemart-postgres`;
//! the axum service lives in `coursemart-server`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod event;
pub mod resource;
pub mod shop;
pub mod store;
pub mod types;
mod validation;

pub use errors::{ResourceError, ValidationError};
pub use event::{Category, Event, EventForm, StartTime};
pub use resource::{Capabilities, Record, Resource, ResourceContract, ResourceOperation};
pub use shop::{NewShop, Shop};
pub use store::{Collection, Document, DocumentStore, StoreError, StoreOperation};
pub use types::{EntityId, Timestamp};
