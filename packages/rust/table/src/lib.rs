//! Typed record tables on top of the rate-limited REST client.
//!
//! This crate provides:
//! - [`fields`]: primitive cell types for declaring a schema
//! - [`Record`], [`Page`], [`PartialFailure`]: wire shapes
//! - [`Table`]: paginated, chunked CRUD over one collection

pub mod fields;
mod record;
mod table;

pub use fields::{Email, Number, Phone, ShortText, SingleSelect, Url, User};
pub use record::{Page, PartialFailure, PartialResult, Record};
pub use table::{MAX_BATCH, Table};
