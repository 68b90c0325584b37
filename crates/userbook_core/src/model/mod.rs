//! User record domain model.
//!
//! # Responsibility
//! - Define the persisted `User` record and its field constraints.
//! - Provide draft/patch shapes for write paths.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `UserId`.
//! - A draft that fails `validate()` must never reach storage.

pub mod user;
