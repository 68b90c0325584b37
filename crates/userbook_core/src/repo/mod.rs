//! Store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the document-store contract the services depend on.
//! - Isolate SQLite query details from query/write orchestration.
//!
//! # Invariants
//! - Repository writes must pass `UserDraft::validate()` before persistence.
//! - Uniqueness violations surface as `RepoError::DuplicateEmail`, distinct
//!   from transport errors.

pub mod user_repo;
