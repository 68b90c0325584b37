//! User record use-case services.
//!
//! # Responsibility
//! - `QueryEngine` serves reads: search filter, pagination, counting.
//! - `RecordWriter` serves writes: normalization, uniqueness, partial update.
//! - Keep callers decoupled from storage details; both services only hold an
//!   injected `UserRepository`.

pub mod error;
pub mod input;
pub mod query_engine;
pub mod record_writer;
