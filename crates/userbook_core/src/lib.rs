//! Core logic for userbook: user record listing and write-path rules.
//! This crate is the single source of truth for record invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{close_db, open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::user::{
    AgeValue, FieldViolation, User, UserDraft, UserField, UserId, UserPatch, UserValidationError,
    ViolationKind,
};
pub use repo::user_repo::{
    EmailLookup, RepoError, RepoResult, SqliteUserRepository, UserFilter, UserRepository,
};
pub use service::error::{ServiceResult, UserServiceError};
pub use service::input::{AgeInput, CreateUserInput, ListUsersQuery, UpdateUserInput};
pub use service::query_engine::{QueryEngine, UserPage};
pub use service::record_writer::{DeleteConfirmation, RecordWriter, UserMutation};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
