//! Write-path use-case service for user records.
//!
//! # Responsibility
//! - Normalize raw create/update input.
//! - Probe email uniqueness before writing.
//! - Apply partial-update merge rules and map store failures to the
//!   operation error taxonomy.
//!
//! # Invariants
//! - Text fields are trimmed before they reach the store.
//! - On update, an empty text field means "not provided"; `age` is applied
//!   whenever present, including `0`.
//! - An invalid id is rejected before any store call.
//! - The uniqueness probe is an early exit only. The store's unique index
//!   is what guarantees one record per email.

use crate::model::user::{User, UserDraft, UserId, UserPatch};
use crate::repo::user_repo::{EmailLookup, UserRepository};
use crate::service::error::{ServiceResult, UserServiceError};
use crate::service::input::{CreateUserInput, UpdateUserInput};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::time::Instant;

pub const CREATED_MESSAGE: &str = "User created successfully";
pub const UPDATED_MESSAGE: &str = "User updated successfully";
pub const DELETED_MESSAGE: &str = "User deleted successfully";

/// Successful create/update envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMutation {
    pub message: &'static str,
    pub data: User,
}

/// Successful delete envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteConfirmation {
    pub message: &'static str,
}

/// Write service over a user store.
pub struct RecordWriter<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> RecordWriter<R> {
    /// Creates a writer over the provided store handle.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one user record.
    ///
    /// # Errors
    /// - `Conflict` when the normalized email already exists.
    /// - `Validation` when any field constraint fails.
    pub fn create(&self, input: CreateUserInput) -> ServiceResult<UserMutation> {
        let started_at = Instant::now();
        let result = self.create_user(normalize_create(input));
        log_outcome("user_create", started_at, result.as_ref().map(|user| user.id));

        result.map(|data| UserMutation {
            message: CREATED_MESSAGE,
            data,
        })
    }

    /// Partially updates the record with text id `id`.
    ///
    /// # Errors
    /// - `InvalidId` when `id` is not a store identifier.
    /// - `Conflict` when another record holds the new email.
    /// - `Validation` when the merged record violates a constraint.
    /// - `NotFound` when no record has that id.
    pub fn update(&self, id: &str, input: UpdateUserInput) -> ServiceResult<UserMutation> {
        let started_at = Instant::now();
        let result = self.parse_id(id).and_then(|user_id| {
            let patch = normalize_patch(input);
            debug!(
                "event=user_update module=writer status=start user_id={user_id} fields={}",
                patch.field_count()
            );
            self.update_user(user_id, &patch)
        });
        log_outcome("user_update", started_at, result.as_ref().map(|user| user.id));

        result.map(|data| UserMutation {
            message: UPDATED_MESSAGE,
            data,
        })
    }

    /// Deletes the record with text id `id`.
    ///
    /// # Errors
    /// - `InvalidId` when `id` is not a store identifier.
    /// - `NotFound` when no record has that id.
    pub fn delete(&self, id: &str) -> ServiceResult<DeleteConfirmation> {
        let started_at = Instant::now();
        let result = self.parse_id(id).and_then(|user_id| {
            self.repo
                .delete_user(user_id)?
                .map(|user| user.id)
                .ok_or(UserServiceError::NotFound(user_id))
        });
        log_outcome("user_delete", started_at, result.as_ref().copied());

        result.map(|_| DeleteConfirmation {
            message: DELETED_MESSAGE,
        })
    }

    fn create_user(&self, draft: UserDraft) -> ServiceResult<User> {
        if let Some(email) = draft.email.as_deref().filter(|email| !email.is_empty()) {
            self.ensure_email_free(email, None)?;
        }

        Ok(self.repo.insert_user(&draft)?)
    }

    fn update_user(&self, id: UserId, patch: &UserPatch) -> ServiceResult<User> {
        if let Some(email) = patch.email.as_deref().filter(|email| !email.is_empty()) {
            self.ensure_email_free(email, Some(id))?;
        }

        self.repo
            .update_user(id, patch)?
            .ok_or(UserServiceError::NotFound(id))
    }

    fn ensure_email_free(&self, email: &str, exclude_id: Option<UserId>) -> ServiceResult<()> {
        let lookup = EmailLookup { email, exclude_id };
        match self.repo.find_one(&lookup)? {
            Some(_) => Err(UserServiceError::Conflict),
            None => Ok(()),
        }
    }

    fn parse_id(&self, id: &str) -> ServiceResult<UserId> {
        self.repo
            .parse_id(id)
            .ok_or_else(|| UserServiceError::InvalidId(id.to_string()))
    }
}

/// Trims text fields and parses `age` for a create request.
pub fn normalize_create(input: CreateUserInput) -> UserDraft {
    UserDraft {
        name: input.name.map(|value| value.trim().to_string()),
        age: input.age.as_ref().map(|age| age.to_age_value()),
        email: input.email.map(|value| value.trim().to_string()),
        address: input.address.map(|value| value.trim().to_string()),
    }
}

/// Builds a patch from update input.
///
/// Text fields that are absent or empty are skipped; the rest are trimmed.
/// `age` is kept whenever it is present.
pub fn normalize_patch(input: UpdateUserInput) -> UserPatch {
    UserPatch {
        name: provided_text(input.name),
        age: input.age.as_ref().map(|age| age.to_age_value()),
        email: provided_text(input.email),
        address: provided_text(input.address),
    }
}

fn provided_text(value: Option<String>) -> Option<String> {
    value
        .filter(|raw| !raw.is_empty())
        .map(|raw| raw.trim().to_string())
}

fn log_outcome(event: &str, started_at: Instant, outcome: Result<UserId, &UserServiceError>) {
    let duration_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok(id) => info!("event={event} module=writer status=ok user_id={id} duration_ms={duration_ms}"),
        Err(UserServiceError::Internal(cause)) => error!(
            "event={event} module=writer status=error duration_ms={duration_ms} error_code=internal_fault error={cause}"
        ),
        Err(err) => warn!(
            "event={event} module=writer status=rejected duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_create, normalize_patch};
    use crate::model::user::AgeValue;
    use crate::service::input::{AgeInput, CreateUserInput, UpdateUserInput};

    #[test]
    fn create_input_is_trimmed_and_age_parsed() {
        let draft = normalize_create(CreateUserInput {
            name: Some("  Al ".to_string()),
            age: Some(AgeInput::from("30")),
            email: Some(" a@b.com ".to_string()),
            address: None,
        });

        assert_eq!(draft.name.as_deref(), Some("Al"));
        assert_eq!(draft.age, Some(AgeValue::Value(30)));
        assert_eq!(draft.email.as_deref(), Some("a@b.com"));
        assert_eq!(draft.address, None);
    }

    #[test]
    fn patch_skips_empty_text_but_keeps_zero_age() {
        let patch = normalize_patch(UpdateUserInput {
            name: Some(String::new()),
            age: Some(AgeInput::Int(0)),
            email: None,
            address: Some(" Da Nang ".to_string()),
        });

        assert_eq!(patch.name, None);
        assert_eq!(patch.age, Some(AgeValue::Value(0)));
        assert_eq!(patch.email, None);
        assert_eq!(patch.address.as_deref(), Some("Da Nang"));
        assert_eq!(patch.field_count(), 2);
    }

    #[test]
    fn whitespace_only_text_is_provided_and_trims_to_empty() {
        let patch = normalize_patch(UpdateUserInput {
            name: Some("   ".to_string()),
            ..UpdateUserInput::default()
        });

        assert_eq!(patch.name.as_deref(), Some(""));
    }
}
