//! User record, field constraints, and write-side shapes.
//!
//! # Responsibility
//! - Define the canonical `User` record returned by every operation.
//! - Own the field constraint rules evaluated at write time.
//! - Merge partial patches over existing records.
//!
//! # Invariants
//! - `id` is assigned once by the store and never changes.
//! - `name` has at least 2 characters, `age >= 0`, `email` matches
//!   `local@domain.tld` shape.
//! - Validation is all-or-nothing: every violation is reported together.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned identifier of a user record.
pub type UserId = Uuid;

/// Minimum `name` length in characters.
pub const NAME_MIN_CHARS: usize = 2;
/// Minimum accepted `age`.
pub const AGE_MIN: i64 = 0;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("valid email regex"));

/// Persisted user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub age: i64,
    pub email: String,
    pub address: Option<String>,
}

/// Age value as it arrives at the store after input parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeValue {
    /// Input carried something that is not an integer.
    NotANumber,
    Value(i64),
}

impl From<i64> for AgeValue {
    fn from(value: i64) -> Self {
        Self::Value(value)
    }
}

/// Full set of candidate fields for a record write.
///
/// Fields are optional because write input is untrusted; `validate()`
/// decides whether the draft may be persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub name: Option<String>,
    pub age: Option<AgeValue>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Partial update. `None` means "keep the stored value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub age: Option<AgeValue>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl UserPatch {
    /// Number of fields the patch will overwrite.
    pub fn field_count(&self) -> usize {
        [
            self.name.is_some(),
            self.age.is_some(),
            self.email.is_some(),
            self.address.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Draft fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUserFields {
    pub name: String,
    pub age: i64,
    pub email: String,
    pub address: Option<String>,
}

impl ValidUserFields {
    /// Attaches a store identifier, producing the persisted record shape.
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            age: self.age,
            email: self.email,
            address: self.address,
        }
    }
}

impl User {
    /// Returns this record as a draft so a patch can be merged over it.
    pub fn to_draft(&self) -> UserDraft {
        UserDraft {
            name: Some(self.name.clone()),
            age: Some(AgeValue::Value(self.age)),
            email: Some(self.email.clone()),
            address: self.address.clone(),
        }
    }

    /// Merges `patch` over this record; fields absent from the patch keep
    /// their stored value.
    pub fn merge(&self, patch: &UserPatch) -> UserDraft {
        let mut draft = self.to_draft();
        if let Some(name) = &patch.name {
            draft.name = Some(name.clone());
        }
        if let Some(age) = patch.age {
            draft.age = Some(age);
        }
        if let Some(email) = &patch.email {
            draft.email = Some(email.clone());
        }
        if let Some(address) = &patch.address {
            draft.address = Some(address.clone());
        }
        draft
    }
}

impl UserDraft {
    /// Evaluates every field constraint and returns the accepted values.
    ///
    /// # Errors
    /// - Returns all violated constraints in field order.
    pub fn validate(&self) -> Result<ValidUserFields, UserValidationError> {
        let mut violations = Vec::new();

        let name = match self.name.as_deref() {
            None | Some("") => {
                violations.push(FieldViolation::new(UserField::Name, ViolationKind::Required));
                None
            }
            Some(value) if value.chars().count() < NAME_MIN_CHARS => {
                violations.push(FieldViolation::new(
                    UserField::Name,
                    ViolationKind::MinLength(NAME_MIN_CHARS),
                ));
                None
            }
            Some(value) => Some(value),
        };

        let age = match self.age {
            None => {
                violations.push(FieldViolation::new(UserField::Age, ViolationKind::Required));
                None
            }
            Some(AgeValue::NotANumber) => {
                violations.push(FieldViolation::new(UserField::Age, ViolationKind::NotANumber));
                None
            }
            Some(AgeValue::Value(value)) if value < AGE_MIN => {
                violations.push(FieldViolation::new(
                    UserField::Age,
                    ViolationKind::Minimum(AGE_MIN),
                ));
                None
            }
            Some(AgeValue::Value(value)) => Some(value),
        };

        let email = match self.email.as_deref() {
            None | Some("") => {
                violations.push(FieldViolation::new(UserField::Email, ViolationKind::Required));
                None
            }
            Some(value) if !is_valid_email(value) => {
                violations.push(FieldViolation::new(UserField::Email, ViolationKind::Format));
                None
            }
            Some(value) => Some(value),
        };

        match (name, age, email) {
            (Some(name), Some(age), Some(email)) if violations.is_empty() => Ok(ValidUserFields {
                name: name.to_string(),
                age,
                email: email.to_string(),
                address: self.address.clone(),
            }),
            _ => Err(UserValidationError { violations }),
        }
    }
}

/// Returns whether `value` has the `local@domain.tld` shape.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Record field names, as exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Name,
    Age,
    Email,
    Address,
}

impl UserField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Email => "email",
            Self::Address => "address",
        }
    }
}

/// Constraint that a field value failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    /// Minimum length in characters.
    MinLength(usize),
    Minimum(i64),
    NotANumber,
    Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: UserField,
    pub kind: ViolationKind,
}

impl FieldViolation {
    pub fn new(field: UserField, kind: ViolationKind) -> Self {
        Self { field, kind }
    }
}

impl Display for FieldViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let field = self.field.as_str();
        match self.kind {
            ViolationKind::Required => write!(f, "{field}: is required"),
            ViolationKind::MinLength(min) => {
                write!(f, "{field}: must be at least {min} characters")
            }
            ViolationKind::Minimum(min) => write!(f, "{field}: must be >= {min}"),
            ViolationKind::NotANumber => write!(f, "{field}: must be an integer"),
            ViolationKind::Format => write!(f, "{field}: is not a valid email address"),
        }
    }
}

/// Field constraint failure for a record write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserValidationError {
    violations: Vec<FieldViolation>,
}

impl UserValidationError {
    /// Violated constraints in field order. Never empty.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns whether `field` failed any constraint.
    pub fn has_field(&self, field: UserField) -> bool {
        self.violations.iter().any(|violation| violation.field == field)
    }
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "user validation failed: ")?;
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl Error for UserValidationError {}

#[cfg(test)]
mod tests {
    use super::{
        is_valid_email, AgeValue, User, UserDraft, UserField, UserPatch, ViolationKind,
    };
    use uuid::Uuid;

    fn draft(name: &str, age: i64, email: &str) -> UserDraft {
        UserDraft {
            name: Some(name.to_string()),
            age: Some(AgeValue::Value(age)),
            email: Some(email.to_string()),
            address: None,
        }
    }

    #[test]
    fn valid_draft_passes() {
        let fields = draft("Al", 0, "a@b.com").validate().unwrap();
        assert_eq!(fields.name, "Al");
        assert_eq!(fields.age, 0);
    }

    #[test]
    fn all_violations_are_reported_together() {
        let err = draft("A", -1, "not-an-email").validate().unwrap_err();
        let kinds: Vec<_> = err.violations().iter().map(|v| (v.field, v.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (UserField::Name, ViolationKind::MinLength(2)),
                (UserField::Age, ViolationKind::Minimum(0)),
                (UserField::Email, ViolationKind::Format),
            ]
        );
        assert!(err.to_string().starts_with("user validation failed: name:"));
    }

    #[test]
    fn empty_and_missing_fields_are_required() {
        let err = UserDraft {
            name: Some(String::new()),
            ..UserDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(err.has_field(UserField::Name));
        assert!(err.has_field(UserField::Age));
        assert!(err.has_field(UserField::Email));
        assert!(!err.has_field(UserField::Address));
    }

    #[test]
    fn unparsable_age_is_rejected() {
        let mut input = draft("Bob", 1, "bob@x.io");
        input.age = Some(AgeValue::NotANumber);
        let err = input.validate().unwrap_err();
        assert_eq!(err.violations()[0].kind, ViolationKind::NotANumber);
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        assert!(draft("Ân", 3, "an@x.vn").validate().is_ok());
        assert!(draft("Â", 3, "an@x.vn").validate().is_err());
    }

    #[test]
    fn email_shape_matches_simple_pattern() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@."));
    }

    #[test]
    fn merge_keeps_fields_missing_from_patch() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            age: 30,
            email: "alice@example.com".to_string(),
            address: Some("Hanoi".to_string()),
        };
        let merged = user.merge(&UserPatch {
            age: Some(AgeValue::Value(0)),
            ..UserPatch::default()
        });

        assert_eq!(merged.name.as_deref(), Some("Alice"));
        assert_eq!(merged.age, Some(AgeValue::Value(0)));
        assert_eq!(merged.email.as_deref(), Some("alice@example.com"));
        assert_eq!(merged.address.as_deref(), Some("Hanoi"));
    }
}
