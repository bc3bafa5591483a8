//! Domain error taxonomy shared by all use-case services.
//!
//! # Invariants
//! - Every variant is recoverable: a failed action persists nothing and the
//!   store stays usable.
//! - Messages never include personal record content beyond identifiers.

use crate::model::session::Role;
use crate::repo::kv_repo::StorageError;
use crate::repo::schema::SchemaError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SchoolResult<T> = Result<T, SchoolError>;

/// Missing or unusable input.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field is blank after trim.
    BlankField(&'static str),
    /// A class with this display name already exists.
    DuplicateClass(String),
    /// Date is not `YYYY-MM-DD`.
    InvalidDate(String),
    /// Amount is negative or not finite.
    InvalidAmount(f64),
    /// Subject list is empty after trimming.
    NoSubjects,
    /// Every 6-digit student code is already taken.
    StudentCodesExhausted,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "required field `{field}` must not be blank"),
            Self::DuplicateClass(name) => write!(f, "class already exists: {name}"),
            Self::InvalidDate(value) => write!(f, "date must be YYYY-MM-DD, got `{value}`"),
            Self::InvalidAmount(value) => write!(f, "amount must be a non-negative number, got {value}"),
            Self::NoSubjects => write!(f, "at least one subject is required"),
            Self::StudentCodesExhausted => write!(f, "no unused 6-digit student code is left"),
        }
    }
}

impl Error for ValidationError {}

/// Reference to a record that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    Student(String),
    Teacher(String),
    Class(String),
}

impl Display for NotFoundError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student(code) => write!(f, "student not found: {code}"),
            Self::Teacher(id) => write!(f, "teacher not found: {id}"),
            Self::Class(key) => write!(f, "class not found: {key}"),
        }
    }
}

impl Error for NotFoundError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The acting role may not perform `action`.
    Denied { action: &'static str, role: Role },
    /// Login name/id/role did not match any credential.
    InvalidCredentials,
}

impl Display for PermissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Denied { action, role } => {
                write!(f, "role `{role}` is not allowed to {action}")
            }
            Self::InvalidCredentials => write!(f, "invalid credentials"),
        }
    }
}

impl Error for PermissionError {}

#[derive(Debug)]
pub enum SchoolError {
    Validation(ValidationError),
    NotFound(NotFoundError),
    Permission(PermissionError),
    Storage(StorageError),
    Schema(SchemaError),
}

impl SchoolError {
    /// Stable short code used in log events and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Permission(_) => "permission",
            Self::Storage(_) => "storage",
            Self::Schema(_) => "schema",
        }
    }
}

impl Display for SchoolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(err) => write!(f, "{err}"),
            Self::Permission(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SchoolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(err) => Some(err),
            Self::Permission(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Schema(err) => Some(err),
        }
    }
}

impl From<ValidationError> for SchoolError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<NotFoundError> for SchoolError {
    fn from(value: NotFoundError) -> Self {
        Self::NotFound(value)
    }
}

impl From<PermissionError> for SchoolError {
    fn from(value: PermissionError) -> Self {
        Self::Permission(value)
    }
}

impl From<StorageError> for SchoolError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<SchemaError> for SchoolError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

/// Returns `value` trimmed, or `BlankField(field)` when nothing is left.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}
