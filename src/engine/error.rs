use std::collections::BTreeMap;

use serde::Serialize;
use ulid::Ulid;

/// Per-field messages, keyed by the request field name (`startDate`, `city`, ...).
/// Setting a field twice keeps the last message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// `Ok(())` when nothing was flagged, otherwise the errors wrapped by `wrap`.
    pub fn into_result(self, wrap: fn(FieldErrors) -> EngineError) -> Result<(), EngineError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(wrap(self))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Spot,
    Review,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::User => "User",
            EntityKind::Spot => "Spot",
            EntityKind::Review => "Review",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NotFound { kind: EntityKind, id: Ulid },
    /// The acting user may not touch this entity (not the owner, or booking
    /// their own spot).
    Forbidden,
    AlreadyReviewed(Ulid),
    ValidationFailed(FieldErrors),
    Conflict(FieldErrors),
    LimitExceeded(&'static str),
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: Ulid) -> Self {
        EngineError::NotFound { kind, id }
    }

    /// Field messages carried by the error; empty for errors without fields.
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            EngineError::ValidationFailed(errors) | EngineError::Conflict(errors) => {
                errors.clone()
            }
            _ => FieldErrors::new(),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound { kind, .. } => write!(f, "{kind} couldn't be found"),
            EngineError::Forbidden => write!(f, "Forbidden"),
            EngineError::AlreadyReviewed(_) => {
                write!(f, "User already has a review for this spot")
            }
            EngineError::ValidationFailed(_) => write!(f, "Bad Request"),
            EngineError::Conflict(_) => {
                write!(f, "Sorry, this spot is already booked for the specified dates")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
