use std::str::FromStr;

use crate::model::*;

use super::error::FieldErrors;
use super::EngineError;

pub const START_IN_PAST: &str = "startDate cannot be in the past";
pub const END_NOT_AFTER_START: &str = "endDate cannot be on or before startDate";
pub const START_CONFLICT: &str = "Start date conflicts with an existing booking";
pub const END_CONFLICT: &str = "End date conflicts with an existing booking";

/// How a candidate stay is compared against existing bookings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Per-field rules: each clash flags the request field it involves.
    #[default]
    FieldRules,
    /// Plain interval overlap; any clash flags both fields.
    Overlap,
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "field_rules" | "fields" | "legacy" => Ok(ConflictPolicy::FieldRules),
            "overlap" => Ok(ConflictPolicy::Overlap),
            other => Err(format!("unknown conflict policy: {other}")),
        }
    }
}

/// Check the range itself. Both checks always run so the caller sees every
/// problem at once.
pub fn validate_range(candidate: &CandidateRange, now: Ms) -> Result<Span, EngineError> {
    let mut errors = FieldErrors::new();
    if candidate.start < now {
        errors.set("startDate", START_IN_PAST);
    }
    match candidate.as_span() {
        Some(span) if errors.is_empty() => Ok(span),
        Some(_) => Err(EngineError::ValidationFailed(errors)),
        None => {
            errors.set("endDate", END_NOT_AFTER_START);
            Err(EngineError::ValidationFailed(errors))
        }
    }
}

/// Flag the candidate fields that clash with `existing`. Later bookings
/// overwrite earlier flags for the same field.
pub fn scan_conflicts<'a>(
    span: &Span,
    existing: impl IntoIterator<Item = &'a Booking>,
    policy: ConflictPolicy,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for booking in existing {
        let b = booking.span;
        match policy {
            ConflictPolicy::FieldRules => {
                if span.contains_span(&b) {
                    errors.set("startDate", START_CONFLICT);
                    errors.set("endDate", END_CONFLICT);
                } else if span.start == b.start {
                    errors.set("startDate", START_CONFLICT);
                } else if span.start < b.start && span.end > b.start {
                    errors.set("endDate", END_CONFLICT);
                } else if span.start > b.start && span.start < b.end {
                    errors.set("startDate", START_CONFLICT);
                }
            }
            ConflictPolicy::Overlap => {
                if span.overlaps(&b) {
                    errors.set("startDate", START_CONFLICT);
                    errors.set("endDate", END_CONFLICT);
                }
            }
        }
    }
    errors
}

/// Validate a candidate stay and check it against a spot's bookings.
/// Pure: the caller owns existence and ownership checks.
pub fn check_booking<'a>(
    candidate: &CandidateRange,
    existing: impl IntoIterator<Item = &'a Booking>,
    now: Ms,
    policy: ConflictPolicy,
) -> Result<Span, EngineError> {
    let span = validate_range(candidate, now)?;
    scan_conflicts(&span, existing, policy).into_result(EngineError::Conflict)?;
    Ok(span)
}

/// [`check_booking`] against a spot's state, scanning only bookings that
/// overlap the candidate. Every field rule requires an overlap, so the result
/// is the same as a full scan.
pub(crate) fn check_against_spot(
    state: &SpotState,
    candidate: &CandidateRange,
    now: Ms,
    policy: ConflictPolicy,
) -> Result<Span, EngineError> {
    let span = validate_range(candidate, now)?;
    scan_conflicts(&span, state.overlapping(&span), policy).into_result(EngineError::Conflict)?;
    Ok(span)
}
