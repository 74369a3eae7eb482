//! The verification gate.
//!
//! The same checks run before every physical write and as the last step of
//! every read, so a document that could not be read back is never written.

use crate::error::{ProxyError, ProxyResult};
use crate::schema::{document_version, DocumentSchema, VERSION_FIELD};
use serde_json::Value;
use std::fmt;

/// Outcome of a validation step, carrying a reason when it fails.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum VerifyResult {
    /// The check passed.
    Good,
    /// The check failed for the given reason.
    Bad(String),
}

impl VerifyResult {
    /// A passing result.
    pub fn good() -> Self {
        Self::Good
    }

    /// A failing result with a human-readable reason.
    pub fn bad(reason: impl Into<String>) -> Self {
        Self::Bad(reason.into())
    }

    /// Returns `true` if the check passed.
    #[must_use]
    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }

    /// Returns `true` if the check failed.
    #[must_use]
    pub fn is_bad(&self) -> bool {
        !self.is_good()
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Good => None,
            Self::Bad(reason) => Some(reason),
        }
    }

    /// Runs `next` only if this check passed.
    pub fn and_then(self, next: impl FnOnce() -> VerifyResult) -> VerifyResult {
        match self {
            Self::Good => next(),
            bad => bad,
        }
    }

    /// Converts into a `Result`, building the error from the reason.
    ///
    /// # Errors
    ///
    /// Returns `to_error(reason)` if the check failed.
    pub fn into_result(self, to_error: impl FnOnce(String) -> ProxyError) -> ProxyResult<()> {
        match self {
            Self::Good => Ok(()),
            Self::Bad(reason) => Err(to_error(reason)),
        }
    }
}

impl fmt::Display for VerifyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => f.write_str("good"),
            Self::Bad(reason) => write!(f, "bad: {reason}"),
        }
    }
}

impl From<Result<(), String>> for VerifyResult {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::Good,
            Err(reason) => Self::Bad(reason),
        }
    }
}

/// Checks that `raw` is an object with a non-negative integer `version`.
pub fn verify_basic_structure(raw: &Value) -> VerifyResult {
    match raw {
        Value::Null => return VerifyResult::bad("Data is empty"),
        Value::Object(_) => {}
        _ => return VerifyResult::bad("Data is not an object"),
    }
    match document_version(raw) {
        Some(_) => VerifyResult::good(),
        None => VerifyResult::bad(format!(
            "Data has invalid version: {}",
            raw.get(VERSION_FIELD).unwrap_or(&Value::Null)
        )),
    }
}

/// Checks that `raw` is a valid document for the schema's current version.
///
/// The version must equal the current version exactly, the basic structure
/// must hold, and the schema's own `verify` must pass.
pub fn verify_entry<S: DocumentSchema + ?Sized>(schema: &S, raw: &Value) -> VerifyResult {
    let current = schema.current_version();
    if document_version(raw) != Some(current) {
        return VerifyResult::bad(format!(
            "Version mismatch, got {} and expected {current}",
            raw.get(VERSION_FIELD).unwrap_or(&Value::Null)
        ));
    }
    verify_basic_structure(raw).and_then(|| schema.verify(raw))
}

/// Applies the gate and classifies the failure.
///
/// Structural failures map to [`ProxyError::StructuralInvalid`], anything
/// else (version mismatch, schema rejection) to
/// [`ProxyError::SemanticInvalid`].
///
/// # Errors
///
/// Returns an error if `raw` does not pass [`verify_entry`].
pub fn gate<S: DocumentSchema + ?Sized>(schema: &S, raw: &Value) -> ProxyResult<()> {
    verify_basic_structure(raw).into_result(ProxyError::structural)?;
    verify_entry(schema, raw).into_result(ProxyError::semantic)
}
