//! Request DTOs for the boundary server API
//!
//! Defines the validated form of incoming path parameters.

use std::fmt;

use crate::error::{BoundaryError, Result};

/// Maximum accepted length of a department code
pub const MAX_CODE_LENGTH: usize = 8;

/// Administrative department code taken from `/api/municipalities/:code`.
///
/// Only ASCII digits are accepted, so a code can be substituted into a
/// file name or URL template without escaping. Codes are not normalized:
/// `"5"` and `"05"` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepartmentCode(String);

impl DepartmentCode {
    /// Validates a raw path segment.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(BoundaryError::InvalidRequest(
                "Department code cannot be empty".to_string(),
            ));
        }
        if raw.len() > MAX_CODE_LENGTH {
            return Err(BoundaryError::InvalidRequest(format!(
                "Department code exceeds maximum length of {} characters",
                MAX_CODE_LENGTH
            )));
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BoundaryError::InvalidRequest(format!(
                "Department code must be numeric, got '{raw}'"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DepartmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
