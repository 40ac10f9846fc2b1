//! Parameter values and positional bind dispatch.

use crate::backend::Statement;
use crate::error::SqlShimError;

/// A value bound into a positional statement parameter.
///
/// Only [`Text`](Param::Text), [`Int`](Param::Int) and
/// [`BigInt`](Param::BigInt) can actually be bound; the remaining variants
/// exist so callers can hand over whatever their domain model holds and get a
/// precise [`SqlShimError::UnsupportedParam`] back at bind time instead of a
/// backend-specific failure later.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Text/string value
    Text(String),
    /// 32-bit integer value
    Int(i32),
    /// 64-bit integer value
    BigInt(i64),
    /// Floating point value (not bindable)
    Float(f64),
    /// Boolean value (not bindable)
    Bool(bool),
    /// NULL (not bindable)
    Null,
}

impl Param {
    /// Name of the variant, used in error reporting.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Param::Text(_) => "Text",
            Param::Int(_) => "Int",
            Param::BigInt(_) => "BigInt",
            Param::Float(_) => "Float",
            Param::Bool(_) => "Bool",
            Param::Null => "Null",
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_owned())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Param::Int(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::BigInt(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

/// Bind `params` positionally (0-based) into `stmt`.
///
/// Dispatch is a closed set: text, i32 and i64. Anything else fails with
/// [`SqlShimError::UnsupportedParam`] naming the offending type and value,
/// before the statement sees it.
///
/// # Errors
/// Returns `UnsupportedParam` for a non-bindable variant, or whatever the
/// backend reports for a failed bind.
pub(crate) fn bind_params<S: Statement>(
    stmt: &mut S,
    params: &[Param],
) -> Result<(), SqlShimError> {
    for (index, param) in params.iter().enumerate() {
        match param {
            Param::Text(_) | Param::Int(_) | Param::BigInt(_) => stmt.bind(index, param)?,
            other => {
                return Err(SqlShimError::UnsupportedParam {
                    kind: other.kind(),
                    value: format!("{other:?}"),
                });
            }
        }
    }
    Ok(())
}
