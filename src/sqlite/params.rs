use rusqlite::types::Value;

use crate::params::Param;

/// Convert a bind value to a rusqlite `Value`.
///
/// Total over the enum even though the bind dispatch upstream only lets the
/// text and integer variants through; the extra arms cost nothing and keep
/// this function usable for diagnostics.
#[must_use]
pub fn param_to_sqlite_value(param: &Param) -> Value {
    match param {
        Param::Text(s) => Value::Text(s.clone()),
        Param::Int(i) => Value::Integer(i64::from(*i)),
        Param::BigInt(i) => Value::Integer(*i),
        Param::Float(f) => Value::Real(*f),
        Param::Bool(b) => Value::Integer(i64::from(*b)),
        Param::Null => Value::Null,
    }
}
