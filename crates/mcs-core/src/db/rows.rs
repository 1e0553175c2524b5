//! Column decoding helpers shared by the repositories

use std::str::FromStr;

use libsql::{Row, Value};

use crate::error::{Error, Result};

pub fn opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(Error::Database(format!(
            "column {idx}: expected TEXT, found {other:?}"
        ))),
    }
}

pub fn opt_int(row: &Row, idx: i32) -> Result<Option<i64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        other => Err(Error::Database(format!(
            "column {idx}: expected INTEGER, found {other:?}"
        ))),
    }
}

pub fn opt_real(row: &Row, idx: i32) -> Result<Option<f64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Real(value) => Ok(Some(value)),
        #[allow(clippy::cast_precision_loss)]
        Value::Integer(value) => Ok(Some(value as f64)),
        other => Err(Error::Database(format!(
            "column {idx}: expected REAL, found {other:?}"
        ))),
    }
}

pub fn flag(row: &Row, idx: i32) -> Result<bool> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Decode an identifier column
pub fn id<T: FromStr>(row: &Row, idx: i32) -> Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|_| Error::Database(format!("column {idx}: invalid id {raw:?}")))
}

/// Decode an enumerated column, surfacing unknown values as errors
pub fn variant<T>(row: &Row, idx: i32) -> Result<T>
where
    T: FromStr<Err = crate::models::UnknownVariant>,
{
    let raw: String = row.get(idx)?;
    Ok(raw.parse()?)
}

/// Bind an optional value, mapping `None` to SQL NULL
pub fn nullable<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Null, Into::into)
}
