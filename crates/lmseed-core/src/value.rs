use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A column value ready to be bound to a statement.
///
/// Every variant carries its own typed NULL so stores can bind a correctly
/// typed parameter even when the value is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Uuid(Option<Uuid>),
    Timestamp(Option<DateTime<Utc>>),
    Date(Option<NaiveDate>),
    Json(Option<Value>),
    TextArray(Option<Vec<String>>),
    UuidArray(Option<Vec<Uuid>>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        match self {
            SqlValue::Bool(value) => value.is_none(),
            SqlValue::Int(value) => value.is_none(),
            SqlValue::BigInt(value) => value.is_none(),
            SqlValue::Float(value) => value.is_none(),
            SqlValue::Text(value) => value.is_none(),
            SqlValue::Uuid(value) => value.is_none(),
            SqlValue::Timestamp(value) => value.is_none(),
            SqlValue::Date(value) => value.is_none(),
            SqlValue::Json(value) => value.is_none(),
            SqlValue::TextArray(value) => value.is_none(),
            SqlValue::UuidArray(value) => value.is_none(),
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            SqlValue::Uuid(value) => *value,
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(value) => value.as_deref(),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            SqlValue::Json(value) => value.as_ref(),
            _ => None,
        }
    }
}

/// Conversion from a typed entity field into a bindable value.
pub trait ToSqlValue {
    fn to_sql_value(&self) -> SqlValue;
}

macro_rules! impl_to_sql_value {
    ($ty:ty => $variant:ident) => {
        impl ToSqlValue for $ty {
            fn to_sql_value(&self) -> SqlValue {
                SqlValue::$variant(Some(self.clone()))
            }
        }

        impl ToSqlValue for Option<$ty> {
            fn to_sql_value(&self) -> SqlValue {
                SqlValue::$variant(self.clone())
            }
        }
    };
}

impl_to_sql_value!(bool => Bool);
impl_to_sql_value!(i32 => Int);
impl_to_sql_value!(i64 => BigInt);
impl_to_sql_value!(f64 => Float);
impl_to_sql_value!(String => Text);
impl_to_sql_value!(Uuid => Uuid);
impl_to_sql_value!(DateTime<Utc> => Timestamp);
impl_to_sql_value!(NaiveDate => Date);
impl_to_sql_value!(Value => Json);
impl_to_sql_value!(Vec<String> => TextArray);
impl_to_sql_value!(Vec<Uuid> => UuidArray);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_keep_their_type_when_null() {
        let missing: Option<Uuid> = None;
        assert_eq!(missing.to_sql_value(), SqlValue::Uuid(None));
        assert!(missing.to_sql_value().is_null());
    }

    #[test]
    fn json_fields_bind_as_json() {
        let value = serde_json::json!({"theme": "dark"});
        let sql = value.to_sql_value();
        assert_eq!(sql.as_json().and_then(|v| v.get("theme")), Some(&Value::from("dark")));
    }
}
