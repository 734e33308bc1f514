//! Raw service records and typed field access.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ServiceError, ServiceResult};

/// Field name the service uses for its record key.
pub const OBJECT_ID_FIELD: &str = "OBJECTID";

/// One raw record from a feature query: a mapping of field name to value.
///
/// Accessors discriminate three cases: a field that is absent or JSON null
/// (`MissingField` from required accessors, `None` from `opt_*`), a field
/// carrying the wrong type (`InvalidField`), and a usable value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, Value>,
}

impl RawRecord {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insert, used when seeding fakes and composing
    /// update payloads.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Raw value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Overwrite (or insert) a field value.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Iterate all fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Object id of this record, if it carries one.
    pub fn object_id(&self) -> ServiceResult<i64> {
        self.int_field(OBJECT_ID_FIELD)
    }

    /// Required string field.
    pub fn str_field(&self, field: &str) -> ServiceResult<&str> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Err(ServiceError::MissingField {
                field: field.to_string(),
            }),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(invalid(field, other)),
        }
    }

    /// Optional string field; absent or null reads as `None`.
    pub fn opt_str_field(&self, field: &str) -> ServiceResult<Option<&str>> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(invalid(field, other)),
        }
    }

    /// Required integer field.
    pub fn int_field(&self, field: &str) -> ServiceResult<i64> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Err(ServiceError::MissingField {
                field: field.to_string(),
            }),
            Some(Value::Number(n)) => n.as_i64().ok_or_else(|| invalid(field, &Value::from(n.clone()))),
            Some(other) => Err(invalid(field, other)),
        }
    }

    /// Optional integer field; absent or null reads as `None`.
    pub fn opt_int_field(&self, field: &str) -> ServiceResult<Option<i64>> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid(field, &Value::from(n.clone()))),
            Some(other) => Err(invalid(field, other)),
        }
    }

    /// Required float field. Integer values are widened.
    pub fn float_field(&self, field: &str) -> ServiceResult<f64> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Err(ServiceError::MissingField {
                field: field.to_string(),
            }),
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(field, &Value::from(n.clone()))),
            Some(other) => Err(invalid(field, other)),
        }
    }

    /// Required non-negative count field.
    pub fn u32_field(&self, field: &str) -> ServiceResult<u32> {
        let n = self.int_field(field)?;
        u32::try_from(n).map_err(|_| ServiceError::InvalidField {
            field: field.to_string(),
            value: n.to_string(),
        })
    }
}

fn invalid(field: &str, value: &Value) -> ServiceError {
    ServiceError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
    }
}
