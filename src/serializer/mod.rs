//! Schema-driven serialization between typed records and JSON values.
//!
//! Each record type declares a static field table (`&'static [Field]`) and a
//! pair of conversions to and from [`Fields`]. The generic functions in this
//! module walk the table, so no record needs its own JSON converter.
//!
//! - Serialization skips fields that are not writable and omits empty values
//! - Deserialization skips fields that are not readable
//! - An absent optional field deserializes to an explicit `Null`
//! - Errors carry the full field path of the failure

pub mod datetime;
mod value;

pub use value::{Fields, FromValue, NamedEnum, ToValue, Value};

use crate::error::DeserializeError;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value as Json};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use uuid::Uuid;

/// Declared type of a field.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    String,
    Integer,
    Boolean,
    Decimal,
    Uuid,
    Date,
    DateTime,
    /// Enumeration with its canonical member names.
    Enum(&'static [&'static str]),
    Set(&'static Kind),
    List(&'static Kind),
    Map(&'static Kind, &'static Kind),
    /// Nested record, described by its own schema.
    Record(fn() -> &'static [Field]),
    Optional(&'static Kind),
}

impl Kind {
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// The kind with any optional wrapper removed.
    #[must_use]
    pub const fn unwrapped(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner.unwrapped(),
            other => other,
        }
    }
}

/// Read/write visibility of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// Field is taken from input when deserializing.
    pub read: bool,
    /// Field is emitted when serializing.
    pub write: bool,
}

impl Access {
    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
    };
    pub const READ_ONLY: Self = Self {
        read: true,
        write: false,
    };
    pub const WRITE_ONLY: Self = Self {
        read: false,
        write: true,
    };
    pub const HIDDEN: Self = Self {
        read: false,
        write: false,
    };
}

/// One row of a record schema.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub access: Access,
}

impl Field {
    #[must_use]
    pub const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            access: Access::READ_WRITE,
        }
    }

    #[must_use]
    pub const fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }
}

/// A record type with a static schema.
pub trait Serializable: Sized {
    fn schema() -> &'static [Field];

    fn to_fields(&self) -> Fields;

    fn from_fields(fields: Fields) -> Result<Self, DeserializeError>;
}

/// Options for [`deserialize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeserializeOptions {
    /// Timezone attached to date-times; local time when `None`.
    pub tz: Option<chrono::FixedOffset>,
    /// Skip absent mandatory fields instead of failing.
    pub ignore_missing: bool,
}

impl DeserializeOptions {
    #[must_use]
    pub const fn with_tz(tz: Option<chrono::FixedOffset>) -> Self {
        Self {
            tz,
            ignore_missing: false,
        }
    }

    #[must_use]
    pub const fn ignoring_missing(mut self) -> Self {
        self.ignore_missing = true;
        self
    }
}

/// Serialize a record to a JSON object.
#[must_use]
pub fn serialize<T: Serializable>(record: &T) -> Map<String, Json> {
    serialize_fields(T::schema(), &record.to_fields())
}

/// Deserialize a record from a JSON object.
pub fn deserialize<T: Serializable>(
    input: &Json,
    opts: &DeserializeOptions,
) -> Result<T, DeserializeError> {
    T::from_fields(deserialize_fields(T::schema(), input, opts)?)
}

/// Serialize the writable, non-empty fields of a record.
///
/// A mandatory string is always written, even when empty, so the record
/// deserializes again.
#[must_use]
pub fn serialize_fields(schema: &[Field], fields: &Fields) -> Map<String, Json> {
    schema
        .iter()
        .filter(|field| field.access.write)
        .filter_map(|field| {
            fields
                .get(field.name)
                .filter(|value| !value.is_empty() || is_mandatory_string(&field.kind, value))
                .map(|value| (field.name.to_string(), serialize_value(&field.kind, value)))
        })
        .collect()
}

/// Serialize one value of the given kind.
#[must_use]
pub fn serialize_value(kind: &Kind, value: &Value) -> Json {
    match (kind.unwrapped(), value) {
        (_, Value::Null) => Json::Null,
        (Kind::Set(inner), Value::Set(items)) => {
            Json::Array(items.iter().map(|v| serialize_value(inner, v)).collect())
        }
        (Kind::List(inner), Value::List(items)) => {
            Json::Array(items.iter().map(|v| serialize_value(inner, v)).collect())
        }
        (Kind::Map(key_kind, value_kind), Value::Map(entries)) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| {
                    (
                        object_key(serialize_value(key_kind, k)),
                        serialize_value(value_kind, v),
                    )
                })
                .collect(),
        ),
        (Kind::Record(schema), Value::Record(fields)) => {
            Json::Object(serialize_fields(schema(), fields))
        }
        (_, other) => serialize_untyped(other),
    }
}

const fn is_mandatory_string(kind: &Kind, value: &Value) -> bool {
    matches!((kind, value), (Kind::String, Value::String(_)))
}

fn serialize_untyped(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::String(s) | Value::Enum(s) => Json::String(s.clone()),
        Value::Integer(i) => Json::Number(Number::from(*i)),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Decimal(d) => Json::String(d.normalize().to_string()),
        Value::Uuid(u) => Json::String(u.hyphenated().to_string()),
        Value::Date(d) => Json::String(datetime::format_date(d)),
        Value::DateTime(dt) => Json::String(datetime::format_datetime(dt)),
        Value::Set(items) => Json::Array(items.iter().map(serialize_untyped).collect()),
        Value::List(items) => Json::Array(items.iter().map(serialize_untyped).collect()),
        Value::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (object_key(serialize_untyped(k)), serialize_untyped(v)))
                .collect(),
        ),
        Value::Record(fields) => Json::Object(
            fields
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), serialize_untyped(v)))
                .collect(),
        ),
    }
}

fn object_key(key: Json) -> String {
    match key {
        Json::String(s) => s,
        other => other.to_string(),
    }
}

/// Deserialize the readable fields of a record from a JSON object.
pub fn deserialize_fields(
    schema: &[Field],
    input: &Json,
    opts: &DeserializeOptions,
) -> Result<Fields, DeserializeError> {
    let Json::Object(map) = input else {
        return Err(DeserializeError::invalid("record", raw_text(input)));
    };

    let mut fields = Fields::new();
    for field in schema.iter().filter(|field| field.access.read) {
        match map.get(field.name) {
            Some(raw) => {
                let value = deserialize_value(&field.kind, raw, opts)
                    .map_err(|e| e.in_field(field.name))?;
                fields.insert(field.name, value);
            }
            None if field.kind.is_optional() => fields.insert(field.name, Value::Null),
            None if opts.ignore_missing => {}
            None => return Err(DeserializeError::missing(field.name)),
        }
    }
    Ok(fields)
}

/// Deserialize one JSON value into the given kind.
pub fn deserialize_value(
    kind: &Kind,
    raw: &Json,
    opts: &DeserializeOptions,
) -> Result<Value, DeserializeError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }

    match kind {
        Kind::Optional(inner) => deserialize_value(inner, raw, opts),
        Kind::String => match raw {
            Json::String(s) => Ok(Value::String(s.clone())),
            other => Err(DeserializeError::invalid("string", raw_text(other))),
        },
        Kind::Integer => match raw {
            Json::Number(n) => n.as_i64(),
            Json::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .map(Value::Integer)
        .ok_or_else(|| DeserializeError::invalid("integer", raw_text(raw))),
        Kind::Boolean => raw
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| DeserializeError::invalid("boolean", raw_text(raw))),
        Kind::Decimal => parse_decimal(raw)
            .map(Value::Decimal)
            .ok_or_else(|| DeserializeError::invalid("Decimal", raw_text(raw))),
        Kind::Uuid => raw
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(Value::Uuid)
            .ok_or_else(|| DeserializeError::invalid("UUID", raw_text(raw))),
        Kind::Date => match raw {
            Json::String(s) => datetime::parse_date(s, opts.tz).map(Value::Date),
            other => Err(DeserializeError::invalid("Date", raw_text(other))),
        },
        Kind::DateTime => match raw {
            Json::String(s) => datetime::parse_datetime(s, opts.tz).map(Value::DateTime),
            other => Err(DeserializeError::invalid("DateTime", raw_text(other))),
        },
        Kind::Enum(names) => raw
            .as_str()
            .filter(|s| names.contains(s))
            .map(|s| Value::Enum(s.to_string()))
            .ok_or_else(|| DeserializeError::invalid("enum", raw_text(raw))),
        Kind::Set(inner) => {
            let items = elements(raw, "set")?;
            let mut set = BTreeSet::new();
            for (i, item) in items.iter().enumerate() {
                set.insert(deserialize_value(inner, item, opts).map_err(|e| e.in_field(&i.to_string()))?);
            }
            Ok(Value::Set(set))
        }
        Kind::List(inner) => elements(raw, "list")?
            .iter()
            .enumerate()
            .map(|(i, item)| {
                deserialize_value(inner, item, opts).map_err(|e| e.in_field(&i.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Kind::Map(key_kind, value_kind) => {
            let Json::Object(entries) = raw else {
                return Err(DeserializeError::invalid("map", raw_text(raw)));
            };
            let mut map = BTreeMap::new();
            for (key, value) in entries {
                let k = deserialize_value(key_kind, &Json::String(key.clone()), opts)
                    .map_err(|e| e.in_field(key))?;
                let v = deserialize_value(value_kind, value, opts).map_err(|e| e.in_field(key))?;
                map.insert(k, v);
            }
            Ok(Value::Map(map))
        }
        Kind::Record(schema) => deserialize_fields(schema(), raw, opts).map(Value::Record),
    }
}

fn elements<'a>(raw: &'a Json, expected: &'static str) -> Result<&'a Vec<Json>, DeserializeError> {
    raw.as_array()
        .ok_or_else(|| DeserializeError::invalid(expected, raw_text(raw)))
}

fn parse_decimal(raw: &Json) -> Option<Decimal> {
    let text = match raw {
        Json::String(s) => s.trim().to_string(),
        Json::Number(n) => n.to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn raw_text(raw: &Json) -> String {
    match raw {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}
