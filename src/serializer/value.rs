//! Typed intermediate values and conversions to and from Rust field types.

use crate::error::DeserializeError;
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// A field value after coercion to its declared kind.
///
/// `Ord` lets sets of values sort deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Boolean(bool),
    Decimal(Decimal),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Enum(String),
    Set(BTreeSet<Value>),
    List(Vec<Value>),
    Map(BTreeMap<Value, Value>),
    Record(Fields),
}

impl Value {
    /// Values omitted from serialized output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::Set(items) => items.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Short kind name used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Decimal(_) => "Decimal",
            Self::Uuid(_) => "UUID",
            Self::Date(_) => "Date",
            Self::DateTime(_) => "DateTime",
            Self::Enum(_) => "enum",
            Self::Set(_) => "set",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
        }
    }

    fn mismatch(self, expected: &'static str) -> DeserializeError {
        DeserializeError::invalid(expected, self.kind_name())
    }
}

/// Field name to value map for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fields(BTreeMap<String, Value>);

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a typed value.
    #[must_use]
    pub fn with(mut self, name: &str, value: &impl ToValue) -> Self {
        self.insert(name, value.to_value());
        self
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Remove a field and convert it to `T`, naming the field on failure.
    ///
    /// A field absent here was either not readable or skipped in
    /// ignore-missing mode; it falls back to the type's empty form when
    /// one exists.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T, DeserializeError> {
        match self.0.remove(name) {
            Some(value) => T::from_value(value).map_err(|e| e.in_field(name)),
            None => T::from_missing().ok_or_else(|| DeserializeError::missing(name)),
        }
    }
}

/// Conversion from a Rust field type into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Conversion from a [`Value`] back into a Rust field type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, DeserializeError>;

    /// The value used when the field is absent and not required.
    fn from_missing() -> Option<Self> {
        None
    }
}

/// Enumerations exchanged through their canonical name.
pub trait NamedEnum: Sized + 'static {
    const NAMES: &'static [&'static str];

    fn name(&self) -> &'static str;

    fn from_name(name: &str) -> Option<Self>;
}

/// Implement [`ToValue`]/[`FromValue`] for a [`NamedEnum`].
#[macro_export]
macro_rules! impl_enum_value {
    ($ty:ty) => {
        impl $crate::serializer::ToValue for $ty {
            fn to_value(&self) -> $crate::serializer::Value {
                $crate::serializer::Value::Enum(
                    <$ty as $crate::serializer::NamedEnum>::name(self).to_string(),
                )
            }
        }

        impl $crate::serializer::FromValue for $ty {
            fn from_value(
                value: $crate::serializer::Value,
            ) -> ::std::result::Result<Self, $crate::error::DeserializeError> {
                match value {
                    $crate::serializer::Value::Enum(name)
                    | $crate::serializer::Value::String(name) => {
                        <$ty as $crate::serializer::NamedEnum>::from_name(&name).ok_or_else(|| {
                            $crate::error::DeserializeError::InvalidValue {
                                path: String::new(),
                                expected: stringify!($ty),
                                value: name,
                            }
                        })
                    }
                    other => Err($crate::error::DeserializeError::InvalidValue {
                        path: String::new(),
                        expected: stringify!($ty),
                        value: other.kind_name().to_string(),
                    }),
                }
            }
        }
    };
}

/// Implement [`ToValue`]/[`FromValue`] for a nested [`Serializable`](super::Serializable) record.
#[macro_export]
macro_rules! impl_record_value {
    ($ty:ty) => {
        impl $crate::serializer::ToValue for $ty {
            fn to_value(&self) -> $crate::serializer::Value {
                $crate::serializer::Value::Record(
                    <$ty as $crate::serializer::Serializable>::to_fields(self),
                )
            }
        }

        impl $crate::serializer::FromValue for $ty {
            fn from_value(
                value: $crate::serializer::Value,
            ) -> ::std::result::Result<Self, $crate::error::DeserializeError> {
                match value {
                    $crate::serializer::Value::Record(fields) => {
                        <$ty as $crate::serializer::Serializable>::from_fields(fields)
                    }
                    other => Err($crate::error::DeserializeError::InvalidValue {
                        path: String::new(),
                        expected: stringify!($ty),
                        value: other.kind_name().to_string(),
                    }),
                }
            }
        }
    };
}

macro_rules! scalar_value {
    ($ty:ty, $variant:ident, $expected:literal, $missing:expr) => {
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, DeserializeError> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(other.mismatch($expected)),
                }
            }

            fn from_missing() -> Option<Self> {
                $missing
            }
        }
    };
}

scalar_value!(i64, Integer, "integer", Some(0));
scalar_value!(bool, Boolean, "boolean", Some(false));
scalar_value!(Decimal, Decimal, "Decimal", Some(Decimal::ZERO));
scalar_value!(Uuid, Uuid, "UUID", Some(Uuid::nil()));
scalar_value!(NaiveDate, Date, "Date", None);
scalar_value!(DateTime<FixedOffset>, DateTime, "DateTime", None);

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, DeserializeError> {
        match value {
            Value::String(s) | Value::Enum(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    fn from_missing() -> Option<Self> {
        Some(Self::new())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, DeserializeError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn from_missing() -> Option<Self> {
        Some(None)
    }
}

impl<T: ToValue> ToValue for BTreeSet<T> {
    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn from_value(value: Value) -> Result<Self, DeserializeError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Set(items) => items.into_iter().map(T::from_value).collect(),
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(other.mismatch("set")),
        }
    }

    fn from_missing() -> Option<Self> {
        Some(Self::new())
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, DeserializeError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(other.mismatch("list")),
        }
    }

    fn from_missing() -> Option<Self> {
        Some(Self::new())
    }
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self, DeserializeError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| {
                    let label = map_key_label(&k);
                    let key = K::from_value(k).map_err(|e| e.in_field(&label))?;
                    let value = V::from_value(v).map_err(|e| e.in_field(&label))?;
                    Ok((key, value))
                })
                .collect(),
            other => Err(other.mismatch("map")),
        }
    }

    fn from_missing() -> Option<Self> {
        Some(Self::new())
    }
}

fn map_key_label(key: &Value) -> String {
    match key {
        Value::String(s) | Value::Enum(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        other => other.kind_name().to_string(),
    }
}
