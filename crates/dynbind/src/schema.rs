//! declared member types and scalar coercion
//!
//! Every member registered in a [crate::registry::TypeRegistry] declares a [ValueType]. Values written through a
//! [crate::handle::ValueHandle] are coerced into that type first.
use crate::value::Value;
use std::fmt::{Display, Formatter};

/// Declared type of a member
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    /// Accepts every value as-is
    Any,
    Boolean,
    Integer,
    Decimal,
    String,
    Enum(EnumType),
    /// Sequence of the given element type
    Array(Box<ValueType>),
    /// Record with the given (internal) type name
    Record(String),
}

/// A closed set of named variants, stored as [Value::String]
#[derive(derive_new::new, Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumType {
    /// Canonical spelling of `candidate`, compared case-insensitively
    fn variant(&self, candidate: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|variant| variant.eq_ignore_ascii_case(candidate.trim()))
            .map(String::as_str)
    }
}

#[derive(thiserror::Error, derive_new::new, Debug, Clone, PartialEq)]
#[error("cannot convert {kind} `{value}` to {target}")]
pub struct ConversionError {
    pub kind: &'static str,
    pub value: String,
    pub target: String,
}

impl ConversionError {
    fn of(value: &Value, target: &ValueType) -> Self {
        Self::new(value.kind(), value.to_string(), target.to_string())
    }
}

impl ValueType {
    pub fn array_of(element: ValueType) -> Self {
        Self::Array(Box::new(element))
    }

    /// `value` can be stored without conversion
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (Self::Any, _) => true,
            (Self::Boolean, Value::Boolean(_))
            | (Self::Integer, Value::Integer(_))
            | (Self::Decimal, Value::Decimal(_))
            | (Self::String, Value::String(_)) => true,
            (Self::Enum(enum_type), Value::String(s)) => enum_type.variants.contains(s),
            (Self::Array(element), Value::Array(items)) => {
                items.iter().all(|item| element.matches(item))
            }
            (Self::Record(type_name), Value::Record(record)) => record.type_name() == type_name,
            _ => false,
        }
    }

    /// Convert `value` into this type
    ///
    /// Values that already match are returned unchanged.
    pub fn coerce(&self, value: Value) -> Result<Value, ConversionError> {
        if self.matches(&value) {
            return Ok(value);
        }

        if let (Self::Array(element), Value::Array(items)) = (self, &value) {
            return items
                .iter()
                .map(|item| element.coerce(item.clone()))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array);
        }

        let converted = match (self, &value) {
            (Self::Boolean, Value::String(s)) => match s.trim() {
                s if s.eq_ignore_ascii_case("true") => Some(Value::Boolean(true)),
                s if s.eq_ignore_ascii_case("false") => Some(Value::Boolean(false)),
                _ => None,
            },
            (Self::Boolean, Value::Integer(i)) => Some(Value::Boolean(*i != 0)),

            (Self::Integer, Value::String(s)) => s.trim().parse().ok().map(Value::Integer),
            (Self::Integer, Value::Boolean(b)) => Some(Value::Integer(i64::from(*b))),
            (Self::Integer, Value::Decimal(d))
                if d.fract() == 0.0 && *d >= i64::MIN as f64 && *d < i64::MAX as f64 =>
            {
                Some(Value::Integer(*d as i64))
            }

            (Self::Decimal, Value::String(s)) => s.trim().parse().ok().map(Value::Decimal),
            (Self::Decimal, Value::Integer(i)) => Some(Value::Decimal(*i as f64)),

            (Self::String, Value::Boolean(_) | Value::Integer(_) | Value::Decimal(_)) => {
                Some(Value::String(value.to_string()))
            }

            (Self::Enum(enum_type), Value::String(s)) => enum_type.variant(s).map(Value::from),
            (Self::Enum(enum_type), Value::Integer(i)) => usize::try_from(*i)
                .ok()
                .and_then(|ordinal| enum_type.variants.get(ordinal))
                .map(|variant| Value::from(variant.as_str())),

            _ => None,
        };

        converted.ok_or_else(|| {
            tracing::debug!(?value, target=%self, "conversion failed");
            ConversionError::of(&value, self)
        })
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Any => f.write_str("any"),
            ValueType::Boolean => f.write_str("boolean"),
            ValueType::Integer => f.write_str("integer"),
            ValueType::Decimal => f.write_str("decimal"),
            ValueType::String => f.write_str("string"),
            ValueType::Enum(enum_type) => write!(f, "enum {}", enum_type.name),
            ValueType::Array(element) => write!(f, "array of {element}"),
            ValueType::Record(type_name) => write!(f, "record {type_name}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Record;
    use pretty_assertions::assert_eq;

    fn level() -> ValueType {
        ValueType::Enum(EnumType::new(
            "Level".to_string(),
            vec!["Debug".to_string(), "Release".to_string()],
        ))
    }

    #[test]
    fn strings_parse_into_scalars() {
        assert_eq!(ValueType::Integer.coerce("60".into()), Ok(Value::Integer(60)));
        assert_eq!(ValueType::Decimal.coerce(" 1.5 ".into()), Ok(Value::Decimal(1.5)));
        assert_eq!(ValueType::Boolean.coerce("TRUE".into()), Ok(Value::Boolean(true)));
    }

    #[test]
    fn numbers_widen_and_narrow() {
        assert_eq!(ValueType::Decimal.coerce(Value::Integer(2)), Ok(Value::Decimal(2.0)));
        assert_eq!(ValueType::Integer.coerce(Value::Decimal(3.0)), Ok(Value::Integer(3)));
        assert!(ValueType::Integer.coerce(Value::Decimal(3.5)).is_err());
    }

    #[test]
    fn decimals_outside_integer_range_fail() {
        assert!(ValueType::Integer.coerce(Value::Decimal(1e20)).is_err());
        assert!(ValueType::Integer.coerce(Value::Decimal(-1e20)).is_err());
        assert!(ValueType::Integer.coerce(Value::Decimal(f64::INFINITY)).is_err());
        assert!(ValueType::Integer.coerce(Value::Decimal(f64::NAN)).is_err());
        assert_eq!(
            ValueType::Integer.coerce(Value::Decimal(-9_007_199_254_740_992.0)),
            Ok(Value::Integer(-9_007_199_254_740_992))
        );
    }

    #[test]
    fn scalars_stringify() {
        assert_eq!(ValueType::String.coerce(Value::Integer(7)), Ok(Value::from("7")));
        assert!(ValueType::String.coerce(Value::from(vec!["a"])).is_err());
    }

    #[test]
    fn enums_use_canonical_variant() {
        assert_eq!(level().coerce("release".into()), Ok(Value::from("Release")));
        assert_eq!(level().coerce(Value::Integer(0)), Ok(Value::from("Debug")));
        assert!(level().coerce("profile".into()).is_err());
        assert!(level().coerce(Value::Integer(-1)).is_err());
    }

    #[test]
    fn arrays_coerce_element_wise() {
        let numbers = ValueType::array_of(ValueType::Integer);
        assert_eq!(
            numbers.coerce(Value::from(vec!["1", "2"])),
            Ok(Value::from(vec![1_i64, 2]))
        );
        assert!(numbers.coerce(Value::from(vec!["1", "x"])).is_err());
    }

    #[test]
    fn records_must_match_declared_type() {
        let task = ValueType::Record("Task".to_string());
        assert!(task.coerce(Record::new("Task").into()).is_ok());
        assert!(task.coerce(Record::new("Other").into()).is_err());
    }

    #[test]
    fn null_is_always_accepted() {
        assert_eq!(ValueType::Integer.coerce(Value::Null), Ok(Value::Null));
    }

    #[test]
    fn error_message() {
        let error = ValueType::Integer.coerce("sixty".into()).unwrap_err();
        assert_eq!(error.to_string(), "cannot convert string `sixty` to integer");
    }
}
