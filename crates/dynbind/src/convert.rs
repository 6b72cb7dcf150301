//! raw parameter values to typed values
use crate::schema::{ConversionError, ValueType};
use crate::value::Value;

/// A named parameter that knows how to interpret its raw string value
pub trait ParameterDefinition {
    fn name(&self) -> &str;
    fn convert(&self, raw: &str) -> Result<Value, ConversionError>;
}

/// Parameter that converts its raw value into a fixed [ValueType]
#[derive(derive_new::new, Debug, Clone)]
pub struct TypedParameter {
    name: String,
    value_type: ValueType,
}

impl ParameterDefinition for TypedParameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
        self.value_type.coerce(Value::from(raw))
    }
}

/// Convert `raw` with the first definition named `name`
///
/// Without a matching definition the raw string is returned as-is.
pub fn convert_value(
    name: &str,
    raw: &str,
    definitions: &[Box<dyn ParameterDefinition>],
) -> Result<Value, ConversionError> {
    match definitions
        .iter()
        .find(|definition| definition.name() == name)
    {
        Some(definition) => definition.convert(raw),
        None => {
            tracing::trace!(name, "no parameter definition, keeping raw value");
            Ok(Value::from(raw))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Shouting;

    impl ParameterDefinition for Shouting {
        fn name(&self) -> &str {
            "env"
        }

        fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
            Ok(raw.to_uppercase().into())
        }
    }

    fn definitions() -> Vec<Box<dyn ParameterDefinition>> {
        vec![
            Box::new(TypedParameter::new("timeout".to_string(), ValueType::Integer)),
            Box::new(Shouting),
            Box::new(TypedParameter::new("env".to_string(), ValueType::Integer)),
        ]
    }

    #[test]
    fn first_matching_definition_converts() {
        let definitions = definitions();
        assert_eq!(convert_value("timeout", "60", &definitions), Ok(Value::Integer(60)));
        assert_eq!(convert_value("env", "prod", &definitions), Ok(Value::from("PROD")));
    }

    #[test]
    fn unknown_name_keeps_raw_string() {
        assert_eq!(
            convert_value("branch", "main", &definitions()),
            Ok(Value::from("main"))
        );
        assert_eq!(convert_value("branch", "main", &[]), Ok(Value::from("main")));
    }

    #[test]
    fn conversion_errors_propagate() {
        assert!(convert_value("timeout", "later", &definitions()).is_err());
    }
}
