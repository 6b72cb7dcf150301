//! applying declarations to an object graph
//!
//! A [Declaration] is evaluated against user supplied overrides (parameter name to raw value), falling back to the
//! extracted defaults. The resulting value is written to the member its property points at.
//!
//! Properties are stored `/` separated (`tasks/build/timeout`) and resolved as the equivalent dotted path.
use crate::convert::{convert_value, ParameterDefinition};
use crate::extract::Declaration;
use crate::format::{self, FormatError};
use crate::registry::TypeRegistry;
use crate::resolve::find_property;
use crate::schema::ConversionError;
use crate::value::{Record, Value};
use indexmap::IndexMap;

/// Raw parameter values by parameter name
pub type Overrides = IndexMap<String, String>;

#[derive(thiserror::Error, Debug)]
pub enum BindError {
    #[error("cannot bind `{property}`")]
    Conversion {
        property: String,
        #[source]
        source: ConversionError,
    },
    #[error("cannot render `{property}`")]
    Format {
        property: String,
        #[source]
        source: FormatError,
    },
}

/// Value of a declaration with `overrides` applied
///
/// Formatted declarations always evaluate to a string.
pub fn evaluate(
    declaration: &Declaration,
    overrides: &Overrides,
    definitions: &[Box<dyn ParameterDefinition>],
) -> Result<Value, BindError> {
    let conversion_error = |source| BindError::Conversion {
        property: declaration.property().to_string(),
        source,
    };

    match declaration {
        Declaration::Direct {
            parameter, default, ..
        } => {
            let raw = overrides
                .get(parameter)
                .map_or(default.as_str(), String::as_str);
            convert_value(parameter, raw, definitions).map_err(conversion_error)
        }
        Declaration::Formatted {
            format: template,
            parameters,
            ..
        } => {
            let values = parameters
                .iter()
                .map(|parameter| {
                    let raw = overrides
                        .get(&parameter.name)
                        .map_or(parameter.value.as_str(), String::as_str);
                    convert_value(&parameter.name, raw, definitions)
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(conversion_error)?;

            format::format(template, &values)
                .map(Value::String)
                .map_err(|source| BindError::Format {
                    property: declaration.property().to_string(),
                    source,
                })
        }
    }
}

/// Writes evaluated declarations into records described by a [TypeRegistry]
#[derive(derive_new::new)]
pub struct Binder<'a> {
    registry: &'a TypeRegistry,
    definitions: &'a [Box<dyn ParameterDefinition>],
}

impl Binder<'_> {
    /// Evaluate and write every declaration, in order
    ///
    /// Properties that do not resolve are reported, not treated as errors. The first conversion or format failure
    /// stops binding; writes made before it are kept.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn bind(
        &self,
        root: &mut Record,
        declarations: &[Declaration],
        overrides: &Overrides,
    ) -> Result<BindReport, BindError> {
        let mut report = BindReport::new();

        for declaration in declarations {
            let value = evaluate(declaration, overrides, self.definitions)?;
            let path = declaration.property().replace('/', ".");

            match find_property(self.registry, root, &path) {
                Some(mut handle) => {
                    handle
                        .write(value)
                        .map_err(|source| BindError::Conversion {
                            property: declaration.property().to_string(),
                            source,
                        })?;
                    report.applied.push(declaration.property().to_string());
                }
                None => report.log_unresolved(declaration.property()),
            }
        }

        Ok(report)
    }
}

/// Outcome of [Binder::bind]
#[derive(derive_new::new, Debug, Default, PartialEq)]
pub struct BindReport {
    #[new(default)]
    applied: Vec<String>,
    #[new(default)]
    unresolved: Vec<String>,
}

impl BindReport {
    fn log_unresolved(&mut self, property: &str) {
        tracing::debug!(property, "property did not resolve");
        self.unresolved.push(property.to_string());
    }

    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }
}
