//! composite format strings
//!
//! Formatted declarations store their text as a template with numbered placeholders:
//!
//! - `{0}` is replaced by the first value
//! - `{1:D3}` is replaced by the second value, formatted with spec `D3`
//! - `{{` and `}}` are literal braces
//!
//! Supported specs
//!
//! | **spec**      | **applies to**      | **result**                                  |
//! |---------------|---------------------|---------------------------------------------|
//! | `D<n>`        | integer             | zero padded to at least `n` digits          |
//! | `F<n>`, `N<n>`| integer, decimal    | fixed point with `n` decimals (default 2)   |
//! | `X<n>`, `x<n>`| integer             | upper/lower case hex, zero padded to `n`   |
//!
//! Any other spec, a spec that does not apply to the value or a precision above 1024 renders the value as-is.
use crate::value::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),
    #[error("unmatched `}}` at byte {0}")]
    UnmatchedBrace(usize),
    #[error("invalid placeholder `{0}`")]
    InvalidPlaceholder(String),
    #[error("placeholder {index} out of range, {available} value(s) available")]
    OutOfRange { index: usize, available: usize },
}

/// Escape literal text for use inside a template
pub fn escape(literal: &str) -> String {
    literal.replace('{', "{{").replace('}', "}}")
}

/// Render `template` with `values`
pub fn format(template: &str, values: &[Value]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((position, ch)) = chars.next() {
        match ch {
            '{' if chars.peek().map(|(_, c)| *c) == Some('{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek().map(|(_, c)| *c) == Some('}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(FormatError::UnmatchedBrace(position)),
            '{' => {
                let start = position + 1;
                let end = loop {
                    match chars.next() {
                        Some((end, '}')) => break end,
                        Some(_) => {}
                        None => return Err(FormatError::Unterminated(position)),
                    }
                };

                let placeholder = &template[start..end];
                let (index, spec) = placeholder
                    .split_once(':')
                    .map_or((placeholder, None), |(index, spec)| (index, Some(spec)));
                let index: usize = index
                    .trim()
                    .parse()
                    .map_err(|_| FormatError::InvalidPlaceholder(placeholder.to_string()))?;

                let value = values.get(index).ok_or(FormatError::OutOfRange {
                    index,
                    available: values.len(),
                })?;
                out.push_str(&apply_spec(value, spec));
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

/// Largest width or precision a spec may request
const MAX_PRECISION: usize = 1024;

fn apply_spec(value: &Value, spec: Option<&str>) -> String {
    let Some(spec) = spec.filter(|spec| !spec.is_empty()) else {
        return value.to_string();
    };

    let split = spec.char_indices().nth(1).map_or(spec.len(), |(index, _)| index);
    let (kind, precision) = spec.split_at(split);
    let precision: Option<usize> = match precision {
        "" => None,
        digits => match digits.parse() {
            Ok(precision) if precision <= MAX_PRECISION => Some(precision),
            _ => {
                tracing::debug!(spec, "invalid format precision");
                return value.to_string();
            }
        },
    };

    let formatted = match (kind, value) {
        ("D" | "d", Value::Integer(i)) => {
            let width = precision.unwrap_or(0);
            if *i < 0 {
                Some(format!("-{:0width$}", i.unsigned_abs()))
            } else {
                Some(format!("{i:0width$}"))
            }
        }
        ("F" | "f" | "N" | "n", Value::Integer(i)) => {
            Some(format!("{:.*}", precision.unwrap_or(2), *i as f64))
        }
        ("F" | "f" | "N" | "n", Value::Decimal(d)) => {
            Some(format!("{:.*}", precision.unwrap_or(2), d))
        }
        ("X", Value::Integer(i)) => Some(format!("{:0width$X}", i, width = precision.unwrap_or(0))),
        ("x", Value::Integer(i)) => Some(format!("{:0width$x}", i, width = precision.unwrap_or(0))),
        _ => None,
    };

    formatted.unwrap_or_else(|| {
        tracing::debug!(spec, kind = value.kind(), "format spec does not apply");
        value.to_string()
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn placeholders_and_escapes() {
        let values = [Value::from("dev"), Value::Integer(3)];
        assert_eq!(format("Build {0} now", &values).unwrap(), "Build dev now");
        assert_eq!(format("{1}-{0}-{1}", &values).unwrap(), "3-dev-3");
        assert_eq!(format("{{literal}} {0}", &values).unwrap(), "{literal} dev");
    }

    #[test]
    fn escape_round_trips() {
        let literal = "a {b} }{ c";
        assert_eq!(format(&escape(literal), &[]).unwrap(), literal);
    }

    #[test]
    fn format_specs() {
        let values = [
            Value::Integer(7),
            Value::Decimal(1.5),
            Value::Integer(-7),
            Value::Integer(255),
        ];
        assert_eq!(format("{0:D3}", &values).unwrap(), "007");
        assert_eq!(format("{2:D3}", &values).unwrap(), "-007");
        assert_eq!(format("{1:F2}", &values).unwrap(), "1.50");
        assert_eq!(format("{0:N}", &values).unwrap(), "7.00");
        assert_eq!(format("{3:X}", &values).unwrap(), "FF");
        assert_eq!(format("{3:x4}", &values).unwrap(), "00ff");
    }

    #[test]
    fn unknown_specs_fall_back_to_plain_value() {
        let values = [Value::from("dev"), Value::Integer(5)];
        assert_eq!(format("{0:D3}", &values).unwrap(), "dev");
        assert_eq!(format("{1:yyyy}", &values).unwrap(), "5");
        assert_eq!(format("{1:}", &values).unwrap(), "5");
    }

    #[test]
    fn oversized_precision_renders_plain_value() {
        let values = [Value::Integer(1), Value::Decimal(1.5)];
        assert_eq!(format("{0:D70000}", &values).unwrap(), "1");
        assert_eq!(format("{0:F70000}", &values).unwrap(), "1");
        assert_eq!(format("{1:F70000}", &values).unwrap(), "1.5");
        assert_eq!(format("{0:x99999999999999999999}", &values).unwrap(), "1");
        assert_eq!(format("{0:D1024}", &values).unwrap().len(), 1024);
    }

    #[test]
    fn malformed_templates() {
        let values = [Value::from("dev")];
        assert_eq!(format("{0", &values), Err(FormatError::Unterminated(0)));
        assert_eq!(format("a}b", &values), Err(FormatError::UnmatchedBrace(1)));
        assert_eq!(
            format("{x}", &values),
            Err(FormatError::InvalidPlaceholder("x".to_string()))
        );
        assert_eq!(
            format("{1}", &values),
            Err(FormatError::OutOfRange {
                index: 1,
                available: 1
            })
        );
    }
}
