//! template extraction
//!
//! Documents may contain interpolation tokens inside attribute values and text nodes:
//!
//! | **token**                    | **meaning**                                        |
//! |------------------------------|----------------------------------------------------|
//! | `$[name]`                    | parameter `name`, empty default                    |
//! | `$[name\|default]`           | parameter `name` with a default                    |
//! | `$[name\|default\|spec]`     | like above, formatted with `spec` ([crate::format]) |
//!
//! A literal pipe inside a field is written `\|`. A spec containing `{` or `}` is dropped.
//!
//! [extract] turns every token into a [Declaration] and rewrites the text it came from:
//!
//! - a text that is exactly one token without spec becomes a [Declaration::Direct] and the text is replaced by the
//!   default
//! - everything else becomes a [Declaration::Formatted] and the text is replaced by a template with numbered
//!   placeholders, e.g. `Build $[env|dev] now` becomes `Build {0} now`
//!
//! Declarations are stored below the root in a `dynamicValues` element:
//!
//! ```text
//! dynamicValues
//!   directValue property="tasks/build/branch" default="main" parameter="branch"
//!   replacementValue property="tasks/build" format="Build {0} now"
//!     parameters
//!       namedValue name="env" value="dev"
//! ```
use crate::document::{Document, NodeId};
use crate::format;
use crate::visit::{Location, TextSite, VisitMut, VisitTextMut};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

pub const DYNAMIC_VALUES: &str = "dynamicValues";
const DIRECT_VALUE: &str = "directValue";
const REPLACEMENT_VALUE: &str = "replacementValue";
const PARAMETERS: &str = "parameters";
const NAMED_VALUE: &str = "namedValue";

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\[(.*?)\]").expect("token pattern must compile"));

#[derive(derive_new::new, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: String,
}

/// An overridable value extracted from a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Declaration {
    /// The whole text is the parameter value
    Direct {
        property: String,
        parameter: String,
        default: String,
    },
    /// The text is rendered from `format` and the named values
    Formatted {
        property: String,
        format: String,
        parameters: Vec<NamedValue>,
    },
}

impl Declaration {
    /// `/` separated origin of the rewritten text
    pub fn property(&self) -> &str {
        match self {
            Declaration::Direct { property, .. } | Declaration::Formatted { property, .. } => {
                property
            }
        }
    }

    fn write(&self, document: &mut Document, container: NodeId) {
        match self {
            Declaration::Direct {
                property,
                parameter,
                default,
            } => {
                let node = document.create_element(container, DIRECT_VALUE);
                document.set_attribute(node, "property", property);
                document.set_attribute(node, "default", default);
                document.set_attribute(node, "parameter", parameter);
            }
            Declaration::Formatted {
                property,
                format,
                parameters,
            } => {
                let node = document.create_element(container, REPLACEMENT_VALUE);
                document.set_attribute(node, "property", property);
                document.set_attribute(node, "format", format);

                let list = document.create_element(node, PARAMETERS);
                for parameter in parameters {
                    let named_value = document.create_element(list, NAMED_VALUE);
                    document.set_attribute(named_value, "name", &parameter.name);
                    document.set_attribute(named_value, "value", &parameter.value);
                }
            }
        }
    }

    fn read(document: &Document, id: NodeId) -> Option<Self> {
        let attribute = |name: &str| document.attribute(id, name).map(str::to_string);

        match document.tag(id)? {
            DIRECT_VALUE => Some(Declaration::Direct {
                property: attribute("property")?,
                parameter: attribute("parameter")?,
                default: attribute("default").unwrap_or_default(),
            }),
            REPLACEMENT_VALUE => {
                let parameters = document
                    .child_element(id, PARAMETERS)
                    .map(|list| {
                        document
                            .children(list)
                            .iter()
                            .filter(|child| document.tag(**child) == Some(NAMED_VALUE))
                            .filter_map(|child| {
                                Some(NamedValue::new(
                                    document.attribute(*child, "name")?.to_string(),
                                    document
                                        .attribute(*child, "value")
                                        .unwrap_or_default()
                                        .to_string(),
                                ))
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                Some(Declaration::Formatted {
                    property: attribute("property")?,
                    format: attribute("format")?,
                    parameters,
                })
            }
            other => {
                tracing::trace!(tag = other, "not a declaration");
                None
            }
        }
    }

    /// Declarations previously stored below `root`
    pub fn read_all(document: &Document, root: NodeId) -> Vec<Self> {
        document
            .child_element(root, DYNAMIC_VALUES)
            .map(|container| {
                document
                    .children(container)
                    .iter()
                    .filter_map(|id| Self::read(document, *id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The rewritten document and everything that was extracted from it
#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: Document,
    pub declarations: Vec<Declaration>,
}

/// Extract all tokens below `root`
///
/// The input is left untouched; node ids of the input stay valid for the returned document.
/// Running this on its own output yields no declarations and an unchanged document.
#[tracing::instrument(level = "trace", skip_all)]
pub fn extract(document: &Document, root: NodeId) -> Extraction {
    let mut document = document.clone();

    let skipped = document
        .child_element(root, DYNAMIC_VALUES)
        .map(|container| subtree(&document, container))
        .unwrap_or_default();
    let mut extractor = TokenExtractor::new(skipped);
    document.visit_text_mut(root, &mut extractor);
    let declarations = extractor.declarations;

    if !declarations.is_empty() {
        let container = document
            .child_element(root, DYNAMIC_VALUES)
            .unwrap_or_else(|| document.create_element(root, DYNAMIC_VALUES));

        for declaration in &declarations {
            declaration.write(&mut document, container);
        }
        tracing::debug!(count = declarations.len(), "declarations extracted");
    }

    Extraction {
        document,
        declarations,
    }
}

/// `id` and all of its descendants
fn subtree(document: &Document, id: NodeId) -> HashSet<NodeId> {
    let mut nodes = HashSet::new();
    let mut pending = vec![id];
    while let Some(node) = pending.pop() {
        nodes.insert(node);
        pending.extend_from_slice(document.children(node));
    }
    nodes
}

#[derive(derive_new::new)]
struct TokenExtractor {
    /// nodes of the existing declaration container
    skipped: HashSet<NodeId>,
    #[new(default)]
    declarations: Vec<Declaration>,
}

impl VisitMut<TextSite> for TokenExtractor {
    fn visit_mut(&mut self, site: &mut TextSite) {
        let node = match &site.location {
            Location::Text(id) => *id,
            Location::Attribute { element, .. } => *element,
        };
        if self.skipped.contains(&node) {
            return;
        }

        if let Some((declaration, text)) = rewrite(&site.origin, &site.text) {
            site.text = text;
            self.declarations.push(declaration);
        }
    }
}

/// Declaration and replacement text for `text`, `None` if it has no tokens
fn rewrite(property: &str, text: &str) -> Option<(Declaration, String)> {
    let mut template = String::with_capacity(text.len());
    let mut parameters = vec![];
    let mut formatted = false;
    let mut covers_text = false;
    let mut last = 0;

    for (index, captures) in TOKEN.captures_iter(text).enumerate() {
        let Some(token) = captures.get(0) else {
            continue;
        };
        let body = captures.get(1).map_or("", |body| body.as_str());

        template.push_str(&format::escape(&text[last..token.start()]));
        last = token.end();
        covers_text = token.start() == 0 && token.end() == text.len();

        let mut fields = split_fields(body).into_iter();
        let name = fields.next().unwrap_or_default();
        let default = fields.next().unwrap_or_default();
        match fields.next() {
            Some(spec) if spec.contains(['{', '}']) => {
                tracing::debug!(spec = spec.as_str(), "dropping format spec with braces");
                template.push_str(&format!("{{{index}}}"));
            }
            Some(spec) => {
                formatted = true;
                template.push_str(&format!("{{{index}:{spec}}}"));
            }
            None => template.push_str(&format!("{{{index}}}")),
        }

        parameters.push(NamedValue::new(name, default));
    }

    if parameters.is_empty() {
        return None;
    }
    template.push_str(&format::escape(&text[last..]));

    let property = property.to_string();
    if parameters.len() == 1 && covers_text && !formatted {
        let NamedValue { name, value } = parameters.remove(0);
        let declaration = Declaration::Direct {
            property,
            parameter: name,
            default: value.clone(),
        };
        return Some((declaration, value));
    }

    let declaration = Declaration::Formatted {
        property,
        format: template.clone(),
        parameters,
    };
    Some((declaration, template))
}

/// Split a token body into at most three fields on unescaped `|`
///
/// The last field keeps any further pipes. `\|` becomes `|`.
fn split_fields(body: &str) -> Vec<String> {
    let mut fields = vec![String::new()];
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        let literal = match ch {
            '\\' if chars.peek() == Some(&'|') => {
                chars.next();
                '|'
            }
            '|' if fields.len() < 3 => {
                fields.push(String::new());
                continue;
            }
            ch => ch,
        };

        if let Some(field) = fields.last_mut() {
            field.push(literal);
        }
    }

    fields
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        let mut document = Document::new("config");
        let tasks = document.create_element(document.root(), "tasks");
        let build = document.create_element(tasks, "build");
        document.set_attribute(build, "branch", "$[branch|main]");
        document.append_text(build, "Build $[env|dev] now");
        document
    }

    #[test]
    fn direct_and_formatted() {
        let document = sample();
        let extraction = extract(&document, document.root());

        assert_eq!(
            extraction.declarations,
            vec![
                Declaration::Direct {
                    property: "tasks/build/branch".to_string(),
                    parameter: "branch".to_string(),
                    default: "main".to_string(),
                },
                Declaration::Formatted {
                    property: "tasks/build".to_string(),
                    format: "Build {0} now".to_string(),
                    parameters: vec![NamedValue::new("env".to_string(), "dev".to_string())],
                },
            ]
        );
        assert_eq!(
            extraction.document.to_string(),
            r#"config
  tasks
    build branch="main"
      "Build {0} now"
  dynamicValues
    directValue property="tasks/build/branch" default="main" parameter="branch"
    replacementValue property="tasks/build" format="Build {0} now"
      parameters
        namedValue name="env" value="dev"
"#
        );
    }

    #[test]
    fn input_is_left_untouched() {
        let document = sample();
        let before = document.clone();
        let _ = extract(&document, document.root());
        assert_eq!(document, before);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let document = sample();
        let first = extract(&document, document.root());
        let second = extract(&first.document, first.document.root());

        assert!(second.declarations.is_empty());
        assert_eq!(second.document, first.document);
    }

    #[test]
    fn stored_declarations_read_back() {
        let document = sample();
        let extraction = extract(&document, document.root());
        assert_eq!(
            Declaration::read_all(&extraction.document, extraction.document.root()),
            extraction.declarations
        );
        assert!(Declaration::read_all(&document, document.root()).is_empty());
    }

    #[test]
    fn existing_container_is_reused() {
        let mut document = sample();
        let root = document.root();
        document.create_element(root, DYNAMIC_VALUES);

        let extraction = extract(&document, root);
        let containers = extraction
            .document
            .children(root)
            .iter()
            .filter(|child| extraction.document.tag(**child) == Some(DYNAMIC_VALUES))
            .count();
        assert_eq!(containers, 1);
        assert_eq!(
            Declaration::read_all(&extraction.document, root).len(),
            2
        );
    }

    #[test]
    fn root_attribute_named_like_the_container() {
        let mut document = Document::new("config");
        let root = document.root();
        document.set_attribute(root, DYNAMIC_VALUES, "$[mode|on]");

        let first = extract(&document, root);
        assert_eq!(
            first.declarations,
            vec![Declaration::Direct {
                property: DYNAMIC_VALUES.to_string(),
                parameter: "mode".to_string(),
                default: "on".to_string(),
            }]
        );
        assert_eq!(first.document.attribute(root, DYNAMIC_VALUES), Some("on"));

        let second = extract(&first.document, root);
        assert!(second.declarations.is_empty());
        assert_eq!(second.document, first.document);
    }

    #[test]
    fn no_tokens_no_container() {
        let mut document = Document::new("config");
        let root = document.root();
        document.set_attribute(root, "version", "1");
        document.append_text(root, "plain [text] $ here");

        let extraction = extract(&document, root);
        assert!(extraction.declarations.is_empty());
        assert_eq!(extraction.document, document);
    }

    #[test]
    fn token_shapes() {
        let cases = [
            ("$[name]", "", None),
            ("$[v|1]", "1", None),
            ("$[count|5|D3]", "{0:D3}", Some("{0:D3}")),
            ("x $[v|1]", "x {0}", Some("x {0}")),
            ("$[a|1]-$[b|2]", "{0}-{1}", Some("{0}-{1}")),
            ("{x} $[a|1]", "{{x}} {0}", Some("{{x}} {0}")),
        ];

        for (text, rewritten, format) in cases {
            let (declaration, replacement) = rewrite("version", text).unwrap();
            assert_eq!(replacement, rewritten, "{text}");
            match (declaration, format) {
                (Declaration::Direct { property, .. }, None) => assert_eq!(property, "version"),
                (Declaration::Formatted { format: actual, .. }, Some(expected)) => {
                    assert_eq!(actual, expected, "{text}")
                }
                (other, _) => panic!("unexpected declaration for {text}: {other:?}"),
            }
        }
    }

    #[test]
    fn specs_with_braces_are_dropped() {
        let (declaration, text) = rewrite("v", "$[n|1|a}b]").unwrap();
        assert_eq!(
            declaration,
            Declaration::Direct {
                property: "v".to_string(),
                parameter: "n".to_string(),
                default: "1".to_string(),
            }
        );
        assert_eq!(text, "1");

        let (declaration, _) = rewrite("v", "x $[n|1|{D2]").unwrap();
        let Declaration::Formatted { format, parameters, .. } = declaration else {
            panic!("expected a formatted declaration");
        };
        assert_eq!(format, "x {0}");
        let defaults: Vec<Value> = parameters
            .into_iter()
            .map(|parameter| Value::String(parameter.value))
            .collect();
        assert_eq!(format::format(&format, &defaults).unwrap(), "x 1");
    }

    #[test]
    fn escaped_pipes() {
        let (declaration, _) = rewrite("title", r"$[a\|b|x\|y|F2]").unwrap();
        assert_eq!(
            declaration,
            Declaration::Formatted {
                property: "title".to_string(),
                format: "{0:F2}".to_string(),
                parameters: vec![NamedValue::new("a|b".to_string(), "x|y".to_string())],
            }
        );
    }

    #[test]
    fn field_splitting() {
        assert_eq!(split_fields(""), vec![""]);
        assert_eq!(split_fields("env"), vec!["env"]);
        assert_eq!(split_fields("env|"), vec!["env", ""]);
        assert_eq!(split_fields("n|1|D|3"), vec!["n", "1", "D|3"]);
        assert_eq!(split_fields(r"a\b|c"), vec![r"a\b", "c"]);
    }

    #[test]
    fn defaults_render_the_original_text() {
        let text = "Deploy $[app|web] to {region} $[env|dev]";
        let (declaration, _) = rewrite("description", text).unwrap();
        let Declaration::Formatted {
            format, parameters, ..
        } = declaration
        else {
            panic!("expected a formatted declaration");
        };

        let defaults: Vec<Value> = parameters
            .into_iter()
            .map(|parameter| Value::String(parameter.value))
            .collect();
        assert_eq!(
            format::format(&format, &defaults).unwrap(),
            "Deploy web to {region} dev"
        );
    }
}
