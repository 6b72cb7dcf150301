//! path expressions
//!
//! A path is a `.` separated list of segments. Each segment names a member and may carry one selector:
//!
//! | **segment**         | **selector**                                               |
//! |---------------------|------------------------------------------------------------|
//! | `timeout`           | none                                                       |
//! | `tasks[name=build]` | keyed: element of `tasks` whose `name` member is `build`   |
//! | `items[2]`          | positional: third element of `items`                       |
//!
//! Parsing never fails. A bracket that is neither `key=value` nor an integer is ignored.
use std::fmt::{Display, Formatter};

/// A single step of a path
#[derive(derive_new::new, Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub selector: Selector,
}

/// Optional qualifier of a [PathSegment]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    #[default]
    None,
    /// `[name=value]`
    Key { name: String, value: String },
    /// `[index]`
    Index(usize),
}

impl PathSegment {
    fn from_raw(raw: &str) -> Self {
        let Some(bracket) = raw.find('[') else {
            return Self::new(raw.to_string(), Selector::None);
        };

        let name = raw[..bracket].to_string();
        let content = &raw[bracket + 1..];

        let selector = if let Some((key, value)) = content.split_once('=') {
            Selector::Key {
                name: key.to_string(),
                value: value.strip_suffix(']').unwrap_or(value).to_string(),
            }
        } else {
            let index = content.find(']').map_or(content, |end| &content[..end]);
            match index.parse() {
                Ok(index) => Selector::Index(index),
                Err(_) => {
                    tracing::trace!(segment = raw, "ignoring non-integer index");
                    Selector::None
                }
            }
        };

        Self::new(name, selector)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        match &self.selector {
            Selector::None => Ok(()),
            Selector::Key { name, value } => write!(f, "[{name}={value}]"),
            Selector::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Parse a path expression into its segments
///
/// Always yields one segment per `.` separated part.
pub fn parse(path: &str) -> Vec<PathSegment> {
    path.split('.').map(PathSegment::from_raw).collect()
}
