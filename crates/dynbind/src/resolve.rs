//! path resolution against an object graph
//!
//! Walks a parsed path segment by segment, starting at a root [Record]:
//!
//! - a bare name resolves a member and defers dereferencing it to the next segment, so the last bare member stays
//!   addressable through its owner
//! - `[key=value]` dereferences the member into a collection and continues with the first element whose `key` member
//!   stringifies to `value`
//! - `[index]` dereferences the member into a collection and continues with the element at `index`
//! - a segment that is reached while standing on a collection (`tasks.compile`) picks an element by its type tag
//!
//! Anything missing along the way ends the walk with `None`.
use crate::handle::ValueHandle;
use crate::path::{self, PathSegment, Selector};
use crate::registry::{MemberDescriptor, TypeRegistry};
use crate::value::{Record, Value};

/// Where the walk currently stands
enum Cursor<'v> {
    Record(&'v mut Record),
    Sequence(&'v mut Vec<Value>),
}

impl<'v> Cursor<'v> {
    /// Scalars and null cannot be navigated further
    fn from_value(value: &'v mut Value) -> Option<Self> {
        match value {
            Value::Record(record) => Some(Cursor::Record(record)),
            Value::Array(items) => Some(Cursor::Sequence(items)),
            _ => None,
        }
    }
}

/// Resolve `path` to a writable handle
#[tracing::instrument(level = "trace", skip(registry, root))]
pub fn find_property<'v, 'r>(
    registry: &'r TypeRegistry,
    root: &'v mut Record,
    path: &str,
) -> Option<ValueHandle<'v, 'r>> {
    let segments = path::parse(path);
    let handle = find_segments(registry, root, &segments);
    if handle.is_none() {
        tracing::debug!(path, "path did not resolve");
    }
    handle
}

/// Resolve already parsed segments
///
/// Only the resolution of the final segment produces a handle. A path ending in a keyed or type tag selection has
/// no member to write to and does not resolve.
pub fn find_segments<'v, 'r>(
    registry: &'r TypeRegistry,
    root: &'v mut Record,
    segments: &[PathSegment],
) -> Option<ValueHandle<'v, 'r>> {
    let last = segments.len().checked_sub(1)?;
    let mut cursor = Cursor::Record(root);
    let mut pending: Option<&'r MemberDescriptor> = None;

    for (position, segment) in segments.iter().enumerate() {
        if let Some(member) = pending.take() {
            let Cursor::Record(owner) = cursor else {
                return None;
            };
            cursor = Cursor::from_value(owner.get_mut(&member.name)?)?;
        }

        let record = match cursor {
            Cursor::Sequence(items) => {
                let element = registry.select_by_type_tag(items.iter_mut(), &segment.name)?;
                cursor = Cursor::from_value(element)?;
                continue;
            }
            Cursor::Record(record) => record,
        };

        let member = registry.resolve_member(record, &segment.name)?;

        match &segment.selector {
            Selector::None => {
                pending = Some(member);
                cursor = Cursor::Record(record);
            }
            Selector::Key { name, value } => {
                let items = record.get_mut(&member.name)?.as_array_mut()?;
                let Some(element) = items
                    .iter_mut()
                    .find(|item| key_matches(registry, item, name, value))
                else {
                    tracing::trace!(%segment, "no element with matching key");
                    return None;
                };
                cursor = Cursor::from_value(element)?;
            }
            Selector::Index(index) => {
                let len = record.get(&member.name)?.as_array()?.len();
                if *index >= len {
                    tracing::trace!(%segment, len, "index out of range");
                    return None;
                }

                if position == last {
                    return Some(ValueHandle::new(record, member, Some(*index)));
                }

                let element = record
                    .get_mut(&member.name)?
                    .as_array_mut()?
                    .get_mut(*index)?;
                cursor = Cursor::from_value(element)?;
            }
        }
    }

    let member = pending?;
    match cursor {
        Cursor::Record(owner) => Some(ValueHandle::new(owner, member, None)),
        Cursor::Sequence(_) => None,
    }
}

fn key_matches(registry: &TypeRegistry, item: &Value, key: &str, expected: &str) -> bool {
    item.as_record()
        .and_then(|record| registry.member_value(record, key))
        .is_some_and(|value| !value.is_null() && value.to_string() == expected)
}
