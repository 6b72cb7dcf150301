//! member discovery by declared external name
//!
//! Configuration documents address types and members by their *external* names (`timeout`, `compile`), while
//! [Record]s store members by their *internal* names (`Timeout`, `CompileTask`). A [TypeRegistry] is the table
//! connecting the two:
//!
//! ```text
//! internal type name -> TypeDescriptor { type tag, [MemberDescriptor { internal, external, kind, type }] }
//! ```
use crate::schema::ValueType;
use crate::value::{Record, Value};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Field,
}

#[derive(derive_new::new, Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    /// Key of the member inside its [Record]
    pub name: String,
    /// Name used by paths and documents
    pub external_name: String,
    pub kind: MemberKind,
    pub value_type: ValueType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    /// Declared external type name, used to pick elements out of collections
    pub type_tag: String,
    members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            members: vec![],
        }
    }

    pub fn property(
        self,
        name: impl Into<String>,
        external_name: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        self.member(name, external_name, MemberKind::Property, value_type)
    }

    pub fn field(
        self,
        name: impl Into<String>,
        external_name: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        self.member(name, external_name, MemberKind::Field, value_type)
    }

    fn member(
        mut self,
        name: impl Into<String>,
        external_name: impl Into<String>,
        kind: MemberKind,
        value_type: ValueType,
    ) -> Self {
        self.members.push(MemberDescriptor::new(
            name.into(),
            external_name.into(),
            kind,
            value_type,
        ));
        self
    }

    /// Properties first, then fields, each in declaration order
    pub fn members(&self) -> impl Iterator<Item = &MemberDescriptor> {
        let properties = self
            .members
            .iter()
            .filter(|member| member.kind == MemberKind::Property);
        let fields = self
            .members
            .iter()
            .filter(|member| member.kind == MemberKind::Field);
        properties.chain(fields)
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Register a type, replacing an earlier descriptor of the same name
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        if let Some(previous) = self.types.insert(descriptor.name.clone(), descriptor) {
            tracing::debug!(type_name = previous.name.as_str(), "type descriptor replaced");
        }
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    /// Declared external type name of a record
    pub fn type_tag(&self, record: &Record) -> Option<&str> {
        self.get(record.type_name())
            .map(|descriptor| descriptor.type_tag.as_str())
    }

    /// Find the member of `record` whose external name is `external_name`
    ///
    /// First match wins. Unregistered types have no members.
    pub fn resolve_member(&self, record: &Record, external_name: &str) -> Option<&MemberDescriptor> {
        let Some(descriptor) = self.get(record.type_name()) else {
            tracing::trace!(type_name = record.type_name(), "unregistered type");
            return None;
        };

        let member = descriptor
            .members()
            .find(|member| member.external_name == external_name);

        if member.is_none() {
            tracing::trace!(
                type_name = record.type_name(),
                external_name,
                "no such member"
            );
        }
        member
    }

    /// Value of the member with the given external name, if the member exists and is set
    pub fn member_value<'v>(&self, record: &'v Record, external_name: &str) -> Option<&'v Value> {
        self.resolve_member(record, external_name)
            .and_then(|member| record.get(&member.name))
    }

    /// Pick the record whose type tag is `tag`
    ///
    /// When several candidates share the tag the *last* one is returned.
    /// Candidates that are not records are skipped.
    pub fn select_by_type_tag<'v>(
        &self,
        candidates: impl IntoIterator<Item = &'v mut Value>,
        tag: &str,
    ) -> Option<&'v mut Value> {
        candidates
            .into_iter()
            .filter(|candidate| {
                candidate
                    .as_record()
                    .and_then(|record| self.type_tag(record))
                    .is_some_and(|candidate_tag| candidate_tag == tag)
            })
            .last()
    }
}
