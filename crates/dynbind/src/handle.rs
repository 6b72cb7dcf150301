//! read/write access to a resolved member
use crate::registry::MemberDescriptor;
use crate::schema::{ConversionError, ValueType};
use crate::value::{Record, Value};

static NULL: Value = Value::Null;

/// Terminal handle of a resolved path: owner record, member and optional array slot
///
/// The handle borrows the owner mutably, so the object graph cannot change underneath it.
#[derive(Debug)]
pub struct ValueHandle<'v, 'r> {
    owner: &'v mut Record,
    member: &'r MemberDescriptor,
    slot: Option<usize>,
}

impl<'v, 'r> ValueHandle<'v, 'r> {
    pub(crate) fn new(
        owner: &'v mut Record,
        member: &'r MemberDescriptor,
        slot: Option<usize>,
    ) -> Self {
        Self {
            owner,
            member,
            slot,
        }
    }

    pub fn member(&self) -> &'r MemberDescriptor {
        self.member
    }

    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub fn owner(&self) -> &Record {
        &*self.owner
    }

    /// The whole member value
    ///
    /// The slot is ignored: for `items[2]` this returns all of `items`.
    pub fn read(&self) -> &Value {
        self.owner.get(&self.member.name).unwrap_or(&NULL)
    }

    /// Coerce `value` into the declared type and store it
    ///
    /// With a slot the element at that position is replaced, coerced into the element type of an array member.
    /// Otherwise the whole member is replaced. Nothing is modified when the conversion fails.
    pub fn write(&mut self, value: Value) -> Result<(), ConversionError> {
        match self.slot {
            Some(slot) => {
                let value = match &self.member.value_type {
                    ValueType::Array(element_type) => element_type.coerce(value)?,
                    _ => value,
                };
                let element = self
                    .owner
                    .get_mut(&self.member.name)
                    .and_then(Value::as_array_mut)
                    .and_then(|items| items.get_mut(slot));

                let Some(element) = element else {
                    tracing::trace!(member = self.member.name.as_str(), slot, "no element at slot");
                    return Ok(());
                };
                *element = value;
            }
            None => {
                let value = self.member.value_type.coerce(value)?;
                self.owner.set(self.member.name.as_str(), value);
            }
        }

        tracing::trace!(member = self.member.name.as_str(), slot = ?self.slot, "value written");
        Ok(())
    }
}
