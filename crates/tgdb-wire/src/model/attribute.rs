//! Attributes: a descriptor plus a typed value with dirty tracking.

use std::sync::Arc;

use crate::config::ModelOptions;
use crate::error::Result;
use crate::model::descriptor::apply_decimal_shape;
use crate::model::value::coerce;
use crate::model::{AttributeDescriptor, AttributeKind, AttributeValue, ValueInput};

/// Server-side handle of a Blob or Clob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LargeObject {
    /// Id of the stored object. Negative until the server assigns one.
    pub remote_id: i64,
    /// True when the bytes are held locally; false for a placeholder that
    /// still has to be fetched.
    pub is_cached: bool,
}

/// A named, typed value attached to an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    descriptor: Arc<AttributeDescriptor>,
    value: Option<AttributeValue>,
    is_modified: bool,
    large_object: Option<LargeObject>,
}

impl Attribute {
    /// Creates a null, unmodified attribute.
    pub fn new(descriptor: Arc<AttributeDescriptor>) -> Self {
        let large_object = descriptor.kind().is_large_object().then_some(LargeObject {
            remote_id: 0,
            is_cached: true,
        });
        Self {
            descriptor,
            value: None,
            is_modified: false,
            large_object,
        }
    }

    pub fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn kind(&self) -> AttributeKind {
        self.descriptor.kind()
    }

    pub fn value(&self) -> Option<&AttributeValue> {
        self.value.as_ref()
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Clears the dirty flag, e.g. after a successful commit.
    pub fn reset_modified(&mut self) {
        self.is_modified = false;
    }

    pub(crate) fn mark_modified(&mut self) {
        self.is_modified = true;
    }

    /// Large-object handle, for Blob and Clob attributes only.
    pub fn large_object(&self) -> Option<LargeObject> {
        self.large_object
    }

    /// Sets the value using the default [`ModelOptions`].
    pub fn set_value<'a>(&mut self, input: impl Into<ValueInput<'a>>) -> Result<()> {
        self.set_value_with(input, &ModelOptions::default())
    }

    /// Coerces `input` to this attribute's kind and stores it.
    ///
    /// Null always succeeds and marks the attribute modified. Storing a value
    /// equal to the current one changes nothing. On a coercion failure the
    /// previous value is kept. A Blob or Clob that already holds bytes
    /// ignores further assignments.
    pub fn set_value_with<'a>(
        &mut self,
        input: impl Into<ValueInput<'a>>,
        options: &ModelOptions,
    ) -> Result<()> {
        let input = input.into();
        if input.is_null() {
            self.value = None;
            self.is_modified = true;
            return Ok(());
        }

        let kind = self.kind();
        if kind.is_large_object() && self.value.is_some() {
            return Ok(());
        }

        let Some(value) = coerce(kind, input, options)? else {
            return Ok(());
        };
        if self.value.as_ref() == Some(&value) {
            return Ok(());
        }

        if let AttributeValue::Number(decimal) = &value {
            apply_decimal_shape(&self.descriptor, decimal);
        }
        if let Some(lob) = self.large_object.as_mut() {
            lob.is_cached = true;
        }
        self.value = Some(value);
        self.is_modified = true;
        Ok(())
    }

    /// Stores a value read from the wire. Decoded values are clean.
    pub(crate) fn set_decoded(&mut self, value: Option<AttributeValue>) {
        if let Some(AttributeValue::Number(decimal)) = &value {
            apply_decimal_shape(&self.descriptor, decimal);
        }
        self.value = value;
        self.is_modified = false;
    }

    /// Records the large-object handle read from the wire.
    pub(crate) fn set_large_object(&mut self, lob: LargeObject) {
        self.large_object = Some(lob);
    }

    /// Stores bytes fetched for a placeholder and marks them cached.
    pub(crate) fn cache_large_object(&mut self, bytes: Vec<u8>) {
        self.value = Some(match self.kind() {
            AttributeKind::Clob => AttributeValue::Clob(bytes),
            _ => AttributeValue::Blob(bytes),
        });
        if let Some(lob) = self.large_object.as_mut() {
            lob.is_cached = true;
        }
    }
}
