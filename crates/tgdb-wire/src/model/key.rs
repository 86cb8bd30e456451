//! Lookup keys for fetching a single node by attribute values.

use crate::error::{Result, SchemaError};
use crate::metadata::GraphMetadata;
use crate::model::factory::create_attribute_with_descriptor;
use crate::model::{Attribute, ValueInput};

/// A set of attribute values identifying one node, optionally scoped to a
/// node type. Attributes keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeKey {
    type_name: Option<String>,
    attributes: Vec<Attribute>,
}

impl CompositeKey {
    pub fn new(type_name: Option<String>) -> Self {
        Self {
            type_name,
            attributes: Vec::new(),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Sets a key value, creating the attribute and, if needed, its
    /// descriptor. Keys cannot hold nulls.
    pub fn set_or_create_attribute<'a>(
        &mut self,
        metadata: &GraphMetadata,
        name: &str,
        value: impl Into<ValueInput<'a>>,
    ) -> Result<()> {
        let value = value.into();
        if name.is_empty() {
            return Err(SchemaError::UnnamedDescriptor.into());
        }
        if value.is_null() {
            return Err(SchemaError::NullKeyValue {
                name: name.to_string(),
            }
            .into());
        }

        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name() == name) {
            return existing.set_value_with(value, metadata.options());
        }
        let descriptor = metadata.resolve_or_create_descriptor(name, value.inferred_kind())?;
        let attribute = create_attribute_with_descriptor(metadata, descriptor, value)?;
        self.attributes.push(attribute);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Sequences;
    use crate::model::{AttributeKind, AttributeValue};

    #[test]
    fn test_set_or_create() {
        let gmd = GraphMetadata::new().with_sequences(Sequences::isolated());
        let mut key = gmd.create_composite_key("person");
        key.set_or_create_attribute(&gmd, "ssn", "123-45-6789").unwrap();
        key.set_or_create_attribute(&gmd, "zip", 94301i32).unwrap();
        key.set_or_create_attribute(&gmd, "zip", 94302i32).unwrap();

        assert_eq!(key.attributes().len(), 2);
        assert_eq!(
            key.attribute("zip").unwrap().value(),
            Some(&AttributeValue::Integer(94302))
        );
        assert_eq!(gmd.attribute_descriptor("ssn").unwrap().kind(), AttributeKind::String);
    }

    #[test]
    fn test_rejects_null_and_unnamed() {
        let gmd = GraphMetadata::new().with_sequences(Sequences::isolated());
        let mut key = CompositeKey::new(None);
        assert!(key.set_or_create_attribute(&gmd, "", 1i32).is_err());
        assert!(key.set_or_create_attribute(&gmd, "x", ValueInput::Null).is_err());
        assert!(key.attributes().is_empty());
    }
}
