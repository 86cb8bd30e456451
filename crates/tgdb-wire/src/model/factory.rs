//! Construction of attributes from descriptors.
//!
//! This is the one place that maps every [`AttributeKind`] to its storage.
//! Both matches below are exhaustive without a wildcard, so a new kind does
//! not compile until it is handled here and in [`coerce`](super::value::coerce).

use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::metadata::GraphMetadata;
use crate::model::{Attribute, AttributeDescriptor, AttributeKind, LargeObject, ValueInput};

/// Creates a null attribute of `kind` with an unnamed, unregistered
/// descriptor.
pub fn create_attribute_by_type(
    metadata: &GraphMetadata,
    kind: AttributeKind,
) -> Result<Attribute, SchemaError> {
    let descriptor = Arc::new(AttributeDescriptor::new(
        metadata.next_attribute_id(),
        "",
        kind,
        false,
        false,
        metadata.default_decimal_shape(),
    ));
    instantiate(metadata, descriptor)
}

/// Creates an attribute for `descriptor` and assigns `value` to it.
///
/// The new attribute is marked modified unless `value` coerces to nothing
/// (it is always modified for an explicit null).
pub fn create_attribute_with_descriptor<'a>(
    metadata: &GraphMetadata,
    descriptor: Arc<AttributeDescriptor>,
    value: impl Into<ValueInput<'a>>,
) -> Result<Attribute> {
    let mut attribute = instantiate(metadata, descriptor)?;
    attribute.set_value_with(value, metadata.options())?;
    Ok(attribute)
}

fn instantiate(
    metadata: &GraphMetadata,
    descriptor: Arc<AttributeDescriptor>,
) -> Result<Attribute, SchemaError> {
    let attribute = match descriptor.kind() {
        AttributeKind::Boolean
        | AttributeKind::Byte
        | AttributeKind::Char
        | AttributeKind::Short
        | AttributeKind::Integer
        | AttributeKind::Long
        | AttributeKind::Float
        | AttributeKind::Double
        | AttributeKind::Number
        | AttributeKind::String
        | AttributeKind::Date
        | AttributeKind::Time
        | AttributeKind::TimeStamp => Attribute::new(descriptor),
        AttributeKind::Blob | AttributeKind::Clob => {
            // Local large objects draw their id from the entity sequence.
            let mut attribute = Attribute::new(descriptor);
            attribute.set_large_object(LargeObject {
                remote_id: metadata.next_virtual_id(),
                is_cached: true,
            });
            attribute
        }
        AttributeKind::Invalid => {
            return Err(SchemaError::InvalidAttributeKind {
                value: AttributeKind::Invalid as u8,
            });
        }
    };
    Ok(attribute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ids::Sequences;
    use crate::model::AttributeValue;

    fn metadata() -> GraphMetadata {
        GraphMetadata::new().with_sequences(Sequences::isolated())
    }

    #[test]
    fn test_every_kind_instantiates() {
        let gmd = metadata();
        for kind in AttributeKind::ALL {
            let attr = create_attribute_by_type(&gmd, kind).unwrap();
            assert_eq!(attr.kind(), kind);
            assert!(attr.is_null());
            assert_eq!(attr.large_object().is_some(), kind.is_large_object());
        }
    }

    #[test]
    fn test_invalid_kind() {
        let gmd = metadata();
        assert!(matches!(
            create_attribute_by_type(&gmd, AttributeKind::Invalid),
            Err(SchemaError::InvalidAttributeKind { value: 0 })
        ));
    }

    #[test]
    fn test_with_descriptor_assigns_value() {
        let gmd = metadata();
        let desc = gmd
            .create_attribute_descriptor("count", AttributeKind::Short, false)
            .unwrap();
        let attr = create_attribute_with_descriptor(&gmd, desc, "12").unwrap();
        assert_eq!(attr.value(), Some(&AttributeValue::Short(12)));
        assert!(attr.is_modified());
    }

    #[test]
    fn test_with_descriptor_propagates_coercion_error() {
        let gmd = metadata();
        let desc = gmd
            .create_attribute_descriptor("flag", AttributeKind::Boolean, false)
            .unwrap();
        assert!(matches!(
            create_attribute_with_descriptor(&gmd, desc, 2.5f64),
            Err(Error::Coercion(_))
        ));
    }

    #[test]
    fn test_large_object_gets_local_id() {
        let gmd = metadata();
        let desc = gmd
            .create_attribute_descriptor("photo", AttributeKind::Blob, false)
            .unwrap();
        let attr = create_attribute_with_descriptor(&gmd, desc, vec![1u8]).unwrap();
        assert_eq!(attr.large_object().unwrap().remote_id, -1);
    }
}
