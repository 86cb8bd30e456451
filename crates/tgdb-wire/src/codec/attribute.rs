//! Descriptor and attribute records.
//!
//! An attribute record is `[attrId:i32][isNull:bool][payload]`. The payload
//! is the plain value layout from [`codec::value`](super::value) except in
//! two cases:
//!
//! - Blob and Clob write `[remoteId:i64][hasValue:bool]` and then, when
//!   bytes are held locally, an `i32`-prefixed byte array. Blob bytes are
//!   encrypted when the descriptor says so. Clob ignores the flag.
//! - Any other encrypted attribute writes its plain payload through the
//!   connection's cipher as one `i32`-prefixed byte array.

use tracing::trace;

use crate::codec::primitives::{Reader, Writer};
use crate::codec::value::{decode_value, encode_value};
use crate::connection::Connection;
use crate::error::{DecodeError, EncodeError, Result, SchemaError};
use crate::metadata::GraphMetadata;
use crate::model::{
    Attribute, AttributeDescriptor, AttributeKind, AttributeValue, CompositeKey, DecimalShape,
    LargeObject, SystemType,
};

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// Writes `[sysType][attrId:i32][name][kind][isArray][isEncrypted]`, plus
/// `[precision:i16][scale:i16]` for Number descriptors.
pub fn encode_descriptor(
    writer: &mut Writer,
    descriptor: &AttributeDescriptor,
) -> Result<(), EncodeError> {
    writer.write_byte(SystemType::AttributeDescriptor.to_u8());
    writer.write_i32(wire_attribute_id(descriptor)?);
    writer.write_utf(descriptor.name(), "attribute name")?;
    writer.write_byte(descriptor.kind() as u8);
    writer.write_bool(descriptor.is_array());
    writer.write_bool(descriptor.is_encrypted());
    if descriptor.kind() == AttributeKind::Number {
        writer.write_i16(descriptor.precision());
        writer.write_i16(descriptor.scale());
    }
    Ok(())
}

/// Reads a descriptor record.
pub fn decode_descriptor(reader: &mut Reader<'_>) -> Result<AttributeDescriptor, DecodeError> {
    let sys_type = reader.read_byte("descriptor system type")?;
    if SystemType::from_u8(sys_type) != Some(SystemType::AttributeDescriptor) {
        return Err(DecodeError::InvalidSystemType {
            value: sys_type,
            context: "attribute descriptor",
        });
    }
    let id = reader.read_i32("attribute id")?;
    let name = reader.read_utf("attribute name")?;
    let kind_byte = reader.read_byte("attribute kind")?;
    let kind = AttributeKind::from_u8(kind_byte)
        .filter(|k| *k != AttributeKind::Invalid)
        .ok_or(DecodeError::InvalidAttributeKind { value: kind_byte })?;
    let is_array = reader.read_bool("attribute is_array")?;
    let is_encrypted = reader.read_bool("attribute is_encrypted")?;
    let shape = if kind == AttributeKind::Number {
        DecimalShape {
            precision: reader.read_i16("attribute precision")?,
            scale: reader.read_i16("attribute scale")?,
        }
    } else {
        DecimalShape::default()
    };
    Ok(AttributeDescriptor::new(
        i64::from(id),
        name,
        kind,
        is_array,
        is_encrypted,
        shape,
    ))
}

fn wire_attribute_id(descriptor: &AttributeDescriptor) -> Result<i32, EncodeError> {
    i32::try_from(descriptor.id()).map_err(|_| EncodeError::IdOutOfRange {
        field: "attribute id",
        id: descriptor.id(),
    })
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

/// Writes one attribute record.
pub fn encode_attribute(
    writer: &mut Writer,
    attribute: &Attribute,
    metadata: &GraphMetadata,
) -> Result<()> {
    let descriptor = attribute.descriptor();
    writer.write_i32(wire_attribute_id(descriptor)?);

    if let Some(lob) = attribute.large_object() {
        // An uncached placeholder is not null: its bytes live on the server.
        let is_null = attribute.is_null() && lob.is_cached;
        writer.write_bool(is_null);
        if !is_null {
            encode_large_object(writer, attribute, lob, metadata)?;
        }
    } else {
        match attribute.value() {
            None => writer.write_bool(true),
            Some(value) => {
                writer.write_bool(false);
                if descriptor.is_encrypted() {
                    let crypto = metadata.require_connection("attribute encryption")?;
                    encode_encrypted(writer, value, descriptor.decimal_shape(), crypto.as_ref())?;
                } else {
                    encode_value(writer, value, descriptor.decimal_shape())?;
                }
            }
        }
    }
    trace!(
        attr_id = descriptor.id(),
        name = descriptor.name(),
        null = attribute.is_null(),
        "wrote attribute"
    );
    Ok(())
}

fn encode_large_object(
    writer: &mut Writer,
    attribute: &Attribute,
    lob: LargeObject,
    metadata: &GraphMetadata,
) -> Result<()> {
    writer.write_i64(lob.remote_id);
    let Some(bytes) = attribute.value().and_then(AttributeValue::as_bytes) else {
        writer.write_bool(false);
        return Ok(());
    };
    writer.write_bool(true);
    if encrypts_bytes(attribute.descriptor()) {
        let crypto = metadata.require_connection("blob encryption")?;
        let encrypted = crypto.encrypt_entity(bytes)?;
        writer.write_bytes_prefixed(&encrypted, "encrypted blob")?;
    } else {
        writer.write_bytes_prefixed(bytes, "large object bytes")?;
    }
    Ok(())
}

fn encode_encrypted(
    writer: &mut Writer,
    value: &AttributeValue,
    shape: DecimalShape,
    crypto: &dyn Connection,
) -> Result<()> {
    let mut plain = Writer::new();
    encode_value(&mut plain, value, shape)?;
    let encrypted = crypto.encrypt_entity(plain.as_bytes())?;
    writer.write_bytes_prefixed(&encrypted, "encrypted value")?;
    Ok(())
}

fn encrypts_bytes(descriptor: &AttributeDescriptor) -> bool {
    descriptor.kind() == AttributeKind::Blob && descriptor.is_encrypted()
}

/// Reads one attribute record, resolving its id against `metadata`.
///
/// The returned attribute is clean. An id the registry does not know is a
/// schema error: the stream is corrupt or the registry is stale.
pub fn decode_attribute(reader: &mut Reader<'_>, metadata: &GraphMetadata) -> Result<Attribute> {
    let id = i64::from(reader.read_i32("attribute id")?);
    let descriptor = metadata
        .attribute_descriptor_by_id(id)
        .ok_or(SchemaError::UnknownAttributeId { id })?;
    let mut attribute = Attribute::new(descriptor);
    let is_null = reader.read_bool("attribute is_null")?;

    if is_null {
        attribute.set_decoded(None);
    } else if attribute.kind().is_large_object() {
        decode_large_object(reader, &mut attribute, metadata)?;
    } else if attribute.descriptor().is_encrypted() {
        let encrypted = reader.read_bytes_prefixed("encrypted value")?;
        let crypto = metadata.require_connection("attribute decryption")?;
        let plain = crypto.decrypt_buffer(&encrypted)?;
        let value = decode_value(&mut Reader::new(&plain), attribute.kind())?;
        attribute.set_decoded(Some(value));
    } else {
        let value = decode_value(reader, attribute.kind())?;
        attribute.set_decoded(Some(value));
    }

    trace!(attr_id = id, name = attribute.name(), null = is_null, "read attribute");
    Ok(attribute)
}

fn decode_large_object(
    reader: &mut Reader<'_>,
    attribute: &mut Attribute,
    metadata: &GraphMetadata,
) -> Result<()> {
    let remote_id = reader.read_i64("large object id")?;
    let has_value = reader.read_bool("large object has_value")?;
    attribute.set_large_object(LargeObject {
        remote_id,
        is_cached: has_value,
    });
    if !has_value {
        return Ok(());
    }

    let mut bytes = reader.read_bytes_prefixed("large object bytes")?;
    if encrypts_bytes(attribute.descriptor()) {
        let crypto = metadata.require_connection("blob decryption")?;
        bytes = crypto.decrypt_buffer(&bytes)?;
    }
    let value = match attribute.kind() {
        AttributeKind::Clob => AttributeValue::Clob(bytes),
        _ => AttributeValue::Blob(bytes),
    };
    attribute.set_decoded(Some(value));
    Ok(())
}

// =============================================================================
// COMPOSITE KEYS
// =============================================================================

/// Writes `[hasName:bool]([name])[count:i16][attribute records]`. Key
/// values are never null.
pub fn encode_composite_key(
    writer: &mut Writer,
    key: &CompositeKey,
    metadata: &GraphMetadata,
) -> Result<()> {
    match key.type_name().filter(|n| !n.is_empty()) {
        Some(name) => {
            writer.write_bool(true);
            writer.write_utf(name, "composite key type name")?;
        }
        None => writer.write_bool(false),
    }
    let count = key.attributes().len();
    let count = i16::try_from(count).map_err(|_| EncodeError::LengthExceedsLimit {
        field: "composite key attributes",
        len: count,
        max: i16::MAX as usize,
    })?;
    writer.write_i16(count);
    for attribute in key.attributes() {
        encode_attribute(writer, attribute, metadata)?;
    }
    Ok(())
}
