//! Schema records: entity types and the metadata response.
//!
//! Types name their attributes rather than carrying descriptor ids. Names
//! are resolved against the registry while decoding; a name the registry
//! does not know yet gets a String placeholder descriptor with id 0, which
//! [`GraphMetadata::update_metadata`] swaps for the real descriptor when
//! the response also carries it.

use std::sync::Arc;

use tracing::debug;

use crate::codec::attribute::{decode_descriptor, encode_descriptor};
use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, EncodeError, Result};
use crate::metadata::GraphMetadata;
use crate::model::{
    AttributeDescriptor, AttributeKind, DecimalShape, DirectionType, EdgeType, EntityType,
    NodeType, SystemType,
};

/// Smallest descriptor record: empty name, not a Number.
const MIN_DESCRIPTOR_BYTES: usize = 1 + 4 + 2 + 1 + 1 + 1;
/// Smallest node type record: empty name and lists.
const MIN_NODE_TYPE_BYTES: usize = 1 + 4 + 2 + 4 + 2 + 2 + 2 + 8;
/// Smallest edge type record: empty name and attribute list.
const MIN_EDGE_TYPE_BYTES: usize = 1 + 4 + 2 + 4 + 2 + 4 + 4 + 1 + 8;

/// Schema sent by the server in one metadata response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataResponse {
    pub descriptors: Vec<AttributeDescriptor>,
    pub node_types: Vec<NodeType>,
    pub edge_types: Vec<EdgeType>,
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

fn encode_type_base(writer: &mut Writer, base: &EntityType) -> Result<(), EncodeError> {
    writer.write_byte(base.system_type().to_u8());
    writer.write_i32(base.id());
    writer.write_utf(base.name(), "type name")?;
    writer.write_i32(base.page_size());
    let names: Vec<&str> = base.attribute_descriptors().iter().map(|d| d.name()).collect();
    write_names(writer, &names, "type attributes")
}

fn decode_type_base(
    reader: &mut Reader<'_>,
    expected: SystemType,
    metadata: &GraphMetadata,
) -> Result<EntityType, DecodeError> {
    let sys_type = reader.read_byte("type system type")?;
    if SystemType::from_u8(sys_type) != Some(expected) {
        return Err(DecodeError::InvalidSystemType {
            value: sys_type,
            context: "entity type",
        });
    }
    let id = reader.read_i32("type id")?;
    let name = reader.read_utf("type name")?;
    let page_size = reader.read_i32("type page size")?;

    let mut base = EntityType::new(id, name, expected).with_page_size(page_size);
    for attr_name in read_names(reader, "type attributes")? {
        base.add_attribute_descriptor(resolve_name(metadata, attr_name));
    }
    Ok(base)
}

fn resolve_name(metadata: &GraphMetadata, name: String) -> Arc<AttributeDescriptor> {
    metadata.attribute_descriptor(&name).unwrap_or_else(|| {
        Arc::new(AttributeDescriptor::new(
            0,
            name,
            AttributeKind::String,
            false,
            false,
            DecimalShape::default(),
        ))
    })
}

fn write_names(writer: &mut Writer, names: &[&str], field: &'static str) -> Result<(), EncodeError> {
    writer.write_i16(short_count(names.len(), field)?);
    for name in names {
        writer.write_utf(name, field)?;
    }
    Ok(())
}

fn read_names(reader: &mut Reader<'_>, field: &'static str) -> Result<Vec<String>, DecodeError> {
    let count = read_short_count(reader, 2, field)?;
    (0..count).map(|_| reader.read_utf(field)).collect()
}

fn short_count(len: usize, field: &'static str) -> Result<i16, EncodeError> {
    i16::try_from(len).map_err(|_| EncodeError::LengthExceedsLimit {
        field,
        len,
        max: i16::MAX as usize,
    })
}

fn read_short_count(
    reader: &mut Reader<'_>,
    min_item_bytes: usize,
    field: &'static str,
) -> Result<usize, DecodeError> {
    let raw = reader.read_i16(field)?;
    let count = usize::try_from(raw).map_err(|_| DecodeError::NegativeLength {
        field,
        len: i64::from(raw),
    })?;
    let max = reader.remaining_len() / min_item_bytes;
    if count > max {
        return Err(DecodeError::LengthExceedsLimit {
            field,
            len: count,
            max,
        });
    }
    Ok(count)
}

/// Writes a node type record.
pub fn encode_node_type(writer: &mut Writer, node_type: &NodeType) -> Result<(), EncodeError> {
    encode_type_base(writer, node_type.base())?;
    let keys: Vec<&str> = node_type.primary_keys().iter().map(|d| d.name()).collect();
    write_names(writer, &keys, "primary keys")?;
    writer.write_i16(short_count(node_type.index_ids().len(), "index ids")?);
    for id in node_type.index_ids() {
        writer.write_i32(*id);
    }
    writer.write_i64(node_type.num_entries());
    Ok(())
}

/// Reads a node type record, resolving attribute and key names against
/// `metadata`.
pub fn decode_node_type(
    reader: &mut Reader<'_>,
    metadata: &GraphMetadata,
) -> Result<NodeType, DecodeError> {
    let base = decode_type_base(reader, SystemType::Node, metadata)?;
    let keys = read_names(reader, "primary keys")?
        .into_iter()
        .map(|name| resolve_name(metadata, name))
        .collect();
    let index_count = read_short_count(reader, 4, "index ids")?;
    let index_ids = (0..index_count)
        .map(|_| reader.read_i32("index id"))
        .collect::<Result<Vec<_>, _>>()?;
    let num_entries = reader.read_i64("node type entries")?;
    Ok(NodeType::from_base(base)
        .with_primary_keys(keys)
        .with_index_ids(index_ids)
        .with_num_entries(num_entries))
}

/// Writes an edge type record.
pub fn encode_edge_type(writer: &mut Writer, edge_type: &EdgeType) -> Result<(), EncodeError> {
    encode_type_base(writer, edge_type.base())?;
    writer.write_i32(edge_type.from_type_id());
    writer.write_i32(edge_type.to_type_id());
    writer.write_byte(edge_type.direction() as u8);
    writer.write_i64(edge_type.num_entries());
    Ok(())
}

/// Reads an edge type record.
pub fn decode_edge_type(
    reader: &mut Reader<'_>,
    metadata: &GraphMetadata,
) -> Result<EdgeType, DecodeError> {
    let base = decode_type_base(reader, SystemType::Edge, metadata)?;
    let from_type_id = reader.read_i32("edge from type")?;
    let to_type_id = reader.read_i32("edge to type")?;
    let direction = DirectionType::from_u8(reader.read_byte("edge type direction")?);
    let num_entries = reader.read_i64("edge type entries")?;
    Ok(EdgeType::from_base(base, direction)
        .with_endpoint_types(from_type_id, to_type_id)
        .with_num_entries(num_entries))
}

// =============================================================================
// METADATA RESPONSE
// =============================================================================

/// Writes `[descCount:i32][desc...][nodeTypeCount:i32][...][edgeTypeCount:i32][...]`.
pub fn encode_metadata_response(
    writer: &mut Writer,
    response: &MetadataResponse,
) -> Result<(), EncodeError> {
    writer.write_count(response.descriptors.len(), "descriptors")?;
    for descriptor in &response.descriptors {
        encode_descriptor(writer, descriptor)?;
    }
    writer.write_count(response.node_types.len(), "node types")?;
    for node_type in &response.node_types {
        encode_node_type(writer, node_type)?;
    }
    writer.write_count(response.edge_types.len(), "edge types")?;
    for edge_type in &response.edge_types {
        encode_edge_type(writer, edge_type)?;
    }
    Ok(())
}

/// Reads a metadata response without applying it.
///
/// Type attribute names are resolved against descriptors already in
/// `metadata`; names only this response defines are resolved when the
/// response is applied.
pub fn decode_metadata_response(
    reader: &mut Reader<'_>,
    metadata: &GraphMetadata,
) -> Result<MetadataResponse, DecodeError> {
    let count = reader.read_count(MIN_DESCRIPTOR_BYTES, "descriptors")?;
    let descriptors = (0..count)
        .map(|_| decode_descriptor(reader))
        .collect::<Result<Vec<_>, _>>()?;

    let count = reader.read_count(MIN_NODE_TYPE_BYTES, "node types")?;
    let node_types = (0..count)
        .map(|_| decode_node_type(reader, metadata))
        .collect::<Result<Vec<_>, _>>()?;

    let count = reader.read_count(MIN_EDGE_TYPE_BYTES, "edge types")?;
    let edge_types = (0..count)
        .map(|_| decode_edge_type(reader, metadata))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MetadataResponse {
        descriptors,
        node_types,
        edge_types,
    })
}

/// Decodes a metadata response from `bytes` and registers it with
/// `metadata`.
pub fn apply_metadata_response(bytes: &[u8], metadata: &GraphMetadata) -> Result<()> {
    let mut reader = Reader::new(bytes);
    let response = decode_metadata_response(&mut reader, metadata)?;
    debug!(
        descriptors = response.descriptors.len(),
        node_types = response.node_types.len(),
        edge_types = response.edge_types.len(),
        "applying metadata response"
    );
    metadata.update_metadata(response.descriptors, response.node_types, response.edge_types);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Sequences;

    fn descriptor(id: i64, name: &str, kind: AttributeKind) -> AttributeDescriptor {
        AttributeDescriptor::new(id, name, kind, false, false, DecimalShape::default())
    }

    fn response() -> MetadataResponse {
        let mut person = NodeType::new(10, "person")
            .with_primary_keys(vec![Arc::new(descriptor(0, "name", AttributeKind::String))])
            .with_index_ids(vec![3, 4])
            .with_num_entries(1200);
        person
            .base_mut()
            .add_attribute_descriptor(Arc::new(descriptor(0, "name", AttributeKind::String)));
        person
            .base_mut()
            .add_attribute_descriptor(Arc::new(descriptor(0, "age", AttributeKind::String)));

        let mut knows = EdgeType::new(20, "knows", DirectionType::Undirected)
            .with_endpoint_types(10, 10)
            .with_num_entries(5);
        knows
            .base_mut()
            .add_attribute_descriptor(Arc::new(descriptor(0, "since", AttributeKind::String)));

        MetadataResponse {
            descriptors: vec![
                descriptor(1, "name", AttributeKind::String),
                descriptor(2, "age", AttributeKind::Integer),
                descriptor(3, "since", AttributeKind::Date),
            ],
            node_types: vec![person],
            edge_types: vec![knows],
        }
    }

    #[test]
    fn test_apply_resolves_attribute_names() {
        let mut writer = Writer::new();
        encode_metadata_response(&mut writer, &response()).unwrap();

        let gmd = GraphMetadata::new().with_sequences(Sequences::isolated());
        assert!(!gmd.is_initialized());
        apply_metadata_response(writer.as_bytes(), &gmd).unwrap();
        assert!(gmd.is_initialized());

        let person = gmd.node_type_by_id(10).unwrap();
        assert_eq!(person.name(), "person");
        assert_eq!(person.index_ids(), &[3, 4]);
        assert_eq!(person.num_entries(), 1200);
        assert_eq!(person.primary_keys()[0].id(), 1);
        let age = person.base().attribute_descriptor("age").unwrap();
        assert_eq!((age.id(), age.kind()), (2, AttributeKind::Integer));

        let knows = gmd.edge_type("knows").unwrap();
        assert_eq!(knows.direction(), DirectionType::Undirected);
        assert_eq!((knows.from_type_id(), knows.to_type_id()), (10, 10));
        assert_eq!(
            knows.base().attribute_descriptor("since").unwrap().kind(),
            AttributeKind::Date
        );
        assert_eq!(gmd.attribute_descriptor_by_id(3).unwrap().name(), "since");
    }

    #[test]
    fn test_decode_uses_known_descriptors() {
        let gmd = GraphMetadata::new().with_sequences(Sequences::isolated());
        gmd.update_metadata(vec![descriptor(2, "age", AttributeKind::Integer)], Vec::new(), Vec::new());

        let mut writer = Writer::new();
        encode_node_type(&mut writer, &response().node_types[0]).unwrap();
        let decoded = decode_node_type(&mut Reader::new(writer.as_bytes()), &gmd).unwrap();
        assert_eq!(decoded.base().attribute_descriptor("age").unwrap().id(), 2);
        // Not registered yet: placeholder.
        let name = decoded.base().attribute_descriptor("name").unwrap();
        assert_eq!((name.id(), name.kind()), (0, AttributeKind::String));
    }

    #[test]
    fn test_edge_type_layout() {
        let edge = EdgeType::new(7, "e", DirectionType::Directed).with_endpoint_types(1, 2);
        let mut writer = Writer::new();
        encode_edge_type(&mut writer, &edge).unwrap();
        assert_eq!(
            writer.as_bytes(),
            &[
                2, 0, 0, 0, 7, 0, 1, b'e', 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 2, 1, 0, 0, 0,
                0, 0, 0, 0, 0
            ]
        );
    }

    #[test]
    fn test_wrong_system_type() {
        let edge = EdgeType::new(7, "e", DirectionType::Directed);
        let mut writer = Writer::new();
        encode_edge_type(&mut writer, &edge).unwrap();
        let gmd = GraphMetadata::new();
        assert!(matches!(
            decode_node_type(&mut Reader::new(writer.as_bytes()), &gmd),
            Err(DecodeError::InvalidSystemType { value: 2, .. })
        ));
    }

    #[test]
    fn test_truncated_and_oversized_counts() {
        let gmd = GraphMetadata::new();
        let bytes = [0u8, 0, 0, 50, 0, 0];
        assert!(matches!(
            decode_metadata_response(&mut Reader::new(&bytes), &gmd),
            Err(DecodeError::LengthExceedsLimit { field: "descriptors", .. })
        ));

        let mut writer = Writer::new();
        encode_metadata_response(&mut writer, &response()).unwrap();
        let bytes = writer.into_bytes();
        assert!(matches!(
            decode_metadata_response(&mut Reader::new(&bytes[..bytes.len() - 1]), &gmd),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}
