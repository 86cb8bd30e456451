//! Entity frames.
//!
//! Every node, edge and graph is written as one frame:
//!
//! ```text
//! [len:i32][isNew:bool][kind:u8][id:i64][version:i32][typeId:i32]
//! [attrCount:i32][attribute records...][body]
//! ```
//!
//! `len` counts the whole frame including its own four bytes. It is written
//! as zero and patched once the body is complete. Only modified attributes
//! are written. A node or graph body lists the ids of its edges that are
//! still new (`[count:i32][id:i64...]`); an edge body is
//! `[direction:u8][fromId:i64][toId:i64]`.
//!
//! Entities refer to each other only by id. Decoding resolves ids through a
//! [`ReferenceMap`]: the first time an id is seen an uninitialized
//! placeholder is allocated and recorded before anything else is read, so a
//! later reference to the same id (including a cycle back to the entity
//! being decoded) reuses that handle. A frame for an id that already has a
//! placeholder hydrates the placeholder in place.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::codec::attribute::{decode_attribute, encode_attribute};
use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, EncodeError, Result};
use crate::limits::{ENTITY_REFERENCE_BYTES, MIN_ATTRIBUTE_RECORD_BYTES};
use crate::model::{
    Attribute, DirectionType, Entity, EntityArena, EntityBody, EntityHandle, EntityKind,
};

/// Bytes of a frame before the attribute count.
const FRAME_HEADER_BYTES: usize = 4 + 1 + 1 + 8 + 4 + 4;

/// Wire id to arena handle, for the duration of one decode call.
#[derive(Debug, Default)]
pub struct ReferenceMap {
    entries: FxHashMap<i64, EntityHandle>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<EntityHandle> {
        self.entries.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entity recorded for `id`, or allocates and records an
    /// uninitialized placeholder of `kind`.
    ///
    /// Nodes and graphs share one id space, so either may stand in for the
    /// other here; the frame that hydrates the entity decides its body.
    pub fn resolve(
        &mut self,
        arena: &mut EntityArena,
        kind: EntityKind,
        id: i64,
    ) -> Result<EntityHandle> {
        if let Some(handle) = self.get(id) {
            let found = arena.entity(handle)?.kind();
            if !compatible(kind, found) {
                return Err(DecodeError::EntityKindMismatch {
                    id,
                    expected: kind,
                    found,
                }
                .into());
            }
            return Ok(handle);
        }
        let handle = arena.placeholder(kind, id)?;
        self.entries.insert(id, handle);
        Ok(handle)
    }

    /// Forgets every handle at or after `len`.
    fn forget_from(&mut self, len: usize) {
        self.entries.retain(|_, handle| handle.index() < len);
    }
}

fn compatible(a: EntityKind, b: EntityKind) -> bool {
    let node_like = |k| matches!(k, EntityKind::Node | EntityKind::Graph);
    a == b || (node_like(a) && node_like(b))
}

// =============================================================================
// ENCODING
// =============================================================================

/// Appends the frame of the entity at `handle` to `writer`.
pub fn encode_entity(writer: &mut Writer, arena: &EntityArena, handle: EntityHandle) -> Result<()> {
    let entity = arena.entity(handle)?;
    let metadata = arena.metadata();
    let start = writer.len();

    writer.write_i32(0);
    writer.write_bool(entity.is_new());
    writer.write_byte(entity.kind() as u8);
    writer.write_i64(entity.virtual_id());
    writer.write_i32(entity.version());
    writer.write_i32(entity.entity_type().map_or(0, |t| t.id()));

    let modified: Vec<&Attribute> = entity.modified_attributes().collect();
    writer.write_count(modified.len(), "modified attributes")?;
    for attribute in &modified {
        encode_attribute(writer, attribute, metadata)?;
    }

    match entity.body() {
        EntityBody::Node { edges } | EntityBody::Graph { edges } => {
            let new_edges = edges
                .iter()
                .filter_map(|&e| arena.get(e))
                .filter(|e| e.is_new())
                .map(Entity::virtual_id)
                .collect::<Vec<_>>();
            writer.write_count(new_edges.len(), "edges")?;
            for id in new_edges {
                writer.write_i64(id);
            }
        }
        EntityBody::Edge { from, to, .. } => {
            let direction = entity.direction().unwrap_or_default();
            let from = endpoint_id(arena, entity, *from, "from")?;
            let to = endpoint_id(arena, entity, *to, "to")?;
            writer.write_byte(direction as u8);
            writer.write_i64(from);
            writer.write_i64(to);
        }
    }

    let len = writer.len() - start;
    let frame_len = i32::try_from(len).map_err(|_| EncodeError::LengthExceedsLimit {
        field: "entity frame",
        len,
        max: i32::MAX as usize,
    })?;
    writer.write_i32_at(start, frame_len)?;

    debug!(
        kind = ?entity.kind(),
        id = entity.virtual_id(),
        len,
        attributes = modified.len(),
        "wrote entity frame"
    );
    Ok(())
}

fn endpoint_id(
    arena: &EntityArena,
    edge: &Entity,
    endpoint: Option<EntityHandle>,
    end: &'static str,
) -> Result<i64> {
    let missing = || EncodeError::MissingEndpoint {
        edge: edge.virtual_id(),
        end,
    };
    let handle = endpoint.ok_or_else(missing)?;
    Ok(arena.get(handle).ok_or_else(missing)?.virtual_id())
}

/// Encodes the frames of `handles`, back to back.
pub fn encode_entities(arena: &EntityArena, handles: &[EntityHandle]) -> Result<Vec<u8>> {
    let mut writer = Writer::with_capacity(64 * handles.len());
    for &handle in handles {
        encode_entity(&mut writer, arena, handle)?;
    }
    Ok(writer.into_bytes())
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes one frame that must hold an entity of `expected` kind.
///
/// On error the entities this call allocated are removed from `arena` and
/// `refs`.
pub fn decode_entity(
    reader: &mut Reader<'_>,
    arena: &mut EntityArena,
    refs: &mut ReferenceMap,
    expected: EntityKind,
) -> Result<EntityHandle> {
    let mark = arena.len();
    let result = decode_frame(reader, arena, refs, Some(expected));
    if result.is_err() {
        discard_from(arena, refs, mark);
    }
    result
}

/// Decodes one frame of whatever kind it declares.
pub fn decode_any_entity(
    reader: &mut Reader<'_>,
    arena: &mut EntityArena,
    refs: &mut ReferenceMap,
) -> Result<EntityHandle> {
    let mark = arena.len();
    let result = decode_frame(reader, arena, refs, None);
    if result.is_err() {
        discard_from(arena, refs, mark);
    }
    result
}

/// Decodes back-to-back frames until `bytes` is exhausted. One reference
/// map spans all of them.
///
/// On error the arena is left as it was before the call.
pub fn decode_entities(bytes: &[u8], arena: &mut EntityArena) -> Result<Vec<EntityHandle>> {
    let mark = arena.len();
    let mut reader = Reader::new(bytes);
    let mut refs = ReferenceMap::new();
    let mut handles = Vec::new();
    while !reader.is_empty() {
        match decode_frame(&mut reader, arena, &mut refs, None) {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                arena.truncate(mark);
                return Err(err);
            }
        }
    }
    Ok(handles)
}

/// Removes the entities a failed decode allocated.
///
/// A frame only writes into an entity once it has been read in full, so
/// entities older than `mark` are untouched by the failed frame.
pub(crate) fn discard_from(arena: &mut EntityArena, refs: &mut ReferenceMap, mark: usize) {
    arena.truncate(mark);
    refs.forget_from(mark);
}

fn decode_frame(
    reader: &mut Reader<'_>,
    arena: &mut EntityArena,
    refs: &mut ReferenceMap,
    expected: Option<EntityKind>,
) -> Result<EntityHandle> {
    let start = reader.position();
    let declared = read_frame_len(reader)?;

    let is_new = reader.read_bool("entity is_new")?;
    let kind_byte = reader.read_byte("entity kind")?;
    let kind = EntityKind::from_u8(kind_byte)
        .filter(|k| k.is_supported())
        .ok_or(DecodeError::InvalidEntityKind { value: kind_byte })?;
    let id = reader.read_i64("entity id")?;
    if let Some(expected) = expected.filter(|e| *e != kind) {
        return Err(DecodeError::EntityKindMismatch {
            id,
            expected,
            found: kind,
        }
        .into());
    }

    // Record the entity before reading anything that can refer back to it.
    let handle = refs.resolve(arena, kind, id)?;

    let version = reader.read_i32("entity version")?;
    let type_id = reader.read_i32("entity type id")?;
    let metadata = arena.metadata().clone();
    let entity_type = match type_id {
        0 => None,
        id => metadata.entity_type_by_id(id),
    };

    let count = reader.read_count(MIN_ATTRIBUTE_RECORD_BYTES, "attribute count")?;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        attributes.push(decode_attribute(reader, &metadata)?);
    }

    let body = match kind {
        EntityKind::Edge => {
            let direction = DirectionType::from_u8(reader.read_byte("edge direction")?);
            let from_id = reader.read_i64("edge from id")?;
            let to_id = reader.read_i64("edge to id")?;
            EntityBody::Edge {
                direction,
                from: Some(refs.resolve(arena, EntityKind::Node, from_id)?),
                to: Some(refs.resolve(arena, EntityKind::Node, to_id)?),
            }
        }
        _ => {
            let edge_count = reader.read_count(ENTITY_REFERENCE_BYTES, "edge count")?;
            let mut edges = Vec::with_capacity(edge_count);
            for _ in 0..edge_count {
                let edge_id = reader.read_i64("edge id")?;
                edges.push(refs.resolve(arena, EntityKind::Edge, edge_id)?);
            }
            if kind == EntityKind::Graph {
                EntityBody::Graph { edges }
            } else {
                EntityBody::Node { edges }
            }
        }
    };

    let consumed = reader.position() - start;
    if consumed != declared {
        return Err(DecodeError::FrameLengthMismatch { declared, consumed }.into());
    }

    let entity = arena.entity_mut(handle)?;
    if is_new {
        entity.is_new = true;
        entity.virtual_id = id;
        entity.entity_id = -1;
    } else {
        entity.set_entity_id(id);
    }
    entity.version = version;
    entity.entity_type = entity_type;
    entity.is_initialized = true;
    let attribute_count = attributes.len();
    for attribute in attributes {
        entity.insert_decoded_attribute(attribute);
    }
    entity.body = body;

    debug!(kind = ?kind, id, len = declared, attributes = attribute_count, "read entity frame");
    Ok(handle)
}

fn read_frame_len(reader: &mut Reader<'_>) -> Result<usize, DecodeError> {
    let raw = reader.read_i32("entity frame length")?;
    let len = usize::try_from(raw).map_err(|_| DecodeError::NegativeLength {
        field: "entity frame",
        len: i64::from(raw),
    })?;
    let max = reader.remaining_len() + 4;
    if len > max {
        return Err(DecodeError::LengthExceedsLimit {
            field: "entity frame",
            len,
            max,
        });
    }
    if len < FRAME_HEADER_BYTES {
        return Err(DecodeError::FrameLengthMismatch {
            declared: len,
            consumed: FRAME_HEADER_BYTES,
        });
    }
    Ok(len)
}
