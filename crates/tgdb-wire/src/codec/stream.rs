//! Query result streams.
//!
//! A result stream is a sequence of entries, each `[kind:u8]` followed, for
//! a node, edge or graph, by `[id:i64][entity frame]`. Any other kind byte
//! stands alone and is skipped. One [`ReferenceMap`] spans the whole
//! stream, so entities referenced by one entry and sent in full by a later
//! one end up as the same arena entity.

use tracing::{debug, warn};

use crate::codec::entity::{decode_entity, discard_from, encode_entity, ReferenceMap};
use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, Result};
use crate::model::{EntityArena, EntityHandle, EntityKind};

/// Entities decoded from one result stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// The query results: the first `result_count` decoded entries.
    pub results: Vec<EntityHandle>,
    /// Every decoded entry in stream order, results included.
    pub entities: Vec<EntityHandle>,
}

/// Decodes `total_count` entries from `bytes` into `arena`.
///
/// On error the arena is left as it was before the call.
pub fn decode_result_stream(
    bytes: &[u8],
    arena: &mut EntityArena,
    result_count: usize,
    total_count: usize,
) -> Result<ResultSet> {
    let mark = arena.len();
    let mut refs = ReferenceMap::new();
    let result = read_entries(bytes, arena, &mut refs, result_count, total_count);
    if result.is_err() {
        discard_from(arena, &mut refs, mark);
    }
    result
}

fn read_entries(
    bytes: &[u8],
    arena: &mut EntityArena,
    refs: &mut ReferenceMap,
    result_count: usize,
    total_count: usize,
) -> Result<ResultSet> {
    let mut reader = Reader::new(bytes);
    let mut set = ResultSet::default();

    for _ in 0..total_count {
        let kind_byte = reader.read_byte("result entry kind")?;
        let Some(kind) = EntityKind::from_u8(kind_byte).filter(|k| k.is_supported()) else {
            warn!(kind = kind_byte, "skipping result entry with invalid entity kind");
            continue;
        };
        let id = reader.read_i64("result entry id")?;
        let handle = decode_entity(&mut reader, arena, refs, kind)?;
        let found = arena.entity(handle)?.virtual_id();
        if found != id {
            return Err(DecodeError::EntityIdMismatch { expected: id, found }.into());
        }
        if set.results.len() < result_count {
            set.results.push(handle);
        }
        set.entities.push(handle);
    }

    debug!(
        results = set.results.len(),
        entities = set.entities.len(),
        referenced = refs.len(),
        "decoded result stream"
    );
    Ok(set)
}

/// Writes one entry per handle, in order.
pub fn encode_result_stream(arena: &EntityArena, handles: &[EntityHandle]) -> Result<Vec<u8>> {
    let mut writer = Writer::new();
    for &handle in handles {
        let entity = arena.entity(handle)?;
        writer.write_byte(entity.kind() as u8);
        writer.write_i64(entity.virtual_id());
        encode_entity(&mut writer, arena, handle)?;
    }
    Ok(writer.into_bytes())
}
