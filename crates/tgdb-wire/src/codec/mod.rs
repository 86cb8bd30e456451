//! Binary encoding/decoding for the entity wire format.
//!
//! All multi-byte values are big-endian. Entities travel as length-prefixed
//! frames and refer to each other by id; see [`entity`] for the frame
//! layout and reference resolution.

pub mod attribute;
pub mod entity;
pub mod primitives;
pub mod schema;
pub mod stream;
pub mod value;

pub use attribute::{
    decode_attribute, decode_descriptor, encode_attribute, encode_composite_key, encode_descriptor,
};
pub use entity::{
    decode_any_entity, decode_entities, decode_entity, encode_entities, encode_entity, ReferenceMap,
};
pub use primitives::{utf_length, Reader, Writer};
pub use schema::{
    apply_metadata_response, decode_edge_type, decode_metadata_response, decode_node_type,
    encode_edge_type, encode_metadata_response, encode_node_type, MetadataResponse,
};
pub use stream::{decode_result_stream, encode_result_stream, ResultSet};
pub use value::{decode_value, encode_value};
