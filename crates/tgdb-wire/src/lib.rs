//! Client-side object model and binary wire codec for a graph database.
//!
//! This crate models the nodes, edges and graphs a client builds and
//! receives, the typed attributes they carry, and the schema registry
//! those attributes are described by. It encodes entities into the
//! server's length-prefixed frame format and decodes them back, rebuilding
//! cyclic node/edge references along the way.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tgdb_wire::{AttributeValue, DirectionType, EntityArena, GraphMetadata};
//! use tgdb_wire::codec::{decode_entities, encode_entities};
//!
//! let metadata = Arc::new(GraphMetadata::new());
//! let mut arena = EntityArena::new(metadata.clone());
//!
//! let alice = arena.new_node();
//! let bob = arena.new_node();
//! arena.set_or_create_attribute(alice, "name", "Alice").unwrap();
//! arena.set_or_create_attribute(bob, "age", 42).unwrap();
//! let knows = arena.new_edge(alice, bob, DirectionType::Directed).unwrap();
//!
//! // Encode to frames
//! let bytes = encode_entities(&arena, &[alice, bob, knows]).unwrap();
//!
//! // Decode into a fresh arena sharing the same registry
//! let mut decoded = EntityArena::new(metadata);
//! let handles = decode_entities(&bytes, &mut decoded).unwrap();
//! let name = decoded.get(handles[0]).unwrap().attribute("name").unwrap();
//! assert_eq!(name.value(), Some(&AttributeValue::String("Alice".to_string())));
//! assert_eq!(decoded.get(handles[2]).unwrap().from_node(), Some(handles[0]));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Values, descriptors, attributes, schema types and entities
//! - [`metadata`]: The schema registry shared by an arena's entities
//! - [`codec`]: Binary encoding/decoding of values, entities and schema
//! - [`connection`]: Hooks for encryption and large object fetches
//! - [`config`]: Coercion and descriptor defaults
//! - [`ids`]: Virtual id sequences
//! - [`error`]: Error types
//! - [`limits`]: Wire limits and decode bounds
//!
//! # Wire Format
//!
//! All integers are big-endian. Strings are length-prefixed modified UTF-8.
//! Each entity travels as a frame whose leading `i32` holds the frame's
//! total length, including the prefix itself. Entities reference one
//! another by id; a reference to an id not yet seen in the current decode
//! produces an uninitialized placeholder that a later frame fills in.
//!
//! # Security
//!
//! The decoder treats its input as untrusted: frame lengths and counts are
//! checked against the remaining input before anything is allocated, and
//! every frame must consume exactly the bytes it declares.

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod ids;
pub mod limits;
pub mod metadata;
pub mod model;
pub mod util;

// Re-export commonly used types at crate root
pub use codec::{decode_entities, decode_result_stream, encode_entities, ResultSet};
pub use config::ModelOptions;
pub use connection::{Connection, EntityCrypto, LargeObjectSource};
pub use error::{
    CoercionError, ConnectionError, DecodeError, EncodeError, Error, ErrorKind, Result,
    SchemaError,
};
pub use ids::{AtomicSequence, IdGenerator, Sequences};
pub use metadata::GraphMetadata;
pub use model::{
    Attribute, AttributeDescriptor, AttributeKind, AttributeValue, CompositeKey, Decimal,
    DecimalShape, DirectionType, EdgeDirection, EdgeType, Entity, EntityArena, EntityBody,
    EntityHandle, EntityKind, EntityType, EntityTypeRef, NodeType, SystemType, Timestamp,
    ValueInput,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
