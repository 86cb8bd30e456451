//! In-memory object model.
//!
//! This module contains the types the codec reads and writes:
//! - Kinds (attribute, entity, direction and system type codes)
//! - Values (decimals, timestamps and the closed attribute value union)
//! - Descriptors and attributes (schema facts and dirty-tracked values)
//! - Entity types (node and edge schema)
//! - Entities (nodes, edges and graphs in an arena)

pub mod attribute;
pub mod decimal;
pub mod descriptor;
pub mod entity;
pub mod factory;
pub mod key;
pub mod kind;
pub mod temporal;
pub mod types;
pub mod value;

pub use attribute::{Attribute, LargeObject};
pub use decimal::{Decimal, ParseDecimalError};
pub use descriptor::{apply_decimal_shape, AttributeDescriptor, DecimalShape};
pub use entity::{EdgeDirection, Entity, EntityArena, EntityBody, EntityHandle};
pub use factory::{create_attribute_by_type, create_attribute_with_descriptor};
pub use key::CompositeKey;
pub use kind::{AttributeKind, DirectionType, EntityKind, SystemType};
pub use temporal::Timestamp;
pub use types::{EdgeType, EntityType, EntityTypeRef, NodeType};
pub use value::{coerce, AttributeValue, ValueInput};
