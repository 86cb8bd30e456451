//! Nodes, edges and graphs.
//!
//! Entities live in an [`EntityArena`] and refer to each other through
//! [`EntityHandle`]s. An edge stores handles to its endpoints and each node
//! stores handles to its edges, so node/edge cycles need no shared
//! ownership.
//!
//! Identity follows two states. A new entity carries a negative virtual id
//! drawn from the registry's sequence. [`Entity::set_entity_id`] moves it to
//! the persisted state: the server id replaces the virtual id, which is
//! cleared and cannot be recovered.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::limits::RESERVED_NAME_ATTRIBUTE;
use crate::metadata::GraphMetadata;
use crate::model::factory::create_attribute_with_descriptor;
use crate::model::{
    coerce, Attribute, AttributeKind, AttributeValue, DirectionType, EdgeType, EntityKind,
    EntityTypeRef, NodeType, ValueInput,
};

/// Index of an entity inside its [`EntityArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(usize);

impl EntityHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind-specific part of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityBody {
    Node {
        edges: Vec<EntityHandle>,
    },
    Edge {
        direction: DirectionType,
        from: Option<EntityHandle>,
        to: Option<EntityHandle>,
    },
    /// A graph behaves like a node. Its name is kept in the reserved
    /// `@name` attribute.
    Graph {
        edges: Vec<EntityHandle>,
    },
}

impl EntityBody {
    /// An empty body for `kind`, or `None` for kinds that cannot be
    /// instantiated.
    pub fn empty(kind: EntityKind) -> Option<EntityBody> {
        match kind {
            EntityKind::Node => Some(EntityBody::Node { edges: Vec::new() }),
            EntityKind::Graph => Some(EntityBody::Graph { edges: Vec::new() }),
            EntityKind::Edge => Some(EntityBody::Edge {
                direction: DirectionType::default(),
                from: None,
                to: None,
            }),
            EntityKind::Invalid | EntityKind::Entity | EntityKind::HyperEdge => None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityBody::Node { .. } => EntityKind::Node,
            EntityBody::Edge { .. } => EntityKind::Edge,
            EntityBody::Graph { .. } => EntityKind::Graph,
        }
    }
}

/// A node, edge or graph with its attributes and lifecycle flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub(crate) virtual_id: i64,
    pub(crate) entity_id: i64,
    pub(crate) version: i32,
    pub(crate) entity_type: Option<EntityTypeRef>,
    pub(crate) is_new: bool,
    pub(crate) is_initialized: bool,
    pub(crate) is_deleted: bool,
    pub(crate) attributes: FxHashMap<String, Attribute>,
    /// Names of modified attributes, in the order they were first changed.
    pub(crate) modified: Vec<String>,
    pub(crate) body: EntityBody,
}

impl Entity {
    fn new(virtual_id: i64, body: EntityBody, entity_type: Option<EntityTypeRef>) -> Self {
        Self {
            virtual_id,
            entity_id: -1,
            version: 0,
            entity_type,
            is_new: true,
            is_initialized: true,
            is_deleted: false,
            attributes: FxHashMap::default(),
            modified: Vec::new(),
            body,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.body.kind()
    }

    pub fn body(&self) -> &EntityBody {
        &self.body
    }

    /// The id used on the wire: the virtual id while the entity is new,
    /// the server id afterwards.
    pub fn virtual_id(&self) -> i64 {
        if self.is_new {
            self.virtual_id
        } else {
            self.entity_id
        }
    }

    /// Server id, or -1 while the entity has none.
    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn entity_type(&self) -> Option<&EntityTypeRef> {
        self.entity_type.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// False for a placeholder that only holds an id.
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Records the server-assigned id. The virtual id is discarded.
    pub fn set_entity_id(&mut self, id: i64) {
        self.virtual_id = 0;
        self.is_new = false;
        self.entity_id = id;
    }

    pub fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    /// Flags the entity as deleted on the client. Nothing is sent until the
    /// caller commits.
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }

    /// User-visible attributes. The reserved `@name` attribute is hidden.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .values()
            .filter(|a| !a.name().eq_ignore_ascii_case(RESERVED_NAME_ATTRIBUTE))
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn is_attribute_set(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|a| !a.is_null())
    }

    /// Modified attributes in the order they were first changed.
    pub fn modified_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.modified.iter().filter_map(|name| self.attributes.get(name))
    }

    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    /// Stores `attribute` under its name and queues it for the next
    /// encode.
    pub fn set_attribute(&mut self, mut attribute: Attribute) -> Result<(), SchemaError> {
        if attribute.name().is_empty() {
            return Err(SchemaError::UnnamedDescriptor);
        }
        let name = attribute.name().to_string();
        attribute.mark_modified();
        self.attributes.insert(name.clone(), attribute);
        self.enqueue_modified(name);
        Ok(())
    }

    /// Assigns `value` to the attribute called `name`, creating the
    /// attribute if the entity does not have one.
    ///
    /// A missing descriptor is resolved from the registry, or created with
    /// the kind inferred from `value`.
    pub fn set_or_create_attribute<'a>(
        &mut self,
        metadata: &GraphMetadata,
        name: &str,
        value: impl Into<ValueInput<'a>>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(SchemaError::UnnamedDescriptor.into());
        }
        let value = value.into();

        if let Some(existing) = self.attributes.get_mut(name) {
            let was_modified = existing.is_modified();
            existing.set_value_with(value, metadata.options())?;
            if !was_modified && existing.is_modified() {
                self.enqueue_modified(name.to_string());
            }
            return Ok(());
        }

        let descriptor = match metadata.attribute_descriptor(name) {
            Some(descriptor) => descriptor,
            None if value.is_null() => {
                return Err(SchemaError::UnknownAttribute {
                    name: name.to_string(),
                }
                .into());
            }
            None => {
                let kind = value.inferred_kind();
                // A value that cannot be stored must not leave a descriptor behind.
                coerce(kind, value.clone(), metadata.options())?;
                metadata.resolve_or_create_descriptor(name, kind)?
            }
        };
        let attribute = create_attribute_with_descriptor(metadata, descriptor, value)?;
        let modified = attribute.is_modified();
        self.attributes.insert(name.to_string(), attribute);
        if modified {
            self.enqueue_modified(name.to_string());
        }
        Ok(())
    }

    /// Clears every dirty flag and empties the modified list, e.g. after a
    /// successful commit.
    pub fn reset_modified(&mut self) {
        for attribute in self.attributes.values_mut() {
            attribute.reset_modified();
        }
        self.modified.clear();
    }

    /// Stores an attribute read from the wire. It is not queued for encode.
    pub(crate) fn insert_decoded_attribute(&mut self, attribute: Attribute) {
        let name = attribute.name().to_string();
        self.modified.retain(|m| *m != name);
        self.attributes.insert(name, attribute);
    }

    fn enqueue_modified(&mut self, name: String) {
        if !self.modified.contains(&name) {
            self.modified.push(name);
        }
    }

    /// Edges of a node or graph. Empty for an edge.
    pub fn edges(&self) -> &[EntityHandle] {
        match &self.body {
            EntityBody::Node { edges } | EntityBody::Graph { edges } => edges,
            EntityBody::Edge { .. } => &[],
        }
    }

    pub(crate) fn edges_mut(&mut self) -> Option<&mut Vec<EntityHandle>> {
        match &mut self.body {
            EntityBody::Node { edges } | EntityBody::Graph { edges } => Some(edges),
            EntityBody::Edge { .. } => None,
        }
    }

    pub fn from_node(&self) -> Option<EntityHandle> {
        match self.body {
            EntityBody::Edge { from, .. } => from,
            _ => None,
        }
    }

    pub fn to_node(&self) -> Option<EntityHandle> {
        match self.body {
            EntityBody::Edge { to, .. } => to,
            _ => None,
        }
    }

    /// Direction of an edge. A typed edge reports its type's direction.
    pub fn direction(&self) -> Option<DirectionType> {
        match &self.body {
            EntityBody::Edge { direction, .. } => Some(
                self.entity_type
                    .as_ref()
                    .and_then(EntityTypeRef::as_edge)
                    .map_or(*direction, |t| t.direction()),
            ),
            _ => None,
        }
    }

    /// Name of a graph, read from its `@name` attribute.
    pub fn graph_name(&self) -> Option<&str> {
        match self.body {
            EntityBody::Graph { .. } => self
                .attributes
                .get(RESERVED_NAME_ATTRIBUTE)
                .and_then(Attribute::value)
                .and_then(AttributeValue::as_str),
            _ => None,
        }
    }
}

/// Which end of an edge a node must be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeDirection {
    #[default]
    Any,
    /// The node is the edge's from-node.
    Outbound,
    /// The node is the edge's to-node.
    Inbound,
}

/// Dense store of the entities built from one registry.
#[derive(Debug)]
pub struct EntityArena {
    metadata: Arc<GraphMetadata>,
    entities: Vec<Entity>,
}

impl EntityArena {
    pub fn new(metadata: Arc<GraphMetadata>) -> Self {
        Self {
            metadata,
            entities: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &Arc<GraphMetadata> {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.entities.get_mut(handle.0)
    }

    /// Like [`get`](Self::get) but reports a missing handle as an error.
    pub fn entity(&self, handle: EntityHandle) -> Result<&Entity, SchemaError> {
        self.entities
            .get(handle.0)
            .ok_or(SchemaError::UnknownHandle { index: handle.0 })
    }

    pub(crate) fn entity_mut(&mut self, handle: EntityHandle) -> Result<&mut Entity, SchemaError> {
        self.entities
            .get_mut(handle.0)
            .ok_or(SchemaError::UnknownHandle { index: handle.0 })
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityHandle(i), e))
    }

    /// Finds the entity whose wire id is `id`.
    pub fn find_by_id(&self, id: i64) -> Option<EntityHandle> {
        self.entities
            .iter()
            .position(|e| e.virtual_id() == id)
            .map(EntityHandle)
    }

    fn push(&mut self, entity: Entity) -> EntityHandle {
        let handle = EntityHandle(self.entities.len());
        self.entities.push(entity);
        handle
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new_node(&mut self) -> EntityHandle {
        let entity = Entity::new(
            self.metadata.next_virtual_id(),
            EntityBody::Node { edges: Vec::new() },
            None,
        );
        self.push(entity)
    }

    pub fn new_node_with_type(&mut self, node_type: Arc<NodeType>) -> EntityHandle {
        let entity = Entity::new(
            self.metadata.next_virtual_id(),
            EntityBody::Node { edges: Vec::new() },
            Some(EntityTypeRef::Node(node_type)),
        );
        self.push(entity)
    }

    /// Creates a graph. A non-empty `name` is stored in `@name`.
    pub fn new_graph(&mut self, name: &str) -> Result<EntityHandle> {
        let mut entity = Entity::new(
            self.metadata.next_virtual_id(),
            EntityBody::Graph { edges: Vec::new() },
            None,
        );
        if !name.is_empty() {
            entity.set_or_create_attribute(&self.metadata, RESERVED_NAME_ATTRIBUTE, name)?;
        }
        Ok(self.push(entity))
    }

    /// Creates an edge and appends it to the edge lists of both endpoints.
    /// A self-loop is listed once.
    pub fn new_edge(
        &mut self,
        from: EntityHandle,
        to: EntityHandle,
        direction: DirectionType,
    ) -> Result<EntityHandle, SchemaError> {
        self.connect(from, to, direction, None)
    }

    /// Creates an edge of `edge_type`. The direction comes from the type.
    pub fn new_edge_with_type(
        &mut self,
        from: EntityHandle,
        to: EntityHandle,
        edge_type: Arc<EdgeType>,
    ) -> Result<EntityHandle, SchemaError> {
        let direction = edge_type.direction();
        self.connect(from, to, direction, Some(EntityTypeRef::Edge(edge_type)))
    }

    fn connect(
        &mut self,
        from: EntityHandle,
        to: EntityHandle,
        direction: DirectionType,
        entity_type: Option<EntityTypeRef>,
    ) -> Result<EntityHandle, SchemaError> {
        self.check_endpoint(from, "from")?;
        self.check_endpoint(to, "to")?;

        let entity = Entity::new(
            self.metadata.next_virtual_id(),
            EntityBody::Edge {
                direction,
                from: Some(from),
                to: Some(to),
            },
            entity_type,
        );
        let edge = self.push(entity);
        self.add_edge(from, edge)?;
        self.add_edge(to, edge)?;
        Ok(edge)
    }

    fn check_endpoint(&self, handle: EntityHandle, end: &'static str) -> Result<(), SchemaError> {
        match self.entities.get(handle.0).map(Entity::kind) {
            Some(EntityKind::Node | EntityKind::Graph) => Ok(()),
            _ => Err(SchemaError::InvalidEndpoint { end }),
        }
    }

    /// Creates an empty entity of `kind`. An edge created this way has no
    /// endpoints.
    pub fn new_entity(&mut self, kind: EntityKind) -> Result<EntityHandle> {
        match kind {
            EntityKind::Node => Ok(self.new_node()),
            EntityKind::Graph => self.new_graph(""),
            EntityKind::Edge => {
                let body = EntityBody::empty(kind).ok_or(SchemaError::UnsupportedEntityKind { kind })?;
                let entity = Entity::new(self.metadata.next_virtual_id(), body, None);
                Ok(self.push(entity))
            }
            EntityKind::Invalid | EntityKind::Entity | EntityKind::HyperEdge => {
                Err(SchemaError::UnsupportedEntityKind { kind }.into())
            }
        }
    }

    /// Creates an uninitialized entity that only carries the server id
    /// `id`. It consumes no virtual id.
    pub(crate) fn placeholder(
        &mut self,
        kind: EntityKind,
        id: i64,
    ) -> Result<EntityHandle, SchemaError> {
        let body = EntityBody::empty(kind).ok_or(SchemaError::UnsupportedEntityKind { kind })?;
        let mut entity = Entity::new(0, body, None);
        entity.set_entity_id(id);
        entity.is_initialized = false;
        Ok(self.push(entity))
    }

    /// Drops every entity allocated at or after `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entities.truncate(len);
    }

    /// Appends `edge` to the edge list of `node` unless already present.
    pub fn add_edge(&mut self, node: EntityHandle, edge: EntityHandle) -> Result<(), SchemaError> {
        let edges = self
            .entity_mut(node)?
            .edges_mut()
            .ok_or(SchemaError::InvalidEndpoint { end: "edge list" })?;
        if !edges.contains(&edge) {
            edges.push(edge);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    pub fn set_entity_id(&mut self, handle: EntityHandle, id: i64) -> Result<(), SchemaError> {
        self.entity_mut(handle)?.set_entity_id(id);
        Ok(())
    }

    pub fn set_version(&mut self, handle: EntityHandle, version: i32) -> Result<(), SchemaError> {
        self.entity_mut(handle)?.set_version(version);
        Ok(())
    }

    pub fn mark_deleted(&mut self, handle: EntityHandle) -> Result<(), SchemaError> {
        self.entity_mut(handle)?.mark_deleted();
        Ok(())
    }

    pub fn reset_modified(&mut self, handle: EntityHandle) -> Result<(), SchemaError> {
        self.entity_mut(handle)?.reset_modified();
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        handle: EntityHandle,
        attribute: Attribute,
    ) -> Result<(), SchemaError> {
        self.entity_mut(handle)?.set_attribute(attribute)
    }

    /// See [`Entity::set_or_create_attribute`].
    pub fn set_or_create_attribute<'a>(
        &mut self,
        handle: EntityHandle,
        name: &str,
        value: impl Into<ValueInput<'a>>,
    ) -> Result<()> {
        let entity = self
            .entities
            .get_mut(handle.0)
            .ok_or(SchemaError::UnknownHandle { index: handle.0 })?;
        entity.set_or_create_attribute(&self.metadata, name, value)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Edges of `node` whose direction is `direction`.
    pub fn edges_with_direction(
        &self,
        node: EntityHandle,
        direction: DirectionType,
    ) -> Vec<EntityHandle> {
        let Some(entity) = self.get(node) else {
            return Vec::new();
        };
        entity
            .edges()
            .iter()
            .copied()
            .filter(|&e| self.get(e).and_then(Entity::direction) == Some(direction))
            .collect()
    }

    /// Initialized edges of `node`, optionally restricted to the edge type
    /// named `edge_type` and to one end of the edge.
    pub fn edges_for_type(
        &self,
        node: EntityHandle,
        edge_type: Option<&str>,
        direction: EdgeDirection,
    ) -> Vec<EntityHandle> {
        let Some(entity) = self.get(node) else {
            return Vec::new();
        };
        entity
            .edges()
            .iter()
            .copied()
            .filter(|&handle| {
                let Some(edge) = self.get(handle) else {
                    return false;
                };
                if !edge.is_initialized() {
                    return false;
                }
                let type_matches = edge_type
                    .is_none_or(|wanted| edge.entity_type().map(EntityTypeRef::name) == Some(wanted));
                if !type_matches {
                    return false;
                }
                match direction {
                    EdgeDirection::Any => true,
                    EdgeDirection::Outbound => edge.from_node() == Some(node),
                    EdgeDirection::Inbound => edge.to_node() == Some(node),
                }
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Large objects
    // -------------------------------------------------------------------------

    /// Returns the bytes of the Blob or Clob attribute `name`, or `None` when
    /// the cached value is null.
    ///
    /// Cached bytes are returned as they are unless `force_refetch` is set.
    /// Otherwise the bytes are fetched through the registry's connection
    /// (decrypted for an encrypted Blob) and cached on the attribute.
    pub fn large_object_bytes(
        &mut self,
        handle: EntityHandle,
        name: &str,
        force_refetch: bool,
    ) -> Result<Option<Vec<u8>>> {
        let entity = self
            .entities
            .get_mut(handle.0)
            .ok_or(SchemaError::UnknownHandle { index: handle.0 })?;
        let attribute = entity
            .attributes
            .get_mut(name)
            .ok_or_else(|| SchemaError::UnknownAttribute {
                name: name.to_string(),
            })?;
        let Some(lob) = attribute.large_object() else {
            return Err(SchemaError::NotLargeObject {
                name: name.to_string(),
                kind: attribute.kind(),
            }
            .into());
        };

        if lob.is_cached && !force_refetch {
            return Ok(attribute
                .value()
                .and_then(AttributeValue::as_bytes)
                .map(<[u8]>::to_vec));
        }

        let connection = self.metadata.require_connection("large object fetch")?;
        let encrypted = attribute.kind() == AttributeKind::Blob && attribute.descriptor().is_encrypted();
        let bytes = if encrypted {
            connection.decrypt_entity(lob.remote_id)?
        } else {
            connection.get_large_object_as_bytes(lob.remote_id, force_refetch)?
        };
        debug!(
            remote_id = lob.remote_id,
            len = bytes.len(),
            encrypted,
            "fetched large object"
        );
        attribute.cache_large_object(bytes.clone());
        Ok(Some(bytes))
    }
}
