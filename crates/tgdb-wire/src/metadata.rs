//! The schema registry.
//!
//! [`GraphMetadata`] maps attribute, node-type and edge-type names and wire
//! ids to their descriptors. One registry exists per connection. It starts
//! empty, grows as the server sends schema, and never forgets an entry.
//! Lookups hand out `Arc`s, so a later update never invalidates a value a
//! caller already holds.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::config::ModelOptions;
use crate::connection::Connection;
use crate::error::SchemaError;
use crate::ids::Sequences;
use crate::model::{
    AttributeDescriptor, AttributeKind, CompositeKey, DecimalShape, EdgeType, EntityType,
    EntityTypeRef, NodeType, SystemType,
};

#[derive(Debug, Default)]
struct Registry {
    descriptors: FxHashMap<String, Arc<AttributeDescriptor>>,
    descriptors_by_id: FxHashMap<i64, Arc<AttributeDescriptor>>,
    node_types: FxHashMap<String, Arc<NodeType>>,
    node_types_by_id: FxHashMap<i32, Arc<NodeType>>,
    edge_types: FxHashMap<String, Arc<EdgeType>>,
    edge_types_by_id: FxHashMap<i32, Arc<EdgeType>>,
    initialized: bool,
}

impl Registry {
    fn insert_descriptor(&mut self, descriptor: Arc<AttributeDescriptor>) {
        self.descriptors_by_id
            .insert(descriptor.id(), descriptor.clone());
        self.descriptors
            .insert(descriptor.name().to_string(), descriptor);
    }
}

/// Schema registry shared by every entity created from one connection.
pub struct GraphMetadata {
    registry: RwLock<Registry>,
    sequences: Sequences,
    options: ModelOptions,
    connection: Option<Arc<dyn Connection>>,
}

impl GraphMetadata {
    /// Creates an empty registry using the process-wide id sequences and
    /// default options.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            sequences: Sequences::process(),
            options: ModelOptions::default(),
            connection: None,
        }
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_sequences(mut self, sequences: Sequences) -> Self {
        self.sequences = sequences;
        self
    }

    /// Attaches the connection used for encrypted attributes and large
    /// object fetches.
    pub fn with_connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn sequences(&self) -> &Sequences {
        &self.sequences
    }

    pub fn connection(&self) -> Option<&Arc<dyn Connection>> {
        self.connection.as_ref()
    }

    /// Returns the connection, or a schema error naming `operation`.
    pub fn require_connection(
        &self,
        operation: &'static str,
    ) -> Result<&Arc<dyn Connection>, SchemaError> {
        self.connection
            .as_ref()
            .ok_or(SchemaError::MissingConnection { operation })
    }

    /// Next virtual id for a new entity or local large object.
    pub fn next_virtual_id(&self) -> i64 {
        self.sequences.entities.next_id()
    }

    /// Next provisional id for a client-created descriptor.
    pub fn next_attribute_id(&self) -> i64 {
        self.sequences.attributes.next_id()
    }

    /// Shape given to newly created Number descriptors.
    pub fn default_decimal_shape(&self) -> DecimalShape {
        DecimalShape {
            precision: self.options.decimal_precision,
            scale: self.options.decimal_scale,
        }
    }

    /// True once the server has sent schema at least once.
    pub fn is_initialized(&self) -> bool {
        self.registry.read().initialized
    }

    // -------------------------------------------------------------------------
    // Attribute descriptors
    // -------------------------------------------------------------------------

    pub fn attribute_descriptor(&self, name: &str) -> Option<Arc<AttributeDescriptor>> {
        self.registry.read().descriptors.get(name).cloned()
    }

    pub fn attribute_descriptor_by_id(&self, id: i64) -> Option<Arc<AttributeDescriptor>> {
        self.registry.read().descriptors_by_id.get(&id).cloned()
    }

    /// All known descriptors, in no particular order.
    pub fn attribute_descriptors(&self) -> Vec<Arc<AttributeDescriptor>> {
        let registry = self.registry.read();
        if registry.descriptors.is_empty() {
            warn!("graph metadata has no attribute descriptors");
        }
        registry.descriptors.values().cloned().collect()
    }

    /// Descriptors created on the client and not yet known to the server,
    /// ordered by creation.
    pub fn new_attribute_descriptors(&self) -> Vec<Arc<AttributeDescriptor>> {
        let mut local: Vec<_> = self
            .registry
            .read()
            .descriptors
            .values()
            .filter(|d| d.is_local())
            .cloned()
            .collect();
        // Local ids count down, so creation order is descending id.
        local.sort_by_key(|d| std::cmp::Reverse(d.id()));
        local
    }

    /// Creates and registers a client-side descriptor with a provisional id.
    pub fn create_attribute_descriptor(
        &self,
        name: &str,
        kind: AttributeKind,
        is_array: bool,
    ) -> Result<Arc<AttributeDescriptor>, SchemaError> {
        let descriptor = self.new_local_descriptor(name, kind, is_array)?;
        self.registry.write().insert_descriptor(descriptor.clone());
        Ok(descriptor)
    }

    fn new_local_descriptor(
        &self,
        name: &str,
        kind: AttributeKind,
        is_array: bool,
    ) -> Result<Arc<AttributeDescriptor>, SchemaError> {
        if name.is_empty() {
            return Err(SchemaError::UnnamedDescriptor);
        }
        if kind == AttributeKind::Invalid {
            return Err(SchemaError::InvalidAttributeKind { value: kind as u8 });
        }
        let descriptor = Arc::new(AttributeDescriptor::new(
            self.next_attribute_id(),
            name,
            kind,
            is_array,
            false,
            self.default_decimal_shape(),
        ));
        debug!(name, kind = ?kind, id = descriptor.id(), "created attribute descriptor");
        Ok(descriptor)
    }

    /// Creates a descriptor whose kind is named by a runtime type name
    /// (see [`AttributeKind::from_type_name`]).
    pub fn create_attribute_descriptor_for_data_type(
        &self,
        name: &str,
        type_name: &str,
    ) -> Result<Arc<AttributeDescriptor>, SchemaError> {
        let kind = AttributeKind::from_type_name(type_name).ok_or_else(|| {
            SchemaError::UnknownTypeName {
                name: type_name.to_string(),
            }
        })?;
        self.create_attribute_descriptor(name, kind, false)
    }

    /// Returns the registered descriptor for `name`, creating one of `kind`
    /// if none exists.
    pub fn resolve_or_create_descriptor(
        &self,
        name: &str,
        kind: AttributeKind,
    ) -> Result<Arc<AttributeDescriptor>, SchemaError> {
        if let Some(descriptor) = self.attribute_descriptor(name) {
            return Ok(descriptor);
        }
        // Another writer may have registered the name since the read above.
        let mut registry = self.registry.write();
        if let Some(descriptor) = registry.descriptors.get(name) {
            return Ok(descriptor.clone());
        }
        let descriptor = self.new_local_descriptor(name, kind, false)?;
        registry.insert_descriptor(descriptor.clone());
        Ok(descriptor)
    }

    // -------------------------------------------------------------------------
    // Entity types
    // -------------------------------------------------------------------------

    pub fn node_type(&self, name: &str) -> Option<Arc<NodeType>> {
        self.registry.read().node_types.get(name).cloned()
    }

    pub fn node_type_by_id(&self, id: i32) -> Option<Arc<NodeType>> {
        self.registry.read().node_types_by_id.get(&id).cloned()
    }

    pub fn node_types(&self) -> Vec<Arc<NodeType>> {
        self.registry.read().node_types.values().cloned().collect()
    }

    pub fn edge_type(&self, name: &str) -> Option<Arc<EdgeType>> {
        self.registry.read().edge_types.get(name).cloned()
    }

    pub fn edge_type_by_id(&self, id: i32) -> Option<Arc<EdgeType>> {
        self.registry.read().edge_types_by_id.get(&id).cloned()
    }

    pub fn edge_types(&self) -> Vec<Arc<EdgeType>> {
        self.registry.read().edge_types.values().cloned().collect()
    }

    /// Resolves a wire type id, trying node types before edge types.
    ///
    /// An unknown id is logged and yields `None`: the server may know types
    /// this registry has not loaded yet.
    pub fn entity_type_by_id(&self, id: i32) -> Option<EntityTypeRef> {
        let registry = self.registry.read();
        if let Some(node_type) = registry.node_types_by_id.get(&id) {
            return Some(EntityTypeRef::Node(node_type.clone()));
        }
        if let Some(edge_type) = registry.edge_types_by_id.get(&id) {
            return Some(EntityTypeRef::Edge(edge_type.clone()));
        }
        warn!(type_id = id, "cannot find entity type in graph metadata");
        None
    }

    /// Builds an unregistered node type deriving from `parent`.
    pub fn create_node_type(&self, name: &str, parent: Option<Arc<NodeType>>) -> NodeType {
        let mut base = EntityType::new(0, name, SystemType::Node);
        if let Some(parent) = parent {
            base = base.with_parent(EntityTypeRef::Node(parent));
        }
        NodeType::from_base(base)
    }

    /// Builds an unregistered edge type deriving from `parent`.
    pub fn create_edge_type(&self, name: &str, parent: Option<Arc<EdgeType>>) -> EdgeType {
        let direction = parent.as_ref().map(|p| p.direction()).unwrap_or_default();
        let mut base = EntityType::new(0, name, SystemType::Edge);
        if let Some(parent) = parent {
            base = base.with_parent(EntityTypeRef::Edge(parent));
        }
        EdgeType::from_base(base, direction)
    }

    /// Creates an empty lookup key for nodes of `node_type_name`.
    pub fn create_composite_key(&self, node_type_name: &str) -> CompositeKey {
        CompositeKey::new(Some(node_type_name.to_string()))
    }

    // -------------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------------

    /// Registers schema sent by the server.
    ///
    /// Descriptors are registered first so that type attribute lists and
    /// primary keys can be resolved against them by name. Entries with the
    /// same name or id are replaced; `Arc`s handed out earlier stay valid.
    pub fn update_metadata(
        &self,
        descriptors: Vec<AttributeDescriptor>,
        node_types: Vec<NodeType>,
        edge_types: Vec<EdgeType>,
    ) {
        let mut guard = self.registry.write();
        let registry = &mut *guard;

        for descriptor in descriptors {
            registry.insert_descriptor(Arc::new(descriptor));
        }

        for mut node_type in node_types {
            node_type.resolve_attributes(|name| registry.descriptors.get(name).cloned());
            let node_type = Arc::new(node_type);
            registry
                .node_types_by_id
                .insert(node_type.id(), node_type.clone());
            registry
                .node_types
                .insert(node_type.name().to_string(), node_type);
        }

        for mut edge_type in edge_types {
            edge_type.resolve_attributes(|name| registry.descriptors.get(name).cloned());
            let edge_type = Arc::new(edge_type);
            registry
                .edge_types_by_id
                .insert(edge_type.id(), edge_type.clone());
            registry
                .edge_types
                .insert(edge_type.name().to_string(), edge_type);
        }

        registry.initialized = true;
        debug!(
            descriptors = registry.descriptors.len(),
            node_types = registry.node_types.len(),
            edge_types = registry.edge_types.len(),
            "graph metadata updated"
        );
    }
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("GraphMetadata")
            .field("descriptors", &registry.descriptors.len())
            .field("node_types", &registry.node_types.len())
            .field("edge_types", &registry.edge_types.len())
            .field("initialized", &registry.initialized)
            .field("options", &self.options)
            .field("has_connection", &self.connection.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DirectionType;
    use std::sync::Barrier;
    use std::thread;

    fn metadata() -> GraphMetadata {
        GraphMetadata::new().with_sequences(Sequences::isolated())
    }

    fn server_desc(id: i64, name: &str, kind: AttributeKind) -> AttributeDescriptor {
        AttributeDescriptor::new(id, name, kind, false, false, DecimalShape::default())
    }

    #[test]
    fn test_create_descriptor_registers_by_name_and_id() {
        let gmd = metadata();
        let desc = gmd
            .create_attribute_descriptor("age", AttributeKind::Integer, false)
            .unwrap();
        assert_eq!(desc.id(), -1);
        assert!(Arc::ptr_eq(&gmd.attribute_descriptor("age").unwrap(), &desc));
        assert!(Arc::ptr_eq(&gmd.attribute_descriptor_by_id(-1).unwrap(), &desc));
    }

    #[test]
    fn test_create_descriptor_validation() {
        let gmd = metadata();
        assert!(matches!(
            gmd.create_attribute_descriptor("", AttributeKind::String, false),
            Err(SchemaError::UnnamedDescriptor)
        ));
        assert!(matches!(
            gmd.create_attribute_descriptor("x", AttributeKind::Invalid, false),
            Err(SchemaError::InvalidAttributeKind { value: 0 })
        ));
    }

    #[test]
    fn test_number_descriptor_gets_default_shape() {
        let gmd = metadata().with_options(ModelOptions::new().with_decimal_shape(12, 3));
        let desc = gmd
            .create_attribute_descriptor("price", AttributeKind::Number, false)
            .unwrap();
        assert_eq!((desc.precision(), desc.scale()), (12, 3));
    }

    #[test]
    fn test_for_data_type() {
        let gmd = metadata();
        let desc = gmd
            .create_attribute_descriptor_for_data_type("when", "time.Time")
            .unwrap();
        assert_eq!(desc.kind(), AttributeKind::TimeStamp);
        assert!(matches!(
            gmd.create_attribute_descriptor_for_data_type("z", "complex64"),
            Err(SchemaError::UnknownTypeName { .. })
        ));
    }

    #[test]
    fn test_new_attribute_descriptors() {
        let gmd = metadata();
        gmd.update_metadata(vec![server_desc(5, "name", AttributeKind::String)], vec![], vec![]);
        gmd.create_attribute_descriptor("a", AttributeKind::Long, false).unwrap();
        gmd.create_attribute_descriptor("b", AttributeKind::Long, false).unwrap();

        let names: Vec<_> = gmd
            .new_attribute_descriptors()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_update_resolves_type_attributes() {
        let gmd = metadata();
        let mut person = NodeType::new(10, "person")
            .with_primary_keys(vec![Arc::new(server_desc(0, "name", AttributeKind::String))]);
        person
            .base_mut()
            .add_attribute_descriptor(Arc::new(server_desc(0, "age", AttributeKind::String)));
        let knows = EdgeType::new(20, "knows", DirectionType::Undirected);

        gmd.update_metadata(
            vec![
                server_desc(1, "name", AttributeKind::String),
                server_desc(2, "age", AttributeKind::Integer),
            ],
            vec![person],
            vec![knows],
        );

        assert!(gmd.is_initialized());
        let person = gmd.node_type("person").unwrap();
        assert_eq!(person.base().attribute_descriptor("age").unwrap().id(), 2);
        assert_eq!(person.primary_keys()[0].id(), 1);
        assert!(Arc::ptr_eq(&gmd.node_type_by_id(10).unwrap(), &person));
        assert_eq!(gmd.edge_type_by_id(20).unwrap().name(), "knows");
    }

    #[test]
    fn test_entity_type_by_id() {
        let gmd = metadata();
        gmd.update_metadata(
            vec![],
            vec![NodeType::new(1, "n")],
            vec![EdgeType::new(2, "e", DirectionType::Directed)],
        );
        assert!(matches!(gmd.entity_type_by_id(1), Some(EntityTypeRef::Node(_))));
        assert!(matches!(gmd.entity_type_by_id(2), Some(EntityTypeRef::Edge(_))));
        assert!(gmd.entity_type_by_id(3).is_none());
    }

    #[test]
    fn test_held_references_survive_updates() {
        let gmd = metadata();
        gmd.update_metadata(vec![server_desc(1, "x", AttributeKind::Integer)], vec![], vec![]);
        let held = gmd.attribute_descriptor("x").unwrap();
        gmd.update_metadata(vec![server_desc(1, "x", AttributeKind::Long)], vec![], vec![]);
        assert_eq!(held.kind(), AttributeKind::Integer);
        assert_eq!(gmd.attribute_descriptor("x").unwrap().kind(), AttributeKind::Long);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let gmd = Arc::new(metadata());
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let gmd = gmd.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        gmd.create_attribute_descriptor(&format!("t{t}_{i}"), AttributeKind::Integer, false)
                            .unwrap();
                        let _ = gmd.attribute_descriptors();
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(gmd.new_attribute_descriptors().len(), 200);
    }

    #[test]
    fn test_concurrent_resolve_creates_one_descriptor() {
        for round in 0..50 {
            let gmd = Arc::new(metadata());
            let barrier = Arc::new(Barrier::new(4));
            let name = format!("shared{round}");
            let workers: Vec<_> = (0..4)
                .map(|_| {
                    let (gmd, barrier, name) = (gmd.clone(), barrier.clone(), name.clone());
                    thread::spawn(move || {
                        barrier.wait();
                        gmd.resolve_or_create_descriptor(&name, AttributeKind::Integer)
                            .unwrap()
                            .id()
                    })
                })
                .collect();
            let ids: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
            assert!(ids.iter().all(|id| *id == ids[0]));
            let local = gmd.new_attribute_descriptors();
            assert_eq!(local.len(), 1);
            assert_eq!(local[0].id(), ids[0]);
            assert!(gmd.attribute_descriptor_by_id(ids[0] - 1).is_none());
        }
    }

    #[test]
    fn test_missing_connection() {
        let gmd = metadata();
        assert!(matches!(
            gmd.require_connection("decrypt"),
            Err(SchemaError::MissingConnection { operation: "decrypt" })
        ));
    }

    #[test]
    fn test_client_side_types() {
        let gmd = metadata();
        let parent = Arc::new(EdgeType::new(3, "rel", DirectionType::Bidirectional));
        let child = gmd.create_edge_type("friend", Some(parent));
        assert_eq!(child.direction(), DirectionType::Bidirectional);
        assert_eq!(child.base().parent().unwrap().name(), "rel");
        assert!(gmd.edge_type("friend").is_none());

        let key = gmd.create_composite_key("person");
        assert_eq!(key.type_name(), Some("person"));
    }
}
