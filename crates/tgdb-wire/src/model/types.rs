//! Entity types: the schema side of nodes and edges.

use std::sync::Arc;

use crate::model::{AttributeDescriptor, DirectionType, SystemType};

/// Fields shared by node and edge types.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    id: i32,
    name: String,
    system_type: SystemType,
    parent: Option<EntityTypeRef>,
    page_size: i32,
    attributes: Vec<Arc<AttributeDescriptor>>,
}

impl EntityType {
    pub fn new(id: i32, name: impl Into<String>, system_type: SystemType) -> Self {
        Self {
            id,
            name: name.into(),
            system_type,
            parent: None,
            page_size: 0,
            attributes: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: EntityTypeRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_type(&self) -> SystemType {
        self.system_type
    }

    /// The type this one derives from, if any.
    pub fn parent(&self) -> Option<&EntityTypeRef> {
        self.parent.as_ref()
    }

    pub fn page_size(&self) -> i32 {
        self.page_size
    }

    /// Declared attributes in declaration order. Inherited attributes are
    /// not included.
    pub fn attribute_descriptors(&self) -> &[Arc<AttributeDescriptor>] {
        &self.attributes
    }

    /// Looks up an attribute on this type, then up the parent chain.
    pub fn attribute_descriptor(&self, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.attributes
            .iter()
            .find(|d| d.name() == name)
            .or_else(|| self.parent.as_ref()?.base().attribute_descriptor(name))
    }

    /// Adds a descriptor, replacing any declared under the same name.
    pub fn add_attribute_descriptor(&mut self, descriptor: Arc<AttributeDescriptor>) {
        match self.attributes.iter_mut().find(|d| d.name() == descriptor.name()) {
            Some(slot) => *slot = descriptor,
            None => self.attributes.push(descriptor),
        }
    }

    /// Swaps each declared descriptor for the registered one of the same
    /// name. Names `lookup` does not know keep their current descriptor.
    pub(crate) fn resolve_attributes<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<Arc<AttributeDescriptor>>,
    {
        for slot in &mut self.attributes {
            if let Some(resolved) = lookup(slot.name()) {
                *slot = resolved;
            }
        }
    }
}

/// A node type: attributes plus primary key and index information.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeType {
    base: EntityType,
    primary_keys: Vec<Arc<AttributeDescriptor>>,
    index_ids: Vec<i32>,
    num_entries: i64,
}

impl NodeType {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self::from_base(EntityType::new(id, name, SystemType::Node))
    }

    pub fn from_base(base: EntityType) -> Self {
        Self {
            base,
            primary_keys: Vec::new(),
            index_ids: Vec::new(),
            num_entries: 0,
        }
    }

    pub fn base(&self) -> &EntityType {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut EntityType {
        &mut self.base
    }

    pub fn id(&self) -> i32 {
        self.base.id()
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn primary_keys(&self) -> &[Arc<AttributeDescriptor>] {
        &self.primary_keys
    }

    pub fn index_ids(&self) -> &[i32] {
        &self.index_ids
    }

    pub fn num_entries(&self) -> i64 {
        self.num_entries
    }

    pub fn with_primary_keys(mut self, keys: Vec<Arc<AttributeDescriptor>>) -> Self {
        self.primary_keys = keys;
        self
    }

    pub fn with_index_ids(mut self, ids: Vec<i32>) -> Self {
        self.index_ids = ids;
        self
    }

    pub fn with_num_entries(mut self, num_entries: i64) -> Self {
        self.num_entries = num_entries;
        self
    }

    pub(crate) fn resolve_attributes<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<Arc<AttributeDescriptor>>,
    {
        self.base.resolve_attributes(&lookup);
        for slot in &mut self.primary_keys {
            if let Some(resolved) = lookup(slot.name()) {
                *slot = resolved;
            }
        }
    }
}

/// An edge type: attributes plus direction and endpoint node types.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeType {
    base: EntityType,
    direction: DirectionType,
    from_type_id: i32,
    to_type_id: i32,
    num_entries: i64,
}

impl EdgeType {
    pub fn new(id: i32, name: impl Into<String>, direction: DirectionType) -> Self {
        Self::from_base(EntityType::new(id, name, SystemType::Edge), direction)
    }

    pub fn from_base(base: EntityType, direction: DirectionType) -> Self {
        Self {
            base,
            direction,
            from_type_id: 0,
            to_type_id: 0,
            num_entries: 0,
        }
    }

    pub fn with_endpoint_types(mut self, from_type_id: i32, to_type_id: i32) -> Self {
        self.from_type_id = from_type_id;
        self.to_type_id = to_type_id;
        self
    }

    pub fn with_num_entries(mut self, num_entries: i64) -> Self {
        self.num_entries = num_entries;
        self
    }

    pub fn base(&self) -> &EntityType {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut EntityType {
        &mut self.base
    }

    pub fn id(&self) -> i32 {
        self.base.id()
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn direction(&self) -> DirectionType {
        self.direction
    }

    pub fn from_type_id(&self) -> i32 {
        self.from_type_id
    }

    pub fn to_type_id(&self) -> i32 {
        self.to_type_id
    }

    pub fn num_entries(&self) -> i64 {
        self.num_entries
    }

    pub(crate) fn resolve_attributes<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<Arc<AttributeDescriptor>>,
    {
        self.base.resolve_attributes(lookup);
    }
}

/// Shared reference to a registered node or edge type.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityTypeRef {
    Node(Arc<NodeType>),
    Edge(Arc<EdgeType>),
}

impl EntityTypeRef {
    pub fn base(&self) -> &EntityType {
        match self {
            EntityTypeRef::Node(t) => t.base(),
            EntityTypeRef::Edge(t) => t.base(),
        }
    }

    pub fn id(&self) -> i32 {
        self.base().id()
    }

    pub fn name(&self) -> &str {
        self.base().name()
    }

    pub fn as_node(&self) -> Option<&Arc<NodeType>> {
        match self {
            EntityTypeRef::Node(t) => Some(t),
            EntityTypeRef::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Arc<EdgeType>> {
        match self {
            EntityTypeRef::Edge(t) => Some(t),
            EntityTypeRef::Node(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeKind, DecimalShape};

    fn desc(id: i64, name: &str, kind: AttributeKind) -> Arc<AttributeDescriptor> {
        Arc::new(AttributeDescriptor::new(id, name, kind, false, false, DecimalShape::default()))
    }

    #[test]
    fn test_attribute_lookup_walks_parents() {
        let mut person = NodeType::new(1, "person");
        person.base_mut().add_attribute_descriptor(desc(10, "name", AttributeKind::String));
        let person = Arc::new(person);

        let mut employee = EntityType::new(2, "employee", SystemType::Node)
            .with_parent(EntityTypeRef::Node(person.clone()));
        employee.add_attribute_descriptor(desc(11, "salary", AttributeKind::Double));

        assert_eq!(employee.attribute_descriptor("salary").unwrap().id(), 11);
        assert_eq!(employee.attribute_descriptor("name").unwrap().id(), 10);
        assert!(employee.attribute_descriptor("age").is_none());
        assert_eq!(employee.attribute_descriptors().len(), 1);
    }

    #[test]
    fn test_add_replaces_same_name() {
        let mut t = EntityType::new(1, "t", SystemType::Node);
        t.add_attribute_descriptor(desc(0, "x", AttributeKind::String));
        t.add_attribute_descriptor(desc(5, "x", AttributeKind::Long));
        assert_eq!(t.attribute_descriptors().len(), 1);
        assert_eq!(t.attribute_descriptor("x").unwrap().kind(), AttributeKind::Long);
    }

    #[test]
    fn test_resolve_attributes() {
        let mut node = NodeType::new(3, "city").with_primary_keys(vec![desc(0, "zip", AttributeKind::String)]);
        node.base_mut().add_attribute_descriptor(desc(0, "zip", AttributeKind::String));
        node.base_mut().add_attribute_descriptor(desc(0, "unknown", AttributeKind::String));

        let registered = desc(42, "zip", AttributeKind::Integer);
        node.resolve_attributes(|name| (name == "zip").then(|| registered.clone()));

        assert_eq!(node.base().attribute_descriptor("zip").unwrap().id(), 42);
        assert_eq!(node.primary_keys()[0].kind(), AttributeKind::Integer);
        assert_eq!(node.base().attribute_descriptor("unknown").unwrap().id(), 0);
    }

    #[test]
    fn test_type_ref_accessors() {
        let edge = EntityTypeRef::Edge(Arc::new(
            EdgeType::new(9, "knows", DirectionType::Bidirectional).with_endpoint_types(1, 1),
        ));
        assert_eq!(edge.id(), 9);
        assert_eq!(edge.name(), "knows");
        assert!(edge.as_node().is_none());
        assert_eq!(edge.as_edge().unwrap().direction(), DirectionType::Bidirectional);
        assert_eq!(edge.base().system_type(), SystemType::Edge);
    }
}
