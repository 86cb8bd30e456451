//! Attribute descriptors.

use parking_lot::RwLock;

use crate::model::{AttributeKind, Decimal};

/// Precision and scale of a Number attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecimalShape {
    pub precision: i16,
    pub scale: i16,
}

/// Schema metadata for one attribute: its id, name and kind.
///
/// Descriptors are shared (`Arc`) between the registry and every attribute
/// created from them. All fields are fixed at construction except the
/// decimal shape, which follows the last Number value assigned through any
/// attribute that shares the descriptor (see [`apply_decimal_shape`]).
#[derive(Debug)]
pub struct AttributeDescriptor {
    id: i64,
    name: String,
    kind: AttributeKind,
    is_array: bool,
    is_encrypted: bool,
    shape: RwLock<DecimalShape>,
}

impl AttributeDescriptor {
    /// Creates a descriptor. Number descriptors start with `default_shape`;
    /// other kinds carry a zero shape.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        kind: AttributeKind,
        is_array: bool,
        is_encrypted: bool,
        default_shape: DecimalShape,
    ) -> Self {
        let shape = if kind == AttributeKind::Number {
            default_shape
        } else {
            DecimalShape::default()
        };
        Self {
            id,
            name: name.into(),
            kind,
            is_array,
            is_encrypted,
            shape: RwLock::new(shape),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    /// True while the descriptor only exists on the client.
    pub fn is_local(&self) -> bool {
        self.id < 0
    }

    /// Current decimal shape. Zero for non-Number kinds.
    pub fn decimal_shape(&self) -> DecimalShape {
        *self.shape.read()
    }

    pub fn precision(&self) -> i16 {
        self.shape.read().precision
    }

    pub fn scale(&self) -> i16 {
        self.shape.read().scale
    }

    /// Overwrites the decimal shape. Ignored for non-Number kinds.
    pub fn set_decimal_shape(&self, shape: DecimalShape) {
        if self.kind == AttributeKind::Number {
            *self.shape.write() = shape;
        }
    }
}

/// Writes the precision and scale of `value` into `descriptor`.
///
/// This is the only place a value changes its schema. It runs on every
/// successful Number assignment and on every decoded Number value, so the
/// descriptor always reflects the most recent value rather than a fixed
/// column definition. The server relies on that when it reads the value.
pub fn apply_decimal_shape(descriptor: &AttributeDescriptor, value: &Decimal) {
    descriptor.set_decimal_shape(DecimalShape {
        precision: value.precision(),
        scale: value.scale(),
    });
}

impl Clone for AttributeDescriptor {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            is_array: self.is_array,
            is_encrypted: self.is_encrypted,
            shape: RwLock::new(self.decimal_shape()),
        }
    }
}

impl PartialEq for AttributeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.kind == other.kind
            && self.is_array == other.is_array
            && self.is_encrypted == other.is_encrypted
            && self.decimal_shape() == other.decimal_shape()
    }
}
