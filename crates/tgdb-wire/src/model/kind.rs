//! Closed enumerations shared by the model and the codec.

/// Kinds of attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeKind {
    Invalid = 0,
    Boolean = 1,
    Byte = 2,
    Char = 3,
    Short = 4,
    Integer = 5,
    Long = 6,
    Float = 7,
    Double = 8,
    /// Arbitrary-precision decimal, carried as text.
    Number = 9,
    String = 10,
    Date = 11,
    Time = 12,
    TimeStamp = 13,
    /// Binary large object, possibly held server-side.
    Blob = 14,
    /// Character large object, possibly held server-side.
    Clob = 15,
}

impl AttributeKind {
    /// Every valid kind, in wire order.
    pub const ALL: [AttributeKind; 15] = [
        AttributeKind::Boolean,
        AttributeKind::Byte,
        AttributeKind::Char,
        AttributeKind::Short,
        AttributeKind::Integer,
        AttributeKind::Long,
        AttributeKind::Float,
        AttributeKind::Double,
        AttributeKind::Number,
        AttributeKind::String,
        AttributeKind::Date,
        AttributeKind::Time,
        AttributeKind::TimeStamp,
        AttributeKind::Blob,
        AttributeKind::Clob,
    ];

    /// Creates an AttributeKind from its wire representation.
    pub fn from_u8(v: u8) -> Option<AttributeKind> {
        match v {
            0 => Some(AttributeKind::Invalid),
            1 => Some(AttributeKind::Boolean),
            2 => Some(AttributeKind::Byte),
            3 => Some(AttributeKind::Char),
            4 => Some(AttributeKind::Short),
            5 => Some(AttributeKind::Integer),
            6 => Some(AttributeKind::Long),
            7 => Some(AttributeKind::Float),
            8 => Some(AttributeKind::Double),
            9 => Some(AttributeKind::Number),
            10 => Some(AttributeKind::String),
            11 => Some(AttributeKind::Date),
            12 => Some(AttributeKind::Time),
            13 => Some(AttributeKind::TimeStamp),
            14 => Some(AttributeKind::Blob),
            15 => Some(AttributeKind::Clob),
            _ => None,
        }
    }

    /// Maps a runtime type name to a kind.
    ///
    /// Accepts the kind names themselves (`"Integer"`, `"TimeStamp"`), the
    /// Rust primitive names (`"i32"`, `"f64"`, `"Vec<u8>"`) and the names the
    /// server's other clients send (`"int"`, `"float64"`, `"big.Int"`,
    /// `"time.Time"`, `"[]uint8"`). Matching ignores ASCII case.
    pub fn from_type_name(name: &str) -> Option<AttributeKind> {
        let lower = name.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "bool" | "boolean" => AttributeKind::Boolean,
            "u8" | "uint8" | "byte" => AttributeKind::Byte,
            "char" | "rune" => AttributeKind::Char,
            "i16" | "int16" | "short" => AttributeKind::Short,
            "i32" | "int" | "int32" | "integer" => AttributeKind::Integer,
            "i64" | "int64" | "long" => AttributeKind::Long,
            "f32" | "float32" | "float" => AttributeKind::Float,
            "f64" | "float64" | "double" => AttributeKind::Double,
            "big.int" | "big.float" | "decimal" | "number" => AttributeKind::Number,
            "str" | "&str" | "string" => AttributeKind::String,
            "date" => AttributeKind::Date,
            "time" => AttributeKind::Time,
            "time.time" | "timestamp" | "datetime" => AttributeKind::TimeStamp,
            "[]uint8" | "[]byte" | "vec<u8>" | "&[u8]" | "blob" => AttributeKind::Blob,
            "[]rune" | "clob" => AttributeKind::Clob,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns true for Blob and Clob.
    pub fn is_large_object(self) -> bool {
        matches!(self, AttributeKind::Blob | AttributeKind::Clob)
    }

    /// Returns true for Date, Time and TimeStamp.
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            AttributeKind::Date | AttributeKind::Time | AttributeKind::TimeStamp
        )
    }
}

/// Kinds of addressable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntityKind {
    Invalid = 0,
    Entity = 1,
    Node = 2,
    Edge = 3,
    Graph = 4,
    /// Reserved by the protocol; never constructed by this client.
    HyperEdge = 5,
}

impl EntityKind {
    /// Creates an EntityKind from its wire representation.
    pub fn from_u8(v: u8) -> Option<EntityKind> {
        match v {
            0 => Some(EntityKind::Invalid),
            1 => Some(EntityKind::Entity),
            2 => Some(EntityKind::Node),
            3 => Some(EntityKind::Edge),
            4 => Some(EntityKind::Graph),
            5 => Some(EntityKind::HyperEdge),
            _ => None,
        }
    }

    /// Returns true for the kinds this client can materialize.
    pub fn is_supported(self) -> bool {
        matches!(self, EntityKind::Node | EntityKind::Edge | EntityKind::Graph)
    }
}

/// Edge direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DirectionType {
    Undirected = 0,
    #[default]
    Directed = 1,
    Bidirectional = 2,
}

impl DirectionType {
    /// Decodes a direction byte. Anything other than 0 or 1 is bidirectional.
    pub fn from_u8(v: u8) -> DirectionType {
        match v {
            0 => DirectionType::Undirected,
            1 => DirectionType::Directed,
            _ => DirectionType::Bidirectional,
        }
    }
}

/// System object types carried in schema records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum SystemType {
    Invalid = -1,
    AttributeDescriptor = 0,
    Node = 1,
    Edge = 2,
    Index = 3,
    Principal = 4,
    Role = 5,
    Sequence = 6,
}

impl SystemType {
    /// Creates a SystemType from its wire byte.
    pub fn from_u8(v: u8) -> Option<SystemType> {
        match v as i8 {
            -1 => Some(SystemType::Invalid),
            0 => Some(SystemType::AttributeDescriptor),
            1 => Some(SystemType::Node),
            2 => Some(SystemType::Edge),
            3 => Some(SystemType::Index),
            4 => Some(SystemType::Principal),
            5 => Some(SystemType::Role),
            6 => Some(SystemType::Sequence),
            _ => None,
        }
    }

    /// Returns the wire byte.
    pub fn to_u8(self) -> u8 {
        self as i8 as u8
    }
}
