use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A declared enum type: its name and the named integer members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<EnumMember>,
}

/// One named constant of an [`EnumType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add a member (builder style).
    pub fn member(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.push(EnumMember {
            name: name.into(),
            value,
        });
        self
    }

    /// Member name for an integer value.
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.value == value)
            .map(|m| m.name.as_str())
    }

    /// Integer value of a member name.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.members.iter().find(|m| m.name == name).map(|m| m.value)
    }
}

/// The static or runtime type of an expression node or a host value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal,
    Char,
    String,
    DateTime,
    TimeSpan,
    Guid,
    Enum(Arc<EnumType>),
    /// A mapped entity (table-backed type)
    Entity(String),
    /// Any other host object (closures, anonymous types, DTOs)
    Object(String),
    Array(Box<HostType>),
    List(Box<HostType>),
    Nullable(Box<HostType>),
    /// Type of the `null` literal
    Null,
}

impl HostType {
    pub fn entity(name: impl Into<String>) -> Self {
        HostType::Entity(name.into())
    }

    pub fn object(name: impl Into<String>) -> Self {
        HostType::Object(name.into())
    }

    pub fn list_of(elem: HostType) -> Self {
        HostType::List(Box::new(elem))
    }

    pub fn array_of(elem: HostType) -> Self {
        HostType::Array(Box::new(elem))
    }

    pub fn nullable(inner: HostType) -> Self {
        match inner {
            HostType::Nullable(_) => inner,
            other => HostType::Nullable(Box::new(other)),
        }
    }

    pub fn enumeration(ty: EnumType) -> Self {
        HostType::Enum(Arc::new(ty))
    }

    /// Strip one `Nullable` wrapper.
    pub fn underlying(&self) -> &HostType {
        match self {
            HostType::Nullable(inner) => inner,
            other => other,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.underlying(),
            HostType::Int8
                | HostType::Int16
                | HostType::Int32
                | HostType::Int64
                | HostType::UInt8
                | HostType::UInt16
                | HostType::UInt32
                | HostType::UInt64
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(
            self.underlying(),
            HostType::Float32 | HostType::Float64 | HostType::Decimal
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_floating()
    }

    /// Collections that can be probed with `Contains`. Strings are never enumerable here.
    pub fn is_enumerable(&self) -> bool {
        matches!(self.underlying(), HostType::Array(_) | HostType::List(_))
    }

    pub fn is_enum(&self) -> bool {
        self.as_enum().is_some()
    }

    pub fn as_enum(&self) -> Option<&Arc<EnumType>> {
        match self.underlying() {
            HostType::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Entity name for entity and object types.
    pub fn entity_name(&self) -> Option<&str> {
        match self.underlying() {
            HostType::Entity(name) | HostType::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Element type of an array or list.
    pub fn element_type(&self) -> Option<&HostType> {
        match self.underlying() {
            HostType::Array(e) | HostType::List(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostType::Bool => write!(f, "Boolean"),
            HostType::Int8 => write!(f, "SByte"),
            HostType::Int16 => write!(f, "Int16"),
            HostType::Int32 => write!(f, "Int32"),
            HostType::Int64 => write!(f, "Int64"),
            HostType::UInt8 => write!(f, "Byte"),
            HostType::UInt16 => write!(f, "UInt16"),
            HostType::UInt32 => write!(f, "UInt32"),
            HostType::UInt64 => write!(f, "UInt64"),
            HostType::Float32 => write!(f, "Single"),
            HostType::Float64 => write!(f, "Double"),
            HostType::Decimal => write!(f, "Decimal"),
            HostType::Char => write!(f, "Char"),
            HostType::String => write!(f, "String"),
            HostType::DateTime => write!(f, "DateTime"),
            HostType::TimeSpan => write!(f, "TimeSpan"),
            HostType::Guid => write!(f, "Guid"),
            HostType::Enum(e) => write!(f, "{}", e.name),
            HostType::Entity(name) | HostType::Object(name) => write!(f, "{}", name),
            HostType::Array(e) => write!(f, "{}[]", e),
            HostType::List(e) => write!(f, "List<{}>", e),
            HostType::Nullable(inner) => write!(f, "{}?", inner),
            HostType::Null => write!(f, "null"),
        }
    }
}
