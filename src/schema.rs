//! Per-type column metadata consulted when a member access becomes a column reference.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ast::HostType;

/// Mapping of one entity member onto its SQL column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub member_name: String,
    pub column_name: String,
    /// Table name the column belongs to
    pub entity_name: String,
    pub member_type: HostType,
}

/// Lookup of column metadata by entity type name.
pub trait TypeSchema: Send + Sync {
    fn fields_of(&self, entity: &str) -> Option<&[FieldDef]>;

    /// Table name of an entity, when it differs from the type name.
    fn table_of(&self, entity: &str) -> Option<&str> {
        self.fields_of(entity)
            .and_then(|f| f.first())
            .map(|f| f.entity_name.as_str())
    }

    fn field(&self, entity: &str, member: &str) -> Option<&FieldDef> {
        self.fields_of(entity)?
            .iter()
            .find(|f| f.member_name == member)
    }
}

/// One mapped entity: its table and fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub table: String,
    pub fields: Vec<FieldDef>,
}

/// In-memory [`TypeSchema`] built by the caller or loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    entities: HashMap<String, EntityDef>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or continue) describing an entity type.
    pub fn entity(&mut self, name: impl Into<String>) -> EntityBuilder<'_> {
        let name = name.into();
        let def = self
            .entities
            .entry(name.clone())
            .or_insert_with(|| EntityDef {
                table: name,
                fields: Vec::new(),
            });
        EntityBuilder { def }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

impl TypeSchema for SchemaRegistry {
    fn fields_of(&self, entity: &str) -> Option<&[FieldDef]> {
        self.entities.get(entity).map(|e| e.fields.as_slice())
    }

    fn table_of(&self, entity: &str) -> Option<&str> {
        self.entities.get(entity).map(|e| e.table.as_str())
    }
}

/// Builder returned by [`SchemaRegistry::entity`].
pub struct EntityBuilder<'a> {
    def: &'a mut EntityDef,
}

impl EntityBuilder<'_> {
    /// Map the entity to a table name other than its type name.
    pub fn table(self, table: impl Into<String>) -> Self {
        self.def.table = table.into();
        let table = self.def.table.clone();
        for f in &mut self.def.fields {
            f.entity_name = table.clone();
        }
        self
    }

    /// A member stored in a column of the same name.
    pub fn field(self, member: impl Into<String>, ty: HostType) -> Self {
        let member = member.into();
        let column = member.clone();
        self.column(member, column, ty)
    }

    /// A member stored in a differently named column.
    pub fn column(
        self,
        member: impl Into<String>,
        column: impl Into<String>,
        ty: HostType,
    ) -> Self {
        let field = FieldDef {
            member_name: member.into(),
            column_name: column.into(),
            entity_name: self.def.table.clone(),
            member_type: ty,
        };
        match self
            .def
            .fields
            .iter_mut()
            .find(|f| f.member_name == field.member_name)
        {
            Some(existing) => *existing = field,
            None => self.def.fields.push(field),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let mut schema = SchemaRegistry::new();
        schema
            .entity("Order")
            .field("Freight", HostType::Decimal)
            .column("CustomerId", "CustomerID", HostType::String)
            .table("Orders");

        let f = schema.field("Order", "CustomerId").unwrap();
        assert_eq!(f.column_name, "CustomerID");
        assert_eq!(f.entity_name, "Orders");
        assert_eq!(schema.table_of("Order"), Some("Orders"));
        assert!(schema.field("Order", "Missing").is_none());
    }

    #[test]
    fn test_redefining_a_field_replaces_it() {
        let mut schema = SchemaRegistry::new();
        schema.entity("Orders").field("Freight", HostType::Int32);
        schema.entity("Orders").field("Freight", HostType::Decimal);
        assert_eq!(schema.fields_of("Orders").unwrap().len(), 1);
        assert_eq!(
            schema.field("Orders", "Freight").unwrap().member_type,
            HostType::Decimal
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"entities":{"Orders":{"table":"Orders","fields":[
            {"member_name":"Freight","column_name":"Freight",
             "entity_name":"Orders","member_type":"Decimal"}
        ]}}}"#;
        let schema = SchemaRegistry::from_json(json).unwrap();
        assert_eq!(schema.field("Orders", "Freight").unwrap().member_type, HostType::Decimal);
    }
}
