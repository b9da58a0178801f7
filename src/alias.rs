//! Alias resolution: which prefix a column of a given entity is rendered under.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Entity type name to SQL alias, for one compilation.
///
/// - entity absent: the column is rendered bare (`Freight`)
/// - empty alias: prefixed with the entity's table name (`Orders.Freight`)
/// - otherwise: prefixed with the alias (`o.Freight`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasMap {
    aliases: HashMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias (builder style). Use `""` to qualify with the bare table name.
    pub fn with(mut self, entity: impl Into<String>, alias: impl Into<String>) -> Self {
        self.insert(entity, alias);
        self
    }

    pub fn insert(&mut self, entity: impl Into<String>, alias: impl Into<String>) {
        self.aliases.insert(entity.into(), alias.into());
    }

    pub fn get(&self, entity: &str) -> Option<&str> {
        self.aliases.get(entity).map(String::as_str)
    }

    /// Prefix for a column of `entity` stored in `table`, if it must be qualified.
    pub fn qualifier<'a>(&'a self, entity: &str, table: &'a str) -> Option<&'a str> {
        match self.aliases.get(entity) {
            Some(alias) if alias.is_empty() => Some(table),
            Some(alias) => Some(alias),
            None => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }
}

impl<E: Into<String>, A: Into<String>> FromIterator<(E, A)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (E, A)>>(iter: I) -> Self {
        let mut map = AliasMap::new();
        for (entity, alias) in iter {
            map.insert(entity, alias);
        }
        map
    }
}
