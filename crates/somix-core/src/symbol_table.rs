//! Flat mapping from a fully-qualified `uniqueName` to the entity that owns
//! it.
//!
//! Every `Grouping`, `Code`, and `Data` entity that the definition collector
//! creates is registered here under its `uniqueName` the moment it is
//! created, so later resolution never has to search the model's arenas
//! directly. Local (function-scoped) variables are the one entity kind that
//! is *not* registered: they are not addressable from outside their owning
//! function, so they never need to be looked up by name.

use std::collections::HashMap;

/// Index into one of `Model`'s typed arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Grouping(usize),
    Code(usize),
    Data(usize),
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<String, EntityRef>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unique_name: impl Into<String>, entity: EntityRef) {
        self.entries.insert(unique_name.into(), entity);
    }

    pub fn get(&self, unique_name: &str) -> Option<EntityRef> {
        self.entries.get(unique_name).copied()
    }

    pub fn contains(&self, unique_name: &str) -> bool {
        self.entries.contains_key(unique_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
