//! The SOMIX entity/relation model: `Grouping`, `Code`, `Data` and the
//! `ParentChild`, `Call`, `Access` relations between them.
//!
//! `Model` owns one typed arena per entity kind plus the global
//! `SymbolTable`, and records `creation_order` so the serializer can assign
//! numeric ids deterministically (first-created, first-numbered).

use indexmap::IndexMap;

use crate::symbol_table::{EntityRef, SymbolTable};

/// Numeric identifier assigned to an entity at serialization time. `None`
/// until the serializer runs.
pub type EntityId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingType {
    PythonFile,
    Class,
}

impl GroupingType {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupingType::PythonFile => "PythonFile",
            GroupingType::Class => "class",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grouping {
    pub id: Option<EntityId>,
    pub name: String,
    pub unique_name: String,
    pub technical_type: GroupingType,
    pub link_to_editor: Option<String>,
    /// Modules and top-level classes are flagged `isMain`; this mirrors the
    /// `isMain` flag on their owning `ParentChild` record.
    pub is_main: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeType {
    Function,
    Method,
}

impl CodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeType::Function => "function",
            CodeType::Method => "method",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Code {
    pub id: Option<EntityId>,
    pub name: String,
    pub unique_name: String,
    pub technical_type: CodeType,
    pub link_to_editor: Option<String>,
    /// Declared parameter names, in declaration order, mapped to the most
    /// recently inferred class `uniqueName` (or `None` while still
    /// unknown). `IndexMap` preserves insertion order so parameter order
    /// in the `.mse` output matches the source signature.
    pub parameters: IndexMap<String, Option<String>>,
}

#[derive(Debug, Clone)]
pub struct Data {
    pub id: Option<EntityId>,
    pub name: String,
    pub unique_name: String,
    pub link_to_editor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ParentChild {
    /// `None` for the top-level module Grouping, which has no parent.
    pub parent: Option<String>,
    pub child: String,
    pub is_main: bool,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub caller: String,
    pub called: String,
}

#[derive(Debug, Clone)]
pub struct Access {
    pub accessor: String,
    pub accessed: String,
    pub is_read: bool,
    pub is_write: bool,
    pub is_dependent: bool,
}

/// The full structural model extracted from a source tree.
#[derive(Debug, Default)]
pub struct Model {
    pub groupings: Vec<Grouping>,
    pub codes: Vec<Code>,
    pub datas: Vec<Data>,
    pub symbol_table: SymbolTable,
    /// Order in which entities (of any kind) were first created; drives id
    /// assignment at serialization time.
    pub creation_order: Vec<EntityRef>,
    pub parent_child: Vec<ParentChild>,
    pub calls: Vec<Call>,
    pub accesses: Vec<Access>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_grouping(&mut self, grouping: Grouping) -> usize {
        let idx = self.groupings.len();
        self.symbol_table
            .insert(grouping.unique_name.clone(), EntityRef::Grouping(idx));
        self.creation_order.push(EntityRef::Grouping(idx));
        self.groupings.push(grouping);
        idx
    }

    pub fn add_code(&mut self, code: Code) -> usize {
        let idx = self.codes.len();
        self.symbol_table
            .insert(code.unique_name.clone(), EntityRef::Code(idx));
        self.creation_order.push(EntityRef::Code(idx));
        self.codes.push(code);
        idx
    }

    /// Register a `Data` entity that is addressable by name (instance
    /// attributes, class attributes, globals).
    pub fn add_data_tracked(&mut self, data: Data) -> usize {
        let idx = self.datas.len();
        self.symbol_table
            .insert(data.unique_name.clone(), EntityRef::Data(idx));
        self.creation_order.push(EntityRef::Data(idx));
        self.datas.push(data);
        idx
    }

    /// Register a `Data` entity that exists for serialization purposes only
    /// (function-local variables): it still gets an id and a `ParentChild`
    /// record, but it is never a valid name-resolution target.
    pub fn add_data_untracked(&mut self, data: Data) -> usize {
        let idx = self.datas.len();
        self.creation_order.push(EntityRef::Data(idx));
        self.datas.push(data);
        idx
    }
}
