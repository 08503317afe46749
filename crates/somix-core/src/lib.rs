//! Core infrastructure for somix2mse.
//!
//! This crate is language-agnostic: it owns the SOMIX entity/relation model
//! (`model`), the global symbol table (`symbol_table`), identifier
//! assignment and MSE serialization (`serializer`), shared error types
//! (`error`), and byte-offset/line-column text utilities (`text`).
//!
//! Python-specific analysis (parsing, definition collection, usage
//! analysis, fixpoint driving) lives in `somix-python`.

pub mod error;
pub mod model;
pub mod serializer;
pub mod symbol_table;
pub mod text;
