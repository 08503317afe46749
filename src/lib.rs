//! Extracts a SOMIX structural model from a Python source tree and writes
//! it as an `.mse` file.
//!
//! `config` loads the optional key=value config file; `pipeline` wires the
//! `somix-python` analyzer to `somix-core`'s serializer and owns the output
//! filename convention. `main.rs` is the CLI entry point.

pub mod config;
pub mod pipeline;
