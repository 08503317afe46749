//! Thin wrapper around the external Python syntax provider.
//!
//! Parsing itself -- lexing, grammar, AST shape -- is delegated entirely to
//! `rustpython-parser`/`rustpython-ast`; this module only adds the two
//! things every downstream pass needs and the parser doesn't provide on its
//! own: a dotted module name derived from the file's path, and an
//! editor-link URI for a given byte offset.

use std::fs;
use std::path::{Path, PathBuf};

use rustpython_ast::{self as ast, Mod};
use rustpython_parser::{parse, Mode};
use thiserror::Error;

use somix_core::text::byte_offset_to_position_str;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Syntax { path: String, message: String },
}

/// One successfully parsed source file, carrying everything later passes
/// need: its dotted module name, the raw source (for editor links), and its
/// top-level statement list.
pub struct ParsedModule {
    pub module_name: String,
    pub path: PathBuf,
    pub source: String,
    pub body: Vec<ast::Stmt>,
}

pub fn parse_file(path: &Path, base_path: &Path) -> Result<ParsedModule, ParseError> {
    let source = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let filename = path.display().to_string();
    let parsed = parse(&source, Mode::Module, &filename).map_err(|err| ParseError::Syntax {
        path: filename,
        message: err.to_string(),
    })?;

    let body = match parsed {
        Mod::Module(module) => module.body,
        _ => Vec::new(),
    };

    Ok(ParsedModule {
        module_name: module_name_for(path, base_path),
        path: path.to_path_buf(),
        source,
        body,
    })
}

/// Derive a dotted module name from a file's path relative to the analysis
/// root: `pkg/sub/mod.py` under base path `pkg/sub` becomes `mod`; under
/// the parent of `pkg` it becomes `pkg.sub.mod`.
pub fn module_name_for(path: &Path, base_path: &Path) -> String {
    let relative = path.strip_prefix(base_path).unwrap_or(path);
    let without_ext = relative.with_extension("");
    without_ext
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(".")
}

/// Build a `vscode://file/<abs_path>/:<line>:<col>` URI for a byte offset
/// into `source`.
pub fn link_to_editor(path: &Path, source: &str, byte_offset: usize) -> String {
    let (line, col) = byte_offset_to_position_str(source, byte_offset);
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let forward_slashes = absolute.to_string_lossy().replace('\\', "/");
    format!("vscode://file/{forward_slashes}/:{line}:{col}")
}
