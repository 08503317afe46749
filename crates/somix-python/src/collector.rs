//! Definition Collector: a single top-down pass over one file's AST that
//! creates every `Grouping`/`Code`/`Data` entity and `ParentChild` relation
//! the file defines, before any call or access is resolved.
//!
//! Entities are keyed by `uniqueName` the moment they're created, so later
//! passes over *other* files can already resolve cross-file references
//! regardless of processing order -- as long as every file has been through
//! this pass first (see `somix_python::analyze_directory`).

use std::collections::HashMap;

use indexmap::IndexMap;
use rustpython_ast::{self as ast, text_size::TextRange, Ranged};

use somix_core::model::{Code, CodeType, Data, Grouping, GroupingType, Model, ParentChild};

use crate::scope::{nearest_class, ScopeFrame};
use crate::syntax::{link_to_editor, ParsedModule};

pub fn collect_definitions(model: &mut Model, parsed: &ParsedModule) {
    let mut collector = Collector {
        model,
        path: &parsed.path,
        source: &parsed.source,
        scope: Vec::new(),
        declared: std::collections::HashSet::new(),
        local_namespace: HashMap::new(),
    };
    collector.visit_module(&parsed.module_name, &parsed.body);
}

struct Collector<'a> {
    model: &'a mut Model,
    path: &'a std::path::Path,
    source: &'a str,
    scope: Vec<ScopeFrame>,
    /// `uniqueName`s already registered as `Data`, guarding against
    /// duplicate entities when the same name is assigned more than once
    /// (invariant: `uniqueName` is globally unique).
    declared: std::collections::HashSet<String>,
    /// Import alias table. Recorded for parity with the collector's
    /// contract; name resolution itself consults the usage analyzer's own
    /// copy, rebuilt during the second pass.
    local_namespace: HashMap<String, String>,
}

impl<'a> Collector<'a> {
    fn link(&self, range: TextRange) -> Option<String> {
        Some(link_to_editor(
            self.path,
            self.source,
            usize::from(range.start()),
        ))
    }

    fn visit_module(&mut self, module_name: &str, body: &[ast::Stmt]) {
        let display_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| module_name.to_string());
        self.model.add_grouping(Grouping {
            id: None,
            name: display_name,
            unique_name: module_name.to_string(),
            technical_type: GroupingType::PythonFile,
            link_to_editor: Some(link_to_editor(self.path, self.source, 0)),
            is_main: true,
        });
        self.model.parent_child.push(ParentChild {
            parent: None,
            child: module_name.to_string(),
            is_main: true,
        });
        self.scope.push(ScopeFrame::Module(module_name.to_string()));
        self.visit_body(body);
        self.scope.pop();
    }

    fn visit_body(&mut self, body: &[ast::Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &ast::Stmt) {
        match stmt {
            ast::Stmt::Import(i) => self.visit_import(i),
            ast::Stmt::ImportFrom(i) => self.visit_import_from(i),
            ast::Stmt::ClassDef(c) => self.visit_class_def(c),
            ast::Stmt::FunctionDef(f) => {
                self.define_function(f.name.as_str(), &f.args, f.range(), &f.body)
            }
            ast::Stmt::AsyncFunctionDef(f) => {
                self.define_function(f.name.as_str(), &f.args, f.range(), &f.body)
            }
            ast::Stmt::Assign(a) => self.visit_assign(a),
            ast::Stmt::If(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::While(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::For(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::AsyncFor(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::With(s) => self.visit_body(&s.body),
            ast::Stmt::AsyncWith(s) => self.visit_body(&s.body),
            ast::Stmt::Try(s) => {
                self.visit_body(&s.body);
                for handler in &s.handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    self.visit_body(&handler.body);
                }
                self.visit_body(&s.orelse);
                self.visit_body(&s.finalbody);
            }
            _ => {}
        }
    }

    fn visit_import(&mut self, stmt: &ast::StmtImport) {
        for alias in &stmt.names {
            let local = alias
                .asname
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_else(|| alias.name.to_string());
            self.local_namespace.insert(local, alias.name.to_string());
        }
    }

    fn visit_import_from(&mut self, stmt: &ast::StmtImportFrom) {
        let module = stmt.module.as_ref().map(|m| m.to_string());
        for alias in &stmt.names {
            let local = alias
                .asname
                .as_ref()
                .map(|a| a.to_string())
                .unwrap_or_else(|| alias.name.to_string());
            let full = match &module {
                Some(m) => format!("{m}.{}", alias.name),
                None => alias.name.to_string(),
            };
            self.local_namespace.insert(local, full);
        }
    }

    fn visit_class_def(&mut self, stmt: &ast::StmtClassDef) {
        let parent_uname = self.scope.last().expect("module frame always present").uname().to_string();
        let unique_name = format!("{parent_uname}.{}", stmt.name);
        self.model.add_grouping(Grouping {
            id: None,
            name: stmt.name.to_string(),
            unique_name: unique_name.clone(),
            technical_type: GroupingType::Class,
            link_to_editor: self.link(stmt.range()),
            is_main: false,
        });
        self.model.parent_child.push(ParentChild {
            parent: Some(parent_uname),
            child: unique_name.clone(),
            is_main: true,
        });
        self.scope.push(ScopeFrame::Class(unique_name));
        self.visit_body(&stmt.body);
        self.scope.pop();
    }

    fn define_function(
        &mut self,
        name: &str,
        args: &ast::Arguments,
        range: TextRange,
        body: &[ast::Stmt],
    ) {
        let parent_frame = self.scope.last().expect("module frame always present");
        let parent_uname = parent_frame.uname().to_string();
        let is_method = matches!(parent_frame, ScopeFrame::Class(_));
        let unique_name = format!("{parent_uname}.{name}");

        let mut parameters = IndexMap::new();
        for arg in &args.args {
            parameters.insert(arg.def.arg.to_string(), None);
        }

        self.model.add_code(Code {
            id: None,
            name: name.to_string(),
            unique_name: unique_name.clone(),
            technical_type: if is_method {
                CodeType::Method
            } else {
                CodeType::Function
            },
            link_to_editor: self.link(range),
            parameters,
        });
        self.model.parent_child.push(ParentChild {
            parent: Some(parent_uname),
            child: unique_name.clone(),
            is_main: false,
        });

        self.scope.push(ScopeFrame::Function(unique_name));
        self.visit_body(body);
        self.scope.pop();
    }

    fn visit_assign(&mut self, stmt: &ast::StmtAssign) {
        for target in &stmt.targets {
            match target {
                ast::Expr::Name(name) => self.define_variable(name.id.as_str(), stmt.range()),
                ast::Expr::Attribute(attr) => {
                    if let ast::Expr::Name(base) = attr.value.as_ref() {
                        if base.id.as_str() == "self" {
                            self.define_instance_attribute(attr.attr.as_str(), stmt.range());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn define_variable(&mut self, name: &str, range: TextRange) {
        let Some(frame) = self.scope.last() else {
            return;
        };
        let parent_uname = frame.uname().to_string();
        let track_in_symbol_table = !matches!(frame, ScopeFrame::Function(_));
        let unique_name = format!("{parent_uname}.{name}");
        self.ensure_data(&unique_name, name, &parent_uname, range, track_in_symbol_table);
    }

    fn define_instance_attribute(&mut self, name: &str, range: TextRange) {
        let Some(class_uname) = nearest_class(&self.scope).map(str::to_string) else {
            return;
        };
        let unique_name = format!("{class_uname}.{name}");
        self.ensure_data(&unique_name, name, &class_uname, range, true);
    }

    /// Create a `Data` entity for `unique_name` if one hasn't already been
    /// created in this pass. Re-assigning the same self-attribute, global,
    /// or class attribute across multiple statements must not create a
    /// second entity with the same `uniqueName`.
    fn ensure_data(
        &mut self,
        unique_name: &str,
        name: &str,
        parent_uname: &str,
        range: TextRange,
        track_in_symbol_table: bool,
    ) {
        if self.declared.contains(unique_name) {
            return;
        }
        self.declared.insert(unique_name.to_string());

        let data = Data {
            id: None,
            name: name.to_string(),
            unique_name: unique_name.to_string(),
            link_to_editor: self.link(range),
        };
        if track_in_symbol_table {
            self.model.add_data_tracked(data);
        } else {
            self.model.add_data_untracked(data);
        }
        self.model.parent_child.push(ParentChild {
            parent: Some(parent_uname.to_string()),
            child: unique_name.to_string(),
            is_main: true,
        });
    }
}
