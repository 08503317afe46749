//! Usage Analyzer: a single pass over one file's AST that proposes
//! parameter types, resolves call targets to `Call` records, and resolves
//! attribute/name reads to `Access` records.
//!
//! One `UsageAnalyzer` is built fresh per file per fixpoint iteration, so
//! its `variable_types` and `class_variable_types` never leak across files
//! or across iterations; only the process-wide `ParamTypeAssignments` (and
//! the model itself) carry state between iterations.

use std::collections::HashMap;

use rustpython_ast::{self as ast};

use somix_core::model::{Access, Call, Model};
use somix_core::symbol_table::EntityRef;

use crate::builtins::is_builtin_ignored;
use crate::resolver::{resolve_called_name, resolve_class_name};
use crate::scope::{nearest_class, nearest_function, ScopeFrame};
use crate::syntax::ParsedModule;
use crate::type_env::{ExprType, ParamTypeAssignments};

pub fn analyze_file(
    model: &Model,
    parsed: &ParsedModule,
    param_assignments: &mut ParamTypeAssignments,
) -> (Vec<Call>, Vec<Access>) {
    let mut analyzer = UsageAnalyzer {
        model,
        module_uname: parsed.module_name.clone(),
        scope: vec![ScopeFrame::Module(parsed.module_name.clone())],
        local_namespace: HashMap::new(),
        variable_types: HashMap::new(),
        class_var_stack: Vec::new(),
        param_assignments,
        calls: Vec::new(),
        accesses: Vec::new(),
    };
    analyzer.visit_body(&parsed.body);
    (analyzer.calls, analyzer.accesses)
}

struct UsageAnalyzer<'a> {
    model: &'a Model,
    module_uname: String,
    scope: Vec<ScopeFrame>,
    local_namespace: HashMap<String, String>,
    /// Current function's local bindings, including `self.x` spellings for
    /// instance attributes assigned so far in this same method body.
    variable_types: HashMap<String, String>,
    /// One accumulated map per currently-open class, holding `self.x`
    /// bindings merged in from methods already visited in this same pass.
    class_var_stack: Vec<HashMap<String, String>>,
    param_assignments: &'a mut ParamTypeAssignments,
    calls: Vec<Call>,
    accesses: Vec<Access>,
}

impl<'a> UsageAnalyzer<'a> {
    fn current_class_vars(&self) -> Option<&HashMap<String, String>> {
        self.class_var_stack.last()
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
            ast::Stmt::FunctionDef(f) => self.visit_function_def(f.name.as_str(), &f.args, &f.body),
            ast::Stmt::AsyncFunctionDef(f) => {
                self.visit_function_def(f.name.as_str(), &f.args, &f.body)
            }
            ast::Stmt::Assign(a) => self.visit_assign(a),
            ast::Stmt::AugAssign(a) => self.visit_expr(&a.value),
            ast::Stmt::AnnAssign(a) => {
                if let Some(v) = &a.value {
                    self.visit_expr(v);
                }
            }
            ast::Stmt::Return(r) => {
                if let Some(v) = &r.value {
                    self.visit_expr(v);
                }
            }
            ast::Stmt::Expr(e) => self.visit_expr(&e.value),
            ast::Stmt::If(s) => {
                self.visit_expr(&s.test);
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::While(s) => {
                self.visit_expr(&s.test);
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::For(s) => {
                self.visit_expr(&s.iter);
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::AsyncFor(s) => {
                self.visit_expr(&s.iter);
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::With(s) => {
                for item in &s.items {
                    self.visit_expr(&item.context_expr);
                }
                self.visit_body(&s.body);
            }
            ast::Stmt::AsyncWith(s) => {
                for item in &s.items {
                    self.visit_expr(&item.context_expr);
                }
                self.visit_body(&s.body);
            }
            ast::Stmt::Try(s) => {
                self.visit_body(&s.body);
                for handler in &s.handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    self.visit_body(&handler.body);
                }
                self.visit_body(&s.orelse);
                self.visit_body(&s.finalbody);
            }
            ast::Stmt::Assert(a) => {
                self.visit_expr(&a.test);
                if let Some(m) = &a.msg {
                    self.visit_expr(m);
                }
            }
            ast::Stmt::Raise(r) => {
                if let Some(e) = &r.exc {
                    self.visit_expr(e);
                }
            }
            ast::Stmt::Delete(d) => {
                for t in &d.targets {
                    self.visit_expr(t);
                }
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
        self.scope.push(ScopeFrame::Class(unique_name));
        self.class_var_stack.push(HashMap::new());
        self.visit_body(&stmt.body);
        self.class_var_stack.pop();
        self.scope.pop();
    }

    fn visit_function_def(&mut self, name: &str, _args: &ast::Arguments, body: &[ast::Stmt]) {
        let parent_uname = self.scope.last().expect("module frame always present").uname().to_string();
        let unique_name = format!("{parent_uname}.{name}");

        let saved_vars = std::mem::take(&mut self.variable_types);
        if let Some(EntityRef::Code(idx)) = self.model.symbol_table.get(&unique_name) {
            for (param, bound_type) in &self.model.codes[idx].parameters {
                if let Some(class_uname) = bound_type {
                    self.variable_types.insert(param.clone(), class_uname.clone());
                }
            }
        }

        self.scope.push(ScopeFrame::Function(unique_name));
        self.visit_body(body);
        self.scope.pop();

        let self_entries: Vec<(String, String)> = self
            .variable_types
            .iter()
            .filter(|(k, _)| k.starts_with("self."))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(class_vars) = self.class_var_stack.last_mut() {
            for (k, v) in self_entries {
                class_vars.insert(k, v);
            }
        }

        self.variable_types = saved_vars;
    }

    fn visit_assign(&mut self, stmt: &ast::StmtAssign) {
        if nearest_function(&self.scope).is_some() {
            for target in &stmt.targets {
                if let ast::Expr::Attribute(attr) = target {
                    self.visit_attribute_access(attr);
                }
                self.bind_assignment_target(target, &stmt.value);
            }
        }
        self.visit_expr(&stmt.value);
    }

    fn bind_assignment_target(&mut self, target: &ast::Expr, value: &ast::Expr) {
        let key = match target {
            ast::Expr::Name(n) => Some(n.id.to_string()),
            ast::Expr::Attribute(attr) => match attr.value.as_ref() {
                ast::Expr::Name(base) if base.id.as_str() == "self" => {
                    Some(format!("self.{}", attr.attr))
                }
                _ => None,
            },
            _ => None,
        };
        let Some(key) = key else { return };
        let Some(inferred) = self.infer_expr_type(value) else {
            return;
        };
        self.variable_types.insert(key, inferred.class_uname.clone());
        self.emit_init_call(inferred.init_call);
    }

    fn emit_init_call(&mut self, init_call: Option<String>) {
        if let (Some(init_uname), Some(caller)) =
            (init_call, nearest_function(&self.scope).map(str::to_string))
        {
            self.calls.push(Call {
                caller,
                called: init_uname,
            });
        }
    }

    /// Infer the class type a Python expression evaluates to: either a
    /// direct constructor call `C(args)` resolved against the symbol
    /// table, or a name already bound in the current scopes.
    fn infer_expr_type(&self, expr: &ast::Expr) -> Option<ExprType> {
        match expr {
            ast::Expr::Call(call) => {
                let ast::Expr::Name(name) = call.func.as_ref() else {
                    return None;
                };
                let class_uname = resolve_class_name(
                    self.model,
                    &self.module_uname,
                    &self.local_namespace,
                    name.id.as_str(),
                )?;
                let init_uname = format!("{class_uname}.__init__");
                let init_call = matches!(
                    self.model.symbol_table.get(&init_uname),
                    Some(EntityRef::Code(_))
                )
                .then_some(init_uname);
                Some(ExprType {
                    class_uname,
                    init_call,
                })
            }
            ast::Expr::Name(n) => {
                let bound = self
                    .variable_types
                    .get(n.id.as_str())
                    .or_else(|| self.current_class_vars().and_then(|m| m.get(n.id.as_str())))?;
                Some(ExprType {
                    class_uname: bound.clone(),
                    init_call: None,
                })
            }
            ast::Expr::Attribute(attr) => {
                if let ast::Expr::Name(base) = attr.value.as_ref() {
                    if base.id.as_str() == "self" {
                        let key = format!("self.{}", attr.attr);
                        let bound = self
                            .variable_types
                            .get(&key)
                            .or_else(|| self.current_class_vars().and_then(|m| m.get(&key)))?;
                        return Some(ExprType {
                            class_uname: bound.clone(),
                            init_call: None,
                        });
                    }
                }
                None
            }
            _ => None,
        }
    }

    fn visit_expr(&mut self, expr: &ast::Expr) {
        match expr {
            ast::Expr::Call(c) => self.visit_call_expr(c),
            ast::Expr::Attribute(a) => {
                self.visit_attribute_access(a);
                self.visit_expr(a.value.as_ref());
            }
            ast::Expr::Name(n) => self.visit_name_read(n),
            ast::Expr::BinOp(b) => {
                self.visit_expr(&b.left);
                self.visit_expr(&b.right);
            }
            ast::Expr::UnaryOp(u) => self.visit_expr(&u.operand),
            ast::Expr::BoolOp(b) => {
                for v in &b.values {
                    self.visit_expr(v);
                }
            }
            ast::Expr::Compare(c) => {
                self.visit_expr(&c.left);
                for v in &c.comparators {
                    self.visit_expr(v);
                }
            }
            ast::Expr::List(l) => {
                for e in &l.elts {
                    self.visit_expr(e);
                }
            }
            ast::Expr::Tuple(t) => {
                for e in &t.elts {
                    self.visit_expr(e);
                }
            }
            ast::Expr::Set(s) => {
                for e in &s.elts {
                    self.visit_expr(e);
                }
            }
            ast::Expr::Dict(d) => {
                for k in d.keys.iter().flatten() {
                    self.visit_expr(k);
                }
                for v in &d.values {
                    self.visit_expr(v);
                }
            }
            ast::Expr::Subscript(s) => {
                self.visit_expr(&s.value);
                self.visit_expr(&s.slice);
            }
            ast::Expr::Starred(s) => self.visit_expr(&s.value),
            ast::Expr::IfExp(i) => {
                self.visit_expr(&i.test);
                self.visit_expr(&i.body);
                self.visit_expr(&i.orelse);
            }
            ast::Expr::Await(a) => self.visit_expr(&a.value),
            ast::Expr::Yield(y) => {
                if let Some(v) = &y.value {
                    self.visit_expr(v);
                }
            }
            ast::Expr::YieldFrom(y) => self.visit_expr(&y.value),
            _ => {}
        }
    }

    fn visit_call_expr(&mut self, call: &ast::ExprCall) {
        if let Some((base, rest)) = dotted_callee(call.func.as_ref()) {
            let ignored = rest.is_empty() && is_builtin_ignored(&base);
            if !ignored {
                self.resolve_and_record_call(&base, &rest, call);
            }
        }
        self.visit_expr(call.func.as_ref());
        for a in &call.args {
            self.visit_expr(a);
        }
        for kw in &call.keywords {
            self.visit_expr(&kw.value);
        }
    }

    fn resolve_and_record_call(&mut self, base: &str, rest: &[String], call: &ast::ExprCall) {
        let current_class = nearest_class(&self.scope).map(str::to_string);
        let class_vars = self.current_class_vars().cloned();
        let Some(callee_uname) = resolve_called_name(
            self.model,
            &self.module_uname,
            current_class.as_deref(),
            &self.local_namespace,
            &self.variable_types,
            class_vars.as_ref(),
            base,
            rest,
        ) else {
            return;
        };
        let Some(caller) = nearest_function(&self.scope).map(str::to_string) else {
            return;
        };

        self.calls.push(Call {
            caller: caller.clone(),
            called: callee_uname.clone(),
        });

        let Some(EntityRef::Code(idx)) = self.model.symbol_table.get(&callee_uname) else {
            return;
        };
        let param_names: Vec<String> = self.model.codes[idx].parameters.keys().cloned().collect();
        for (i, arg) in call.args.iter().enumerate() {
            let Some(param_name) = param_names.get(i) else {
                continue;
            };
            if let Some(inferred) = self.infer_expr_type(arg) {
                self.param_assignments
                    .propose(&callee_uname, param_name, &inferred.class_uname);
                self.emit_init_call(inferred.init_call);
            }
        }
    }

    fn visit_attribute_access(&mut self, attr: &ast::ExprAttribute) {
        let Some(current_function) = nearest_function(&self.scope).map(str::to_string) else {
            return;
        };
        let target_uname = match attr.value.as_ref() {
            ast::Expr::Name(n) if n.id.as_str() == "self" => {
                nearest_class(&self.scope).map(|c| format!("{c}.{}", attr.attr))
            }
            ast::Expr::Name(n) => self
                .variable_types
                .get(n.id.as_str())
                .map(|class_uname| format!("{class_uname}.{}", attr.attr)),
            _ => None,
        };
        let Some(uname) = target_uname else { return };
        if matches!(self.model.symbol_table.get(&uname), Some(EntityRef::Data(_))) {
            self.accesses.push(Access {
                accessor: current_function,
                accessed: uname,
                is_read: true,
                is_write: false,
                is_dependent: true,
            });
        }
    }

    fn visit_name_read(&mut self, n: &ast::ExprName) {
        let Some(current_function) = nearest_function(&self.scope).map(str::to_string) else {
            return;
        };
        let uname = format!("{}.{}", self.module_uname, n.id);
        if matches!(self.model.symbol_table.get(&uname), Some(EntityRef::Data(_))) {
            self.accesses.push(Access {
                accessor: current_function,
                accessed: uname,
                is_read: true,
                is_write: false,
                is_dependent: true,
            });
        }
    }
}

/// Decompose a call target expression into `(base, rest)`, e.g. `a.b.c`
/// becomes `("a", ["b", "c"])`. Returns `None` for anything other than a
/// `Name` or a chain of `Attribute`s rooted in a `Name`.
fn dotted_callee(expr: &ast::Expr) -> Option<(String, Vec<String>)> {
    fn collect(expr: &ast::Expr, acc: &mut Vec<String>) -> Option<String> {
        match expr {
            ast::Expr::Name(n) => Some(n.id.to_string()),
            ast::Expr::Attribute(a) => {
                acc.push(a.attr.to_string());
                collect(a.value.as_ref(), acc)
            }
            _ => None,
        }
    }
    let mut acc = Vec::new();
    let base = collect(expr, &mut acc)?;
    acc.reverse();
    Some((base, acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_callee_splits_attribute_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.py");
        std::fs::write(&path, "a.b.c()\n").unwrap();
        let parsed = crate::syntax::parse_file(&path, dir.path()).unwrap();
        let ast::Stmt::Expr(expr_stmt) = &parsed.body[0] else {
            panic!("expected expression statement");
        };
        let ast::Expr::Call(call) = expr_stmt.value.as_ref() else {
            panic!("expected call expression");
        };
        let (base, rest) = dotted_callee(call.func.as_ref()).unwrap();
        assert_eq!(base, "a");
        assert_eq!(rest, vec!["b".to_string(), "c".to_string()]);
    }
}
