//! Fixpoint Driver: runs the Usage Analyzer across every file, applies
//! proposed parameter types to the model, and repeats while the model is
//! still changing -- up to a hard ceiling of 5 iterations.
//!
//! `Call`/`Access` records are not accumulated across iterations: each
//! iteration's results replace the previous one's (last-pass-wins), since
//! a record resolved against a still-unknown parameter type in an early
//! iteration can become stale once that type is known.

use somix_core::model::Model;
use somix_core::symbol_table::EntityRef;

use crate::syntax::ParsedModule;
use crate::type_env::ParamTypeAssignments;
use crate::usage;

pub const MAX_ITERATIONS: u32 = 5;

#[derive(Debug, Clone, Copy)]
pub struct FixpointResult {
    pub iterations: u32,
    pub converged: bool,
}

pub fn run(model: &mut Model, modules: &[ParsedModule]) -> FixpointResult {
    let mut param_assignments = ParamTypeAssignments::new();
    let mut iterations = 0;
    let mut converged = false;

    loop {
        iterations += 1;
        let mut pass_calls = Vec::new();
        let mut pass_accesses = Vec::new();

        for parsed in modules {
            let (calls, accesses) = usage::analyze_file(model, parsed, &mut param_assignments);
            pass_calls.extend(calls);
            pass_accesses.extend(accesses);
        }

        model.calls = pass_calls;
        model.accesses = pass_accesses;

        let changed = apply_param_updates(model, &param_assignments);
        if !changed {
            converged = true;
            break;
        }
        if iterations >= MAX_ITERATIONS {
            break;
        }
    }

    FixpointResult {
        iterations,
        converged,
    }
}

fn apply_param_updates(model: &mut Model, assignments: &ParamTypeAssignments) -> bool {
    let mut changed = false;
    for (code_uname, params) in assignments.iter() {
        if let Some(EntityRef::Code(idx)) = model.symbol_table.get(code_uname) {
            let code = &mut model.codes[idx];
            for (param, class_uname) in params {
                if let Some(slot) = code.parameters.get_mut(param) {
                    if slot.as_deref() != Some(class_uname.as_str()) {
                        *slot = Some(class_uname.clone());
                        changed = true;
                    }
                }
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::collect_definitions;
    use crate::syntax::parse_file;

    fn build_modules(dir: &std::path::Path, files: &[(&str, &str)]) -> Vec<ParsedModule> {
        let mut modules = Vec::new();
        for (name, source) in files {
            std::fs::write(dir.join(name), source).unwrap();
        }
        let mut names: Vec<&str> = files.iter().map(|(n, _)| *n).collect();
        names.sort();
        for name in names {
            modules.push(parse_file(&dir.join(name), dir).unwrap());
        }
        modules
    }

    #[test]
    fn parameter_type_converges_within_iteration_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let source = "class Greeter:\n    def hello(self):\n        pass\n\ndef call_it(g):\n    g.hello()\n\ndef main():\n    greeter = Greeter()\n    call_it(greeter)\n";
        let modules = build_modules(dir.path(), &[("mod.py", source)]);

        let mut model = Model::new();
        for parsed in &modules {
            collect_definitions(&mut model, parsed);
        }

        let result = run(&mut model, &modules);
        assert!(result.iterations <= MAX_ITERATIONS);
        assert!(result.converged);

        let idx = match model.symbol_table.get("mod.call_it") {
            Some(EntityRef::Code(idx)) => idx,
            _ => panic!("call_it not collected"),
        };
        assert_eq!(
            model.codes[idx].parameters.get("g").cloned().flatten(),
            Some("mod.Greeter".to_string())
        );

        let hello_called = model
            .calls
            .iter()
            .any(|c| c.caller == "mod.call_it" && c.called == "mod.Greeter.hello");
        assert!(hello_called);
    }

    #[test]
    fn builtin_call_produces_no_call_record() {
        let dir = tempfile::tempdir().unwrap();
        let source = "def f():\n    print('hi')\n";
        let modules = build_modules(dir.path(), &[("mod.py", source)]);
        let mut model = Model::new();
        for parsed in &modules {
            collect_definitions(&mut model, parsed);
        }
        run(&mut model, &modules);
        assert!(model.calls.is_empty());
    }
}
