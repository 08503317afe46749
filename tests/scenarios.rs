//! End-to-end tests for the six scenarios and the quantified invariants.

use std::fs;

use somix_core::model::Model;
use somix_core::serializer::{assign_ids, write_mse};
use somix_python::analyze_directory;

fn write_py(dir: &std::path::Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn has_call(model: &Model, caller: &str, called: &str) -> bool {
    model
        .calls
        .iter()
        .any(|c| c.caller == caller && c.called == called)
}

fn has_access(model: &Model, accessor: &str, accessed: &str, is_read: bool, is_write: bool) -> bool {
    model.accesses.iter().any(|a| {
        a.accessor == accessor
            && a.accessed == accessed
            && a.is_read == is_read
            && a.is_write == is_write
    })
}

fn has_parent_child(model: &Model, parent: &str, child: &str) -> bool {
    model
        .parent_child
        .iter()
        .any(|pc| pc.parent.as_deref() == Some(parent) && pc.child == child)
}

// Scenario A: single class, method calls sibling.
#[test]
fn scenario_a_sibling_method_call() {
    let dir = tempfile::tempdir().unwrap();
    write_py(
        dir.path(),
        "m.py",
        "class C:\n    def f(self): self.g()\n    def g(self): pass\n",
    );

    let outcome = analyze_directory(dir.path()).unwrap();
    let model = &outcome.model;

    assert!(model.symbol_table.contains("m"));
    assert!(model.symbol_table.contains("m.C"));
    assert!(model.symbol_table.contains("m.C.f"));
    assert!(model.symbol_table.contains("m.C.g"));
    assert!(has_parent_child(model, "m", "m.C"));
    assert!(has_parent_child(model, "m.C", "m.C.f"));
    assert!(has_parent_child(model, "m.C", "m.C.g"));
    assert!(has_call(model, "m.C.f", "m.C.g"));
}

// Scenario B: cross-file import and call, no __init__ defined.
#[test]
fn scenario_b_cross_file_call_via_assignment_inference() {
    let dir = tempfile::tempdir().unwrap();
    write_py(dir.path(), "a.py", "class K:\n    def m(self): pass\n");
    write_py(
        dir.path(),
        "b.py",
        "from a import K\ndef h():\n    x = K()\n    x.m()\n",
    );

    let outcome = analyze_directory(dir.path()).unwrap();
    let model = &outcome.model;

    assert!(has_call(model, "b.h", "a.K.m"));
    assert!(!has_call(model, "b.h", "a.K.__init__"));
}

// Scenario C: instance attribute access.
#[test]
fn scenario_c_instance_attribute_access() {
    let dir = tempfile::tempdir().unwrap();
    write_py(
        dir.path(),
        "p.py",
        "class C:\n    def __init__(self): self.x = 0\n    def r(self): return self.x\n",
    );

    let outcome = analyze_directory(dir.path()).unwrap();
    let model = &outcome.model;

    assert!(model.symbol_table.contains("p.C.x"));
    assert!(has_parent_child(model, "p.C", "p.C.x"));
    assert!(has_access(model, "p.C.r", "p.C.x", true, false));
    assert!(has_access(model, "p.C.__init__", "p.C.x", true, false));
}

// Scenario D: parameter-type inference via fixpoint.
#[test]
fn scenario_d_parameter_type_inference_via_fixpoint() {
    let dir = tempfile::tempdir().unwrap();
    write_py(
        dir.path(),
        "q.py",
        "class K:\n    def m(self): pass\ndef f(obj): obj.m()\ndef g(): f(K())\n",
    );

    let outcome = analyze_directory(dir.path()).unwrap();
    let model = &outcome.model;

    assert!(outcome.iterations >= 2);
    assert!(outcome.iterations <= 5);
    assert!(has_call(model, "q.g", "q.f"));
    assert!(has_call(model, "q.f", "q.K.m"));
}

// Scenario E: global variable read.
#[test]
fn scenario_e_global_variable_read() {
    let dir = tempfile::tempdir().unwrap();
    write_py(dir.path(), "r.py", "N = 10\ndef f(): return N\n");

    let outcome = analyze_directory(dir.path()).unwrap();
    let model = &outcome.model;

    assert!(model.symbol_table.contains("r.N"));
    assert!(has_access(model, "r.f", "r.N", true, false));
}

// Scenario F: built-ins ignored.
#[test]
fn scenario_f_builtins_produce_no_calls() {
    let dir = tempfile::tempdir().unwrap();
    write_py(dir.path(), "s.py", "def f(): print(len(\"x\"))\n");

    let outcome = analyze_directory(dir.path()).unwrap();
    assert!(outcome.model.calls.is_empty());
}

// Invariant: fixpoint terminates within the hard ceiling.
#[test]
fn invariant_fixpoint_terminates_within_ceiling() {
    let dir = tempfile::tempdir().unwrap();
    write_py(
        dir.path(),
        "q.py",
        "class K:\n    def m(self): pass\ndef f(obj): obj.m()\ndef g(): f(K())\n",
    );
    let outcome = analyze_directory(dir.path()).unwrap();
    assert!(outcome.iterations <= 5);
}

// Invariant: dangling relation references are dropped at serialization, not recorded as errors.
#[test]
fn invariant_dangling_references_are_dropped_at_serialization() {
    let mut model = Model::new();
    model.calls.push(somix_core::model::Call {
        caller: "ghost.caller".to_string(),
        called: "ghost.called".to_string(),
    });

    let id_map = assign_ids(&mut model);
    let mut out = Vec::new();
    write_mse(&model, &id_map, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(!text.contains("SOMIX.Call"));
}

// Invariant: running the extractor twice on the same input yields the same structural
// model modulo ids (determinism).
#[test]
fn invariant_determinism_across_repeated_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_py(
        dir.path(),
        "m.py",
        "class C:\n    def f(self): self.g()\n    def g(self): pass\n",
    );

    let first = analyze_directory(dir.path()).unwrap();
    let second = analyze_directory(dir.path()).unwrap();

    let mut first_calls: Vec<_> = first
        .model
        .calls
        .iter()
        .map(|c| (c.caller.clone(), c.called.clone()))
        .collect();
    let mut second_calls: Vec<_> = second
        .model
        .calls
        .iter()
        .map(|c| (c.caller.clone(), c.called.clone()))
        .collect();
    first_calls.sort();
    second_calls.sort();

    assert_eq!(first_calls, second_calls);
    assert_eq!(first.model.groupings.len(), second.model.groupings.len());
    assert_eq!(first.model.codes.len(), second.model.codes.len());
    assert_eq!(first.model.datas.len(), second.model.datas.len());
}

// Invariant: parameter declaration order is preserved in the serialized Code parameters.
#[test]
fn invariant_parameter_order_preserved() {
    let dir = tempfile::tempdir().unwrap();
    write_py(dir.path(), "t.py", "def f(a, b, c): pass\n");

    let outcome = analyze_directory(dir.path()).unwrap();
    let code = outcome
        .model
        .codes
        .iter()
        .find(|c| c.unique_name == "t.f")
        .unwrap();
    let names: Vec<_> = code.parameters.keys().cloned().collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
}
