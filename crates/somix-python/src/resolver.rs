//! Name resolution: turning a dotted call-target chain or a bare class name
//! into the `uniqueName` of a `Code` or `Grouping` entity the collector
//! actually created.
//!
//! The `self`-base fallback (resolve straight to `current_class.<rest>`
//! when `self.<first-attr>` isn't a bound instance attribute) is what makes
//! a sibling-method call like `self.helper()` resolve; it mirrors the
//! original extractor's behavior, which the compressed resolution rules
//! alone don't spell out. See DESIGN.md.

use std::collections::HashMap;

use somix_core::model::Model;
use somix_core::symbol_table::EntityRef;

/// Resolve a dotted call-target chain `base.rest[0].rest[1]...` to the
/// `uniqueName` of a `Code` entity, or `None` if it can't be resolved to
/// one that exists.
#[allow(clippy::too_many_arguments)]
pub fn resolve_called_name(
    model: &Model,
    module_uname: &str,
    current_class: Option<&str>,
    local_namespace: &HashMap<String, String>,
    variable_types: &HashMap<String, String>,
    class_variable_types: Option<&HashMap<String, String>>,
    base: &str,
    rest: &[String],
) -> Option<String> {
    if rest.is_empty() {
        let candidate = local_namespace
            .get(base)
            .cloned()
            .unwrap_or_else(|| format!("{module_uname}.{base}"));
        return lookup_code_or_retry(model, &candidate, &[]);
    }

    if base == "self" {
        let current_class = current_class?;
        let attr_key = format!("self.{}", rest[0]);
        let bound = variable_types
            .get(&attr_key)
            .or_else(|| class_variable_types.and_then(|m| m.get(&attr_key)));
        if let Some(class_uname) = bound {
            let tail = &rest[1..];
            let candidate = format!("{class_uname}.{}", tail.join("."));
            return lookup_code_or_retry(model, &candidate, tail);
        }
        let candidate = format!("{current_class}.{}", rest.join("."));
        return lookup_code_or_retry(model, &candidate, rest);
    }

    if let Some(class_uname) = variable_types.get(base) {
        let candidate = format!("{class_uname}.{}", rest.join("."));
        return lookup_code_or_retry(model, &candidate, rest);
    }

    let base_uname = local_namespace
        .get(base)
        .cloned()
        .unwrap_or_else(|| format!("{module_uname}.{base}"));
    let candidate = format!("{base_uname}.{}", rest.join("."));
    lookup_code_or_retry(model, &candidate, rest)
}

/// Look up `candidate` directly; if it names a `Grouping` instead of a
/// `Code`, retry one level deeper by appending the last element of
/// `rest_used` (a named-module/class method search).
fn lookup_code_or_retry(model: &Model, candidate: &str, rest_used: &[String]) -> Option<String> {
    match model.symbol_table.get(candidate) {
        Some(EntityRef::Code(_)) => Some(candidate.to_string()),
        Some(EntityRef::Grouping(_)) => {
            let last = rest_used.last()?;
            let retry = format!("{candidate}.{last}");
            match model.symbol_table.get(&retry) {
                Some(EntityRef::Code(_)) => Some(retry),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Resolve a bare class name referenced at a `Name(args)` call site to the
/// `uniqueName` of the `Grouping` it instantiates, trying an exact match,
/// then the import alias table, then a module-relative name.
pub fn resolve_class_name(
    model: &Model,
    module_uname: &str,
    local_namespace: &HashMap<String, String>,
    name: &str,
) -> Option<String> {
    if matches!(model.symbol_table.get(name), Some(EntityRef::Grouping(_))) {
        return Some(name.to_string());
    }
    if let Some(full) = local_namespace.get(name) {
        if matches!(model.symbol_table.get(full), Some(EntityRef::Grouping(_))) {
            return Some(full.clone());
        }
    }
    let candidate = format!("{module_uname}.{name}");
    if matches!(model.symbol_table.get(&candidate), Some(EntityRef::Grouping(_))) {
        return Some(candidate);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use somix_core::model::{Code, CodeType, Grouping, GroupingType};

    fn model_with_class_and_methods() -> Model {
        let mut model = Model::new();
        model.add_grouping(Grouping {
            id: None,
            name: "mod.py".into(),
            unique_name: "mod".into(),
            technical_type: GroupingType::PythonFile,
            link_to_editor: None,
            is_main: true,
        });
        model.add_grouping(Grouping {
            id: None,
            name: "C".into(),
            unique_name: "mod.C".into(),
            technical_type: GroupingType::Class,
            link_to_editor: None,
            is_main: true,
        });
        model.add_code(Code {
            id: None,
            name: "f".into(),
            unique_name: "mod.C.f".into(),
            technical_type: CodeType::Method,
            link_to_editor: None,
            parameters: Default::default(),
        });
        model.add_code(Code {
            id: None,
            name: "g".into(),
            unique_name: "mod.C.g".into(),
            technical_type: CodeType::Method,
            link_to_editor: None,
            parameters: Default::default(),
        });
        model
    }

    #[test]
    fn self_call_to_sibling_method_falls_back_to_current_class() {
        let model = model_with_class_and_methods();
        let empty = HashMap::new();
        let resolved = resolve_called_name(
            &model,
            "mod",
            Some("mod.C"),
            &empty,
            &empty,
            None,
            "self",
            &["g".to_string()],
        );
        assert_eq!(resolved.as_deref(), Some("mod.C.g"));
    }

    #[test]
    fn self_attribute_chain_resolves_via_bound_instance_type() {
        let model = model_with_class_and_methods();
        let empty = HashMap::new();
        let mut variable_types = HashMap::new();
        variable_types.insert("self.other".to_string(), "mod.C".to_string());
        let resolved = resolve_called_name(
            &model,
            "mod",
            Some("mod.C"),
            &empty,
            &variable_types,
            None,
            "self",
            &["other".to_string(), "g".to_string()],
        );
        assert_eq!(resolved.as_deref(), Some("mod.C.g"));
    }

    #[test]
    fn unresolvable_call_returns_none() {
        let model = model_with_class_and_methods();
        let empty = HashMap::new();
        let resolved = resolve_called_name(
            &model, "mod", Some("mod.C"), &empty, &empty, None, "self", &["missing".to_string()],
        );
        assert!(resolved.is_none());
    }

    #[test]
    fn resolve_class_name_via_module_relative_fallback() {
        let model = model_with_class_and_methods();
        let empty = HashMap::new();
        assert_eq!(
            resolve_class_name(&model, "mod", &empty, "C").as_deref(),
            Some("mod.C")
        );
    }
}
