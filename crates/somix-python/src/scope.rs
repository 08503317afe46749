//! Lexical scope stack shared by the definition collector and the usage
//! analyzer.
//!
//! A class or function nested inside another extends its parent's
//! `uniqueName` rather than being flattened to the module or rejected
//! (see DESIGN.md's decision on nested-scope handling).

#[derive(Debug, Clone)]
pub enum ScopeFrame {
    Module(String),
    Class(String),
    Function(String),
}

impl ScopeFrame {
    pub fn uname(&self) -> &str {
        match self {
            ScopeFrame::Module(n) | ScopeFrame::Class(n) | ScopeFrame::Function(n) => n,
        }
    }
}

/// The nearest enclosing class, searching outward past any intervening
/// function frames. Used for `self.attr` resolution, which is meaningful
/// however deep a method body nests further function definitions.
pub fn nearest_class(stack: &[ScopeFrame]) -> Option<&str> {
    stack.iter().rev().find_map(|f| match f {
        ScopeFrame::Class(n) => Some(n.as_str()),
        _ => None,
    })
}

/// The nearest enclosing function. `Call` and `Access` records always name
/// a function as their source, so this is `None` at module or class body
/// top level.
pub fn nearest_function(stack: &[ScopeFrame]) -> Option<&str> {
    stack.iter().rev().find_map(|f| match f {
        ScopeFrame::Function(n) => Some(n.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_class_skips_intervening_function() {
        let stack = vec![
            ScopeFrame::Module("m".into()),
            ScopeFrame::Class("m.C".into()),
            ScopeFrame::Function("m.C.f".into()),
            ScopeFrame::Function("m.C.f.inner".into()),
        ];
        assert_eq!(nearest_class(&stack), Some("m.C"));
        assert_eq!(nearest_function(&stack), Some("m.C.f.inner"));
    }

    #[test]
    fn no_enclosing_function_at_module_level() {
        let stack = vec![ScopeFrame::Module("m".into())];
        assert_eq!(nearest_function(&stack), None);
        assert_eq!(nearest_class(&stack), None);
    }
}
