//! Type environments that drive name resolution, and the process-wide
//! parameter-type map the fixpoint driver reads and writes between passes.

use std::collections::HashMap;

/// The result of inferring an expression's type: the bound class
/// `uniqueName`, plus -- if the expression was a constructor call that
/// resolved to a known class with an `__init__` -- the `uniqueName` of that
/// `__init__`, so the caller can additionally emit a `Call` to it.
#[derive(Debug, Clone)]
pub struct ExprType {
    pub class_uname: String,
    pub init_call: Option<String>,
}

/// Process-wide parameter-type proposals, keyed by owning `Code`
/// `uniqueName` then by parameter name. Each pass through the usage
/// analyzer re-proposes types from call-site arguments; the fixpoint driver
/// applies the latest proposal to the model between passes and keeps
/// iterating while any proposal actually changed a parameter's type.
#[derive(Debug, Default)]
pub struct ParamTypeAssignments {
    inner: HashMap<String, HashMap<String, String>>,
}

impl ParamTypeAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn propose(&mut self, code_uname: &str, param: &str, class_uname: &str) {
        self.inner
            .entry(code_uname.to_string())
            .or_default()
            .insert(param.to_string(), class_uname.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HashMap<String, String>)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }
}
