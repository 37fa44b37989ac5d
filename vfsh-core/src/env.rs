use indexmap::IndexMap;

/// The process-scoped key/value map the shell parser expands against.
/// Rewritten by the REPL context at well-defined points (after `cd`,
/// after entering/leaving a conversation) — never mutated by the parser
/// itself.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: IndexMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            vars: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn unset(&mut self, name: &str) {
        self.vars.shift_remove(name);
    }
}
