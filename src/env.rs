use std::collections::HashMap;

/// Interpreter-local variable store.
///
/// Holds the `name=value` bindings created by declaration runs. Lookup never
/// fails: a variable that was never set reads as the empty string, which is
/// exactly what the expander substitutes for it. The store lives for the
/// whole session and is emptied when the exit command fires.
///
/// The environment is plain owned state passed by reference into the
/// tokenizer and executor, so tests can run with independent instances.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `name`, or `""` if it was never set.
    pub fn get(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or("")
    }

    /// Set or overwrite a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Drop every binding.
    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_reads_as_empty_string() {
        let env = Environment::new();
        assert_eq!(env.get("SOME_RANDOM_VAR_12345"), "");
    }

    #[test]
    fn set_then_get() {
        let mut env = Environment::new();
        env.set("KEY", "VALUE");
        assert_eq!(env.get("KEY"), "VALUE");

        env.set("KEY", "OTHER");
        assert_eq!(env.get("KEY"), "OTHER");
    }

    #[test]
    fn clear_drops_everything() {
        let mut env = Environment::new();
        env.set("a", "1");
        env.set("b", "2");
        env.clear();
        assert!(env.is_empty());
        assert_eq!(env.get("a"), "");
    }
}
