//! Variable substitution for the `$NAME` and `${NAME}` forms.

use crate::env::Environment;
use crate::tokenizer::SyntaxError;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// `$identifier` or `${identifier}`, identifier being a letter or underscore
/// followed by word characters.
fn substitution_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$(?:([a-zA-Z_]\w*)|\{([a-zA-Z_]\w*)\})").expect("substitution pattern")
    })
}

/// Replaces variable references in a text fragment with their environment
/// values.
pub struct Expander<'a> {
    env: &'a Environment,
}

impl<'a> Expander<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }

    /// Expand every `$NAME` / `${NAME}` occurrence in `fragment`; unset
    /// variables expand to the empty string.
    ///
    /// A literal `${` left over after substitution marks a malformed brace
    /// form (`${}`, an unterminated `${`, a brace around a non-identifier)
    /// and fails with [`SyntaxError::BadSubstitution`].
    pub fn expand(&self, fragment: &str) -> Result<String, SyntaxError> {
        let expanded = substitution_pattern()
            .replace_all(fragment, |caps: &Captures<'_>| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or("");
                self.env.get(name).to_string()
            })
            .into_owned();

        if expanded.contains("${") {
            return Err(SyntaxError::BadSubstitution);
        }
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, &str)]) -> Environment {
        let mut env = Environment::new();
        for (name, value) in pairs {
            env.set(*name, *value);
        }
        env
    }

    #[test]
    fn plain_text_passes_through() {
        let env = Environment::new();
        let expander = Expander::new(&env);
        assert_eq!(expander.expand("no variables here").unwrap(), "no variables here");
        assert_eq!(expander.expand("").unwrap(), "");
    }

    #[test]
    fn expands_both_forms() {
        let env = env_with(&[("var", "Hello")]);
        let expander = Expander::new(&env);
        assert_eq!(expander.expand("$var").unwrap(), "Hello");
        assert_eq!(expander.expand("${var}").unwrap(), "Hello");
        assert_eq!(expander.expand("pre${var}post").unwrap(), "preHellopost");
        assert_eq!(expander.expand("$var,$var").unwrap(), "Hello,Hello");
    }

    #[test]
    fn unset_variables_become_empty() {
        let env = Environment::new();
        let expander = Expander::new(&env);
        assert_eq!(expander.expand("x=$missing.").unwrap(), "x=.");
    }

    #[test]
    fn dollar_without_identifier_stays_literal() {
        let env = Environment::new();
        let expander = Expander::new(&env);
        assert_eq!(expander.expand("$ alone").unwrap(), "$ alone");
        assert_eq!(expander.expand("$1").unwrap(), "$1");
    }

    #[test]
    fn leftover_brace_forms_fail() {
        let env = env_with(&[("var", "Hello")]);
        let expander = Expander::new(&env);
        for fragment in ["${", "${}", "a${}b", "${1bad}", "$var ${"] {
            assert_eq!(
                expander.expand(fragment).unwrap_err(),
                SyntaxError::BadSubstitution,
                "fragment: {fragment}"
            );
        }
    }
}
