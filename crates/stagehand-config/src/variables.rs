//! Variable interpolation for topology configurations.
//!
//! Supports variables like:
//! - `${env.VAR_NAME}` - Environment variable
//! - `${name}` - Custom variable, declared in a `vars` block or set by the caller
//!
//! Unknown variables are left in place untouched.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Variables available for interpolation.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    /// Environment variables
    pub env: HashMap<String, String>,
    /// Custom variables defined by user
    pub custom: HashMap<String, String>,
}

// Regex for matching ${...} variables
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)?)\}")
        .expect("variable pattern is valid")
});

impl VariableContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding the current process environment.
    pub fn from_env() -> Self {
        let mut ctx = Self::new();
        ctx.populate_env();
        ctx
    }

    /// Populate environment variables from the current process environment.
    pub fn populate_env(&mut self) {
        for (key, value) in std::env::vars() {
            self.env.insert(key, value);
        }
    }

    /// Add a custom variable.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.custom.insert(name.to_string(), value.into());
    }

    /// Resolve a variable name to its value.
    pub fn resolve(&self, var_name: &str) -> Option<String> {
        let parts: Vec<&str> = var_name.split('.').collect();

        match parts.as_slice() {
            ["env", name] => self.env.get(*name).cloned(),
            [name] => self.custom.get(*name).cloned(),
            _ => None,
        }
    }

    /// Interpolate all variables in a string.
    pub fn interpolate(&self, input: &str) -> String {
        VAR_REGEX
            .replace_all(input, |caps: &regex::Captures| {
                let var_name = &caps[1];
                self.resolve(var_name)
                    .unwrap_or_else(|| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// Names of variables in `input` that do not resolve, in first-seen
    /// order and without repeats.
    pub fn unresolved(&self, input: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in VAR_REGEX.captures_iter(input) {
            let name = &caps[1];
            if self.resolve(name).is_none() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

/// Builder for creating variable contexts.
#[derive(Debug, Default)]
pub struct VariableContextBuilder {
    ctx: VariableContext,
}

impl VariableContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.ctx.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.ctx.set(name, value);
        self
    }

    pub fn build(self) -> VariableContext {
        self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_variables() {
        let ctx = VariableContextBuilder::new()
            .with_env("CERT_ARN", "arn:aws:acm:cert")
            .build();

        let result = ctx.interpolate("certificate ${env.CERT_ARN}");
        assert_eq!(result, "certificate arn:aws:acm:cert");
    }

    #[test]
    fn test_custom_variables() {
        let ctx = VariableContextBuilder::new()
            .with_var("site", "marketing")
            .with_var("stage", "prod")
            .build();

        let result = ctx.interpolate("${site}-${stage}");
        assert_eq!(result, "marketing-prod");
    }

    #[test]
    fn test_unknown_variable_preserved() {
        let ctx = VariableContext::new();
        let result = ctx.interpolate("Unknown: ${unknown.var}");
        assert_eq!(result, "Unknown: ${unknown.var}");
    }

    #[test]
    fn test_unresolved_names() {
        let ctx = VariableContextBuilder::new().with_var("site", "x").build();
        let missing = ctx.unresolved("${site} ${env.MISSING} ${other} ${env.MISSING}");
        assert_eq!(missing, vec!["env.MISSING", "other"]);
    }

    #[test]
    fn test_nested_braces() {
        let ctx = VariableContextBuilder::new().with_var("id", "abc123").build();

        // Make sure we don't mess up JSON or other nested braces
        let result = ctx.interpolate(r#"{"id": "${id}"}"#);
        assert_eq!(result, r#"{"id": "abc123"}"#);
    }
}
