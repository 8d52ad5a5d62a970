// Evaluation Context
// The six-scope mapping consulted during identifier resolution

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Ordered string-to-JSON mapping backing each scope.
pub type Scope = serde_json::Map<String, Json>;

/// The six scope names, in declaration order.
pub const SCOPE_NAMES: [&str; 6] = ["envs", "vars", "github", "matrix", "job", "steps"];

/// Fully-populated evaluation context.
///
/// Every scope is always present (possibly empty); callers with sparse
/// input go through [`PartialContext::normalize`]. Deserializing is
/// itself normalizing: missing fields become empty scopes. The context
/// is read-only for the duration of an evaluation or render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub envs: Scope,
    #[serde(default)]
    pub vars: Scope,
    #[serde(default)]
    pub github: Scope,
    #[serde(default)]
    pub matrix: Scope,
    #[serde(default)]
    pub job: Scope,
    #[serde(default)]
    pub steps: Scope,
}

impl Context {
    /// Look up a scope by name. Returns `None` for any name outside the
    /// fixed six.
    pub fn scope(&self, name: &str) -> Option<&Scope> {
        match name {
            "envs" => Some(&self.envs),
            "vars" => Some(&self.vars),
            "github" => Some(&self.github),
            "matrix" => Some(&self.matrix),
            "job" => Some(&self.job),
            "steps" => Some(&self.steps),
            _ => None,
        }
    }

    /// Snapshot the hosting process environment as a scope, for callers
    /// seeding `envs` from the workflow runner.
    pub fn process_envs() -> Scope {
        std::env::vars()
            .map(|(k, v)| (k, Json::String(v)))
            .collect()
    }
}

/// Context as supplied by callers: any scope may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialContext {
    pub envs: Option<Scope>,
    pub vars: Option<Scope>,
    pub github: Option<Scope>,
    pub matrix: Option<Scope>,
    pub job: Option<Scope>,
    pub steps: Option<Scope>,
}

impl PartialContext {
    /// Fill every absent scope with an empty mapping.
    pub fn normalize(self) -> Context {
        Context {
            envs: self.envs.unwrap_or_default(),
            vars: self.vars.unwrap_or_default(),
            github: self.github.unwrap_or_default(),
            matrix: self.matrix.unwrap_or_default(),
            job: self.job.unwrap_or_default(),
            steps: self.steps.unwrap_or_default(),
        }
    }
}

impl From<PartialContext> for Context {
    fn from(partial: PartialContext) -> Self {
        partial.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_fills_missing_scopes() {
        let mut vars = Scope::new();
        vars.insert("name".to_string(), json!("demo"));

        let ctx = PartialContext {
            vars: Some(vars),
            ..Default::default()
        }
        .normalize();

        assert_eq!(ctx.vars.get("name"), Some(&json!("demo")));
        assert!(ctx.envs.is_empty());
        assert!(ctx.github.is_empty());
        assert!(ctx.matrix.is_empty());
        assert!(ctx.job.is_empty());
        assert!(ctx.steps.is_empty());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let ctx: Context = serde_json::from_str(r#"{"vars": {"a": 1}}"#).unwrap();

        assert_eq!(ctx.vars.get("a"), Some(&json!(1)));
        assert!(ctx.steps.is_empty());
    }

    #[test]
    fn test_scope_lookup_by_name() {
        let ctx = Context::default();

        for name in SCOPE_NAMES {
            assert!(ctx.scope(name).is_some());
        }
        assert!(ctx.scope("secrets").is_none());
        assert!(ctx.scope("ENVS").is_none());
    }

    #[test]
    fn test_process_envs_snapshot() {
        std::env::set_var("CARD_TEMPLATE_CTX_TEST", "1");

        let envs = Context::process_envs();
        assert_eq!(envs.get("CARD_TEMPLATE_CTX_TEST"), Some(&json!("1")));
    }
}
