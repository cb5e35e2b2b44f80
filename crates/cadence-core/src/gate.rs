use crate::instance::Context;
use crate::registry::OrderedTable;
use std::fmt;

// ---------------------------------------------------------------------------
// GateValidator
// ---------------------------------------------------------------------------

/// Gate check signature: reads the instance context, answers pass/fail.
/// Predicates must not panic; a panicking predicate is a caller bug.
pub type GatePredicate = Box<dyn Fn(&Context) -> bool + Send + Sync>;

/// Stage-keyed table of gate predicates consulted before a phase transition.
/// At most one rule per stage; stages without a rule pass unconditionally.
#[derive(Default)]
pub struct GateValidator {
    rules: OrderedTable<GatePredicate>,
}

impl GateValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate for `stage`, replacing any existing rule.
    pub fn add_rule<F>(&mut self, stage: impl Into<String>, predicate: F)
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.rules.upsert(stage, Box::new(predicate));
    }

    /// Evaluate the gate for `stage`. Permissive by default: `true` when no
    /// rule is registered, otherwise exactly what the predicate returns.
    pub fn validate(&self, stage: &str, ctx: &Context) -> bool {
        match self.rules.get(stage) {
            Some(predicate) => predicate(ctx),
            None => true,
        }
    }

    pub fn has_rule(&self, stage: &str) -> bool {
        self.rules.contains(stage)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Stages with a registered rule, in registration order.
    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.rules.keys()
    }
}

impl fmt::Debug for GateValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateValidator")
            .field("stages", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx_with(key: &str, value: serde_json::Value) -> Context {
        let mut ctx = Context::new();
        ctx.insert(key.to_string(), value);
        ctx
    }

    #[test]
    fn validate_defaults_to_pass() {
        let gates = GateValidator::new();
        assert!(gates.validate("verify", &Context::new()));
        assert_eq!(gates.rule_count(), 0);
    }

    #[test]
    fn validate_returns_predicate_result() {
        let mut gates = GateValidator::new();
        gates.add_rule("verify", |ctx| ctx.contains_key("tests_passed"));

        assert!(!gates.validate("verify", &Context::new()));
        assert!(gates.validate("verify", &ctx_with("tests_passed", json!(true))));
    }

    #[test]
    fn add_rule_replaces_existing() {
        let mut gates = GateValidator::new();
        gates.add_rule("exec", |_| false);
        gates.add_rule("exec", |_| true);

        assert!(gates.validate("exec", &Context::new()));
        assert_eq!(gates.rule_count(), 1);
    }

    #[test]
    fn rules_are_per_stage() {
        let mut gates = GateValidator::new();
        gates.add_rule("verify", |_| false);

        assert!(!gates.validate("verify", &Context::new()));
        // Other stages stay permissive.
        assert!(gates.validate("exec", &Context::new()));
        assert!(gates.has_rule("verify"));
        assert!(!gates.has_rule("exec"));
    }

    #[test]
    fn predicates_can_capture_state() {
        let expected = "CAD-42".to_string();
        let mut gates = GateValidator::new();
        gates.add_rule("fix", move |ctx| {
            ctx.get("ticket").and_then(|v| v.as_str()) == Some(expected.as_str())
        });

        assert!(gates.validate("fix", &ctx_with("ticket", json!("CAD-42"))));
        assert!(!gates.validate("fix", &ctx_with("ticket", json!("CAD-7"))));
    }

    #[test]
    fn stages_in_registration_order() {
        let mut gates = GateValidator::new();
        gates.add_rule("verify", |_| true);
        gates.add_rule("exec", |_| true);
        gates.add_rule("verify", |_| false);

        let stages: Vec<&str> = gates.stages().collect();
        assert_eq!(stages, vec!["verify", "exec"]);
    }
}
