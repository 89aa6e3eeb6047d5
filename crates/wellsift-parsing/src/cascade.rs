//! Ranked rule chains.
//!
//! A cascade is an ordered list of named extraction rules for one field.
//! Rules run in order and the first one returning a value wins; exhaustion
//! yields `None`. Each rule is independently testable and the winning rule
//! is logged, which makes layout regressions diagnosable from a debug log.

type RuleFn<T> = Box<dyn Fn(&str) -> Option<T> + Send + Sync>;

struct Rule<T> {
    name: &'static str,
    apply: RuleFn<T>,
}

pub struct Cascade<T> {
    field: &'static str,
    rules: Vec<Rule<T>>,
}

impl<T> Cascade<T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            rules: Vec::new(),
        }
    }

    /// Append a rule. Rules are tried in insertion order.
    pub fn rule(
        mut self,
        name: &'static str,
        apply: impl Fn(&str) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Rule {
            name,
            apply: Box::new(apply),
        });
        self
    }

    /// Run the chain over `text`; first value wins.
    pub fn extract(&self, text: &str) -> Option<T> {
        for rule in &self.rules {
            if let Some(value) = (rule.apply)(text) {
                tracing::debug!(field = self.field, rule = rule.name, "cascade rule matched");
                return Some(value);
            }
        }
        tracing::debug!(field = self.field, "cascade exhausted");
        None
    }
}
