//! Key renaming for JSON payloads.
//!
//! The QA Sphere API and the tool responses promised to MCP clients use
//! different field names (`comment` vs `precondition`, `steps[].description`
//! vs `steps[].action`). A [`RenameMap`] describes which keys to rename, and
//! [`transform`] applies it to a [`serde_json::Value`] tree.
//!
//! ## Rules
//!
//! - [`RenameRule::Rename`] renames the key at this level. The value is copied
//!   as-is, no rules are applied below it.
//! - [`RenameRule::Nested`] keeps the key and applies the nested map to its value.
//! - [`RenameRule::Inert`] (anything else in a JSON rule literal) leaves the key alone.
//! - Keys without a rule are copied verbatim.
//! - Arrays are transparent: every element sees the same map.
//!
//! If two keys are renamed to the same target, the one visited last wins.
//! Visiting order follows the input map's iteration order and must not be
//! relied on.
//!
//! ## Example
//!
//! ```
//! use qasphere_mcp::rename::{json_stringify, RenameMap};
//! use serde_json::json;
//!
//! let rules = RenameMap::from(json!({
//!     "comment": "precondition",
//!     "steps": { "description": "action", "expected": "expected_result" }
//! }));
//!
//! let text = json_stringify(
//!     &json!({"comment": "<p>pre</p>", "steps": [{"description": "d1", "expected": "e1"}]}),
//!     &rules,
//! );
//! let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
//! assert_eq!(parsed["precondition"], "<p>pre</p>");
//! assert_eq!(parsed["steps"][0]["action"], "d1");
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// A single rename rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameRule {
    /// Rename the key to this name.
    Rename(String),
    /// Keep the key and apply these rules to its value.
    Nested(RenameMap),
    /// A rule value that is neither a string nor an object.
    Inert,
}

/// Tree of rename rules, keyed by the original field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap {
    rules: BTreeMap<String, RenameRule>,
}

impl RenameMap {
    /// Creates an empty map (a no-op).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain rename.
    #[must_use]
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rules.insert(from.into(), RenameRule::Rename(to.into()));
        self
    }

    /// Adds nested rules for the value under `key`.
    #[must_use]
    pub fn nested(mut self, key: impl Into<String>, rules: RenameMap) -> Self {
        self.rules.insert(key.into(), RenameRule::Nested(rules));
        self
    }

    /// Looks up the rule for a key.
    pub fn get(&self, key: &str) -> Option<&RenameRule> {
        self.rules.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<&Value> for RenameRule {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(target) => RenameRule::Rename(target.clone()),
            Value::Object(_) => RenameRule::Nested(RenameMap::from(value)),
            _ => RenameRule::Inert,
        }
    }
}

impl From<&Value> for RenameMap {
    /// Builds a map from a JSON rule literal. A non-object literal yields an empty map.
    fn from(value: &Value) -> Self {
        let rules = match value {
            Value::Object(entries) => entries
                .iter()
                .map(|(key, rule)| (key.clone(), RenameRule::from(rule)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Self { rules }
    }
}

impl From<Value> for RenameMap {
    fn from(value: Value) -> Self {
        RenameMap::from(&value)
    }
}

/// Returns a copy of `value` with keys renamed according to `rules`.
///
/// Never fails and never mutates its inputs. Input must be acyclic, which any
/// value decoded from JSON is.
pub fn transform(value: &Value, rules: &RenameMap) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|item| transform(item, rules)).collect()),
        Value::Object(entries) => {
            let mut out = Map::with_capacity(entries.len());
            for (key, current) in entries {
                match rules.get(key) {
                    Some(RenameRule::Rename(target)) => {
                        out.insert(target.clone(), current.clone());
                    }
                    Some(RenameRule::Nested(nested)) => {
                        out.insert(key.clone(), transform(current, nested));
                    }
                    Some(RenameRule::Inert) | None => {
                        out.insert(key.clone(), current.clone());
                    }
                }
            }
            Value::Object(out)
        }
        scalar => scalar.clone(),
    }
}

/// Renames keys and encodes the result as compact JSON.
pub fn json_stringify(value: &Value, rules: &RenameMap) -> String {
    transform(value, rules).to_string()
}
