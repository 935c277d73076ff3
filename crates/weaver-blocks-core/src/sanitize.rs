//! Sanitizer allow-lists declared by tools.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Rule for one attribute: keep whatever value it has, or force a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeRule {
    Keep(bool),
    Force(String),
}

/// Rule for one tag: allow/deny outright, or allow with an attribute list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagRule {
    Allow(bool),
    Attributes(BTreeMap<SmolStr, AttributeRule>),
}

/// Tags (lower-case) a tool's output legitimizes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SanitizeConfig(pub BTreeMap<SmolStr, TagRule>);

impl SanitizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow a tag with no attributes.
    pub fn allow_tag(mut self, tag: &str) -> Self {
        self.0
            .insert(SmolStr::new(tag), TagRule::Attributes(BTreeMap::new()));
        self
    }

    /// Allow a tag with the given attribute rules.
    pub fn allow_tag_with(mut self, tag: &str, attributes: &[(&str, AttributeRule)]) -> Self {
        let rules = attributes
            .iter()
            .map(|(name, rule)| (SmolStr::new(name), rule.clone()))
            .collect();
        self.0.insert(SmolStr::new(tag), TagRule::Attributes(rules));
        self
    }

    pub fn allows(&self, tag: &str) -> bool {
        match self.0.get(tag) {
            Some(TagRule::Allow(allowed)) => *allowed,
            Some(TagRule::Attributes(_)) => true,
            None => false,
        }
    }

    /// Merge another config in; entries from `other` win.
    pub fn merge(mut self, other: &SanitizeConfig) -> Self {
        for (tag, rule) in &other.0 {
            self.0.insert(tag.clone(), rule.clone());
        }
        self
    }
}
