// Expandrs Abbreviation Model
// Abbreviations, their conditional rules, and choice configurations

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::rule::{Rule, RuleError};

/// A user-defined abbreviation with its default expansion and rules.
///
/// Owned by the store; the expansion path only reads snapshots of these and
/// dispatches usage-increment requests back to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Abbreviation {
    key: String,
    expansion_default: String,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    category: String,
    #[serde(default)]
    usage_count: u64,
    #[serde(default)]
    last_used_at: Option<DateTime<Local>>,
    #[serde(default)]
    rules: Vec<Rule>,
}

fn default_enabled() -> bool {
    true
}

/// Abbreviation-level validation errors (rule errors are wrapped).
#[derive(Debug, thiserror::Error)]
pub enum AbbreviationError {
    #[error("abbreviation key is empty")]
    EmptyKey,

    #[error("rule {index}: {source}")]
    InvalidRule {
        index: usize,
        #[source]
        source: RuleError,
    },
}

impl Abbreviation {
    /// Create an enabled abbreviation with no rules.
    pub fn new(key: impl Into<String>, expansion_default: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expansion_default: expansion_default.into(),
            case_sensitive: false,
            enabled: true,
            category: String::new(),
            usage_count: 0,
            last_used_at: None,
            rules: Vec::new(),
        }
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The trigger text.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Expansion used when no rule matches.
    pub fn expansion_default(&self) -> &str {
        &self.expansion_default
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    pub fn last_used_at(&self) -> Option<DateTime<Local>> {
        self.last_used_at
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub(crate) fn rules_mut(&mut self) -> &mut [Rule] {
        &mut self.rules
    }

    /// Record one use of this abbreviation. Store-side bookkeeping.
    pub(crate) fn record_use(&mut self, at: DateTime<Local>) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.last_used_at = Some(at);
    }

    /// Validate the abbreviation and all attached rules.
    /// Called at the storage/config boundary.
    pub fn validate(&self) -> Result<(), AbbreviationError> {
        if self.key.trim().is_empty() {
            return Err(AbbreviationError::EmptyKey);
        }
        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate()
                .map_err(|source| AbbreviationError::InvalidRule { index, source })?;
        }
        Ok(())
    }
}

/// One selectable option of a choice directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub title: String,
    pub message: String,
}

/// Stored configuration referenced by `$choice(id=N)$` directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceConfig {
    id: u32,
    options: Vec<ChoiceOption>,
}

impl ChoiceConfig {
    pub fn new(id: u32, options: Vec<ChoiceOption>) -> Self {
        Self { id, options }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }
}
