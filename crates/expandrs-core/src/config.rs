// Expandrs Config Loader - TOML with Serde
// Parses abbreviation and choice definitions from TOML files

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::abbreviation::{Abbreviation, ChoiceConfig, ChoiceOption};
use crate::rule::{
    Combined, DayOfWeek, DomainMatch, LeafCondition, Operator, Rule, RuleCondition, RuleError,
    SpecialDate, SubCondition, TimeRange,
};
use crate::store::{MemoryStore, StoreError};

/// Config loader errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("abbreviation '{key}': unknown rule kind '{kind}'")]
    UnknownKind { key: String, kind: String },

    #[error("abbreviation '{key}': {kind} rule is missing field '{field}'")]
    MissingField {
        key: String,
        kind: String,
        field: &'static str,
    },

    #[error("abbreviation '{key}': unknown operator '{operator}'")]
    UnknownOperator { key: String, operator: String },

    #[error("abbreviation '{key}': nested combined conditions are not supported")]
    NestedCombined { key: String },

    #[error("abbreviation '{key}': {source}")]
    InvalidRule {
        key: String,
        #[source]
        source: RuleError,
    },

    #[error("store rejected config: {0}")]
    Store(#[from] StoreError),
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default, rename = "abbreviation")]
    abbreviations: Vec<AbbreviationToml>,

    #[serde(default, rename = "choice")]
    choices: Vec<ChoiceToml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AbbreviationToml {
    key: String,
    expansion: String,

    #[serde(default)]
    case_sensitive: bool,

    #[serde(default = "default_true")]
    enabled: bool,

    #[serde(default)]
    category: String,

    #[serde(default, rename = "rule")]
    rules: Vec<RuleToml>,
}

fn default_true() -> bool {
    true
}

/// Kind-specific condition fields; which ones are required depends on `kind`.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConditionFields {
    days: Option<Vec<u8>>,

    start_hour: Option<u8>,
    #[serde(default)]
    start_minute: Option<u8>,
    end_hour: Option<u8>,
    #[serde(default)]
    end_minute: Option<u8>,

    domains: Option<Vec<String>>,

    month: Option<u8>,
    day: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
struct RuleToml {
    kind: String,
    expansion: String,

    #[serde(default)]
    priority: u8,

    operator: Option<String>,

    #[serde(default, rename = "condition")]
    conditions: Vec<SubConditionToml>,

    #[serde(flatten)]
    fields: ConditionFields,
}

#[derive(Debug, Clone, Deserialize)]
struct SubConditionToml {
    kind: String,

    #[serde(default)]
    negated: bool,

    #[serde(flatten)]
    fields: ConditionFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChoiceToml {
    id: u32,

    #[serde(default, rename = "option")]
    options: Vec<ChoiceOptionToml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChoiceOptionToml {
    title: String,
    message: String,
}

/// Parsed and validated configuration: abbreviations plus choice configs.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    abbreviations: Vec<Abbreviation>,
    choices: Vec<ChoiceConfig>,
}

impl ConfigFile {
    /// Parse from a TOML string, validating every rule.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;

        let mut abbreviations = Vec::with_capacity(raw.abbreviations.len());
        for entry in raw.abbreviations {
            abbreviations.push(convert_abbreviation(entry)?);
        }

        let choices = raw
            .choices
            .into_iter()
            .map(|choice| {
                ChoiceConfig::new(
                    choice.id,
                    choice
                        .options
                        .into_iter()
                        .map(|o| ChoiceOption {
                            title: o.title,
                            message: o.message,
                        })
                        .collect(),
                )
            })
            .collect();

        Ok(Self {
            abbreviations,
            choices,
        })
    }

    /// Parse from a TOML file on disk.
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn abbreviations(&self) -> &[Abbreviation] {
        &self.abbreviations
    }

    pub fn choices(&self) -> &[ChoiceConfig] {
        &self.choices
    }

    /// Seed a store with this configuration.
    pub fn seed(self, store: &MemoryStore) -> Result<(), ConfigError> {
        store.seed(self.abbreviations, self.choices)?;
        Ok(())
    }
}

fn convert_abbreviation(entry: AbbreviationToml) -> Result<Abbreviation, ConfigError> {
    let key = entry.key.clone();
    let mut rules = Vec::with_capacity(entry.rules.len());
    for rule in entry.rules {
        rules.push(convert_rule(&key, rule)?);
    }

    let abbr = Abbreviation::new(entry.key, entry.expansion)
        .with_case_sensitive(entry.case_sensitive)
        .with_enabled(entry.enabled)
        .with_category(entry.category)
        .with_rules(rules);
    abbr.validate().map_err(|e| match e {
        crate::abbreviation::AbbreviationError::InvalidRule { source, .. } => {
            ConfigError::InvalidRule {
                key: key.clone(),
                source,
            }
        }
        crate::abbreviation::AbbreviationError::EmptyKey => ConfigError::TomlParse(
            "abbreviation key must not be empty".to_string(),
        ),
    })?;
    Ok(abbr)
}

fn convert_rule(key: &str, rule: RuleToml) -> Result<Rule, ConfigError> {
    let condition = if rule.kind == "combined" {
        let operator_raw = rule.operator.as_deref().ok_or(ConfigError::MissingField {
            key: key.to_string(),
            kind: "combined".to_string(),
            field: "operator",
        })?;
        let operator =
            Operator::from_str(operator_raw).map_err(|_| ConfigError::UnknownOperator {
                key: key.to_string(),
                operator: operator_raw.to_string(),
            })?;

        let mut conditions = Vec::with_capacity(rule.conditions.len());
        for sub in rule.conditions {
            if sub.kind == "combined" {
                return Err(ConfigError::NestedCombined {
                    key: key.to_string(),
                });
            }
            conditions.push(SubCondition {
                negated: sub.negated,
                condition: build_leaf(key, &sub.kind, sub.fields)?,
            });
        }
        RuleCondition::Combined(Combined {
            operator,
            conditions,
        })
    } else {
        leaf_to_condition(build_leaf(key, &rule.kind, rule.fields)?)
    };

    Ok(Rule::new(condition, rule.expansion, rule.priority))
}

fn leaf_to_condition(leaf: LeafCondition) -> RuleCondition {
    match leaf {
        LeafCondition::DayOfWeek(c) => RuleCondition::DayOfWeek(c),
        LeafCondition::TimeRange(c) => RuleCondition::TimeRange(c),
        LeafCondition::Domain(c) => RuleCondition::Domain(c),
        LeafCondition::SpecialDate(c) => RuleCondition::SpecialDate(c),
    }
}

fn build_leaf(key: &str, kind: &str, fields: ConditionFields) -> Result<LeafCondition, ConfigError> {
    let missing = |field: &'static str| ConfigError::MissingField {
        key: key.to_string(),
        kind: kind.to_string(),
        field,
    };

    match kind {
        "dayOfWeek" => {
            let days = fields.days.ok_or_else(|| missing("days"))?;
            Ok(LeafCondition::DayOfWeek(DayOfWeek {
                days: days.into_iter().collect(),
            }))
        }
        "timeRange" => Ok(LeafCondition::TimeRange(TimeRange {
            start_hour: fields.start_hour.ok_or_else(|| missing("start_hour"))?,
            start_minute: fields.start_minute.unwrap_or(0),
            end_hour: fields.end_hour.ok_or_else(|| missing("end_hour"))?,
            end_minute: fields.end_minute.unwrap_or(0),
        })),
        "domain" => Ok(LeafCondition::Domain(DomainMatch {
            domains: fields.domains.ok_or_else(|| missing("domains"))?,
        })),
        "specialDate" => Ok(LeafCondition::SpecialDate(SpecialDate {
            month: fields.month.ok_or_else(|| missing("month"))?,
            day: fields.day.ok_or_else(|| missing("day"))?,
        })),
        other => Err(ConfigError::UnknownKind {
            key: key.to_string(),
            kind: other.to_string(),
        }),
    }
}

/// Sample configuration content for a new installation.
pub fn example_config_content() -> &'static str {
    r#"# Expandrs abbreviations
# Place this file at: ~/.config/expandrs/abbreviations.toml

[[abbreviation]]
key = "addr"
expansion = "123 Main St"
category = "personal"

[[abbreviation.rule]]
kind = "domain"
expansion = "456 Office Blvd"
priority = 10
domains = ["work.example.com"]

[[abbreviation]]
key = "sig"
expansion = "Regards,\nMe"

[[abbreviation.rule]]
kind = "combined"
operator = "and"
expansion = "Best,\nMe (on the clock)"
priority = 5

[[abbreviation.rule.condition]]
kind = "dayOfWeek"
days = [1, 2, 3, 4, 5]

[[abbreviation.rule.condition]]
kind = "timeRange"
start_hour = 9
end_hour = 17

[[choice]]
id = 1

[[choice.option]]
title = "Home"
message = "123 Main St"

[[choice.option]]
title = "Office"
message = "456 Office Blvd"
"#
}
