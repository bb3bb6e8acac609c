// Expandrs Rule Model
// Conditional expansion rules attached to abbreviations

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Opaque rule identifier, assigned by the store.
///
/// The core never invents rule ids; rules built from config carry
/// [`RuleId::UNASSIGNED`] until the store takes ownership of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u64);

impl RuleId {
    pub const UNASSIGNED: RuleId = RuleId(0);
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Boolean fold operator for combined rules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Operator {
    And,
    Or,
}

/// Matches when the local day of week is in `days` (0 = Sunday .. 6 = Saturday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOfWeek {
    pub days: BTreeSet<u8>,
}

/// Matches when the local time of day falls within the inclusive range.
///
/// When the end is earlier than the start (as minutes since midnight) the
/// range wraps past midnight: 22:00-06:00 matches 23:00 and 05:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl TimeRange {
    /// Start of the range in minutes since midnight.
    pub fn start_minutes(&self) -> u32 {
        self.start_hour as u32 * 60 + self.start_minute as u32
    }

    /// End of the range in minutes since midnight.
    pub fn end_minutes(&self) -> u32 {
        self.end_hour as u32 * 60 + self.end_minute as u32
    }

    /// True when the range crosses midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.end_minutes() < self.start_minutes()
    }
}

/// Matches when the context hostname contains any listed entry
/// (case-insensitive substring match).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMatch {
    pub domains: Vec<String>,
}

/// Matches annually on the given month/day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDate {
    pub month: u8,
    pub day: u8,
}

/// A leaf condition usable inside a combined rule.
///
/// Leaf conditions carry no expansion text or priority of their own; only
/// the parent rule does. Nesting combined conditions is not supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LeafCondition {
    DayOfWeek(DayOfWeek),
    TimeRange(TimeRange),
    Domain(DomainMatch),
    SpecialDate(SpecialDate),
}

/// One negatable operand of a combined rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCondition {
    #[serde(default)]
    pub negated: bool,
    #[serde(flatten)]
    pub condition: LeafCondition,
}

/// AND/OR fold over an ordered, non-empty list of subconditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combined {
    pub operator: Operator,
    pub conditions: Vec<SubCondition>,
}

/// Closed set of rule condition kinds.
///
/// The evaluator matches exhaustively over this enum, so adding a kind
/// forces every evaluation site to handle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RuleCondition {
    DayOfWeek(DayOfWeek),
    TimeRange(TimeRange),
    Domain(DomainMatch),
    SpecialDate(SpecialDate),
    Combined(Combined),
}

/// Name of a rule condition kind, for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum RuleKind {
    DayOfWeek,
    TimeRange,
    Domain,
    SpecialDate,
    Combined,
}

impl RuleCondition {
    /// The kind discriminant of this condition.
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleCondition::DayOfWeek(_) => RuleKind::DayOfWeek,
            RuleCondition::TimeRange(_) => RuleKind::TimeRange,
            RuleCondition::Domain(_) => RuleKind::Domain,
            RuleCondition::SpecialDate(_) => RuleKind::SpecialDate,
            RuleCondition::Combined(_) => RuleKind::Combined,
        }
    }
}

/// Maximum rule priority (inclusive).
pub const MAX_PRIORITY: u8 = 100;

/// A conditional expansion rule.
///
/// When the condition holds for the resolution context, `expansion_text`
/// replaces the abbreviation's default expansion. Among several matching
/// rules the highest priority wins; ties go to the first declared rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default = "RuleId::unassigned")]
    id: RuleId,
    pub condition: RuleCondition,
    pub expansion_text: String,
    pub priority: u8,
}

impl RuleId {
    fn unassigned() -> RuleId {
        RuleId::UNASSIGNED
    }
}

/// Validation errors raised at the storage/config boundary.
///
/// The evaluator itself never reports these; a malformed-but-typed rule
/// simply never matches.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("day of week out of range (0-6): {0}")]
    DayOutOfRange(u8),

    #[error("day set is empty")]
    EmptyDays,

    #[error("hour out of range (0-23): {0}")]
    HourOutOfRange(u8),

    #[error("minute out of range (0-59): {0}")]
    MinuteOutOfRange(u8),

    #[error("domain list is empty")]
    EmptyDomains,

    #[error("domain entry is blank")]
    BlankDomain,

    #[error("month out of range (1-12): {0}")]
    MonthOutOfRange(u8),

    #[error("day of month out of range (1-31): {0}")]
    DayOfMonthOutOfRange(u8),

    #[error("combined rule has no subconditions")]
    EmptyCombined,

    #[error("priority out of range (0-{MAX_PRIORITY}): {0}")]
    PriorityOutOfRange(u8),
}

impl Rule {
    /// Create a rule with an unassigned id.
    pub fn new(condition: RuleCondition, expansion_text: impl Into<String>, priority: u8) -> Self {
        Self {
            id: RuleId::UNASSIGNED,
            condition,
            expansion_text: expansion_text.into(),
            priority,
        }
    }

    /// The store-assigned identity of this rule.
    pub fn id(&self) -> RuleId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: RuleId) {
        self.id = id;
    }

    /// Validate field ranges. Called by the store and the config loader;
    /// never by the evaluator.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.priority > MAX_PRIORITY {
            return Err(RuleError::PriorityOutOfRange(self.priority));
        }
        validate_condition(&self.condition)
    }
}

fn validate_condition(condition: &RuleCondition) -> Result<(), RuleError> {
    match condition {
        RuleCondition::DayOfWeek(c) => validate_days(c),
        RuleCondition::TimeRange(c) => validate_time_range(c),
        RuleCondition::Domain(c) => validate_domains(c),
        RuleCondition::SpecialDate(c) => validate_special_date(c),
        RuleCondition::Combined(c) => {
            if c.conditions.is_empty() {
                return Err(RuleError::EmptyCombined);
            }
            for sub in &c.conditions {
                validate_leaf(&sub.condition)?;
            }
            Ok(())
        }
    }
}

fn validate_leaf(leaf: &LeafCondition) -> Result<(), RuleError> {
    match leaf {
        LeafCondition::DayOfWeek(c) => validate_days(c),
        LeafCondition::TimeRange(c) => validate_time_range(c),
        LeafCondition::Domain(c) => validate_domains(c),
        LeafCondition::SpecialDate(c) => validate_special_date(c),
    }
}

fn validate_days(c: &DayOfWeek) -> Result<(), RuleError> {
    if c.days.is_empty() {
        return Err(RuleError::EmptyDays);
    }
    for &day in &c.days {
        if day > 6 {
            return Err(RuleError::DayOutOfRange(day));
        }
    }
    Ok(())
}

fn validate_time_range(c: &TimeRange) -> Result<(), RuleError> {
    for hour in [c.start_hour, c.end_hour] {
        if hour > 23 {
            return Err(RuleError::HourOutOfRange(hour));
        }
    }
    for minute in [c.start_minute, c.end_minute] {
        if minute > 59 {
            return Err(RuleError::MinuteOutOfRange(minute));
        }
    }
    Ok(())
}

fn validate_domains(c: &DomainMatch) -> Result<(), RuleError> {
    if c.domains.is_empty() {
        return Err(RuleError::EmptyDomains);
    }
    if c.domains.iter().any(|d| d.trim().is_empty()) {
        return Err(RuleError::BlankDomain);
    }
    Ok(())
}

fn validate_special_date(c: &SpecialDate) -> Result<(), RuleError> {
    if c.month < 1 || c.month > 12 {
        return Err(RuleError::MonthOutOfRange(c.month));
    }
    if c.day < 1 || c.day > 31 {
        return Err(RuleError::DayOfMonthOutOfRange(c.day));
    }
    Ok(())
}
