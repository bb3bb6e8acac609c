// Expandrs Rule Evaluator
// Predicate evaluation and winner selection among conditional rules

use chrono::{Datelike, Timelike};
use log::debug;
use smallvec::SmallVec;

use crate::abbreviation::Abbreviation;
use crate::context::ResolutionContext;
use crate::rule::{
    DayOfWeek, DomainMatch, LeafCondition, Operator, Rule, RuleCondition, SpecialDate, TimeRange,
};

/// Select the expansion text for an abbreviation under the given context.
///
/// Falls back to the default expansion when no rule matches. Among several
/// matching rules the highest priority wins; ties go to the first declared
/// rule, so selection is deterministic for a fixed rule order.
pub fn resolve_expansion<'a>(abbr: &'a Abbreviation, ctx: &ResolutionContext) -> &'a str {
    let candidates: SmallVec<[&Rule; 4]> = abbr
        .rules()
        .iter()
        .filter(|rule| condition_matches(&rule.condition, ctx))
        .collect();

    if candidates.is_empty() {
        return abbr.expansion_default();
    }

    let mut winner = candidates[0];
    for rule in &candidates[1..] {
        // strictly greater keeps the earliest rule on priority ties
        if rule.priority > winner.priority {
            winner = rule;
        }
    }

    debug!(
        "'{}': {} matching rule(s), winner {} ({}, priority {})",
        abbr.key(),
        candidates.len(),
        winner.id(),
        winner.condition.kind(),
        winner.priority
    );
    &winner.expansion_text
}

/// Evaluate a rule condition against the context.
///
/// Never errors: malformed-but-typed data (out-of-range fields, empty sets)
/// evaluates to false. The match is exhaustive over the closed kind set.
pub fn condition_matches(condition: &RuleCondition, ctx: &ResolutionContext) -> bool {
    match condition {
        RuleCondition::DayOfWeek(c) => day_of_week_matches(c, ctx),
        RuleCondition::TimeRange(c) => time_range_matches(c, ctx),
        RuleCondition::Domain(c) => domain_matches(c, ctx),
        RuleCondition::SpecialDate(c) => special_date_matches(c, ctx),
        RuleCondition::Combined(c) => {
            let mut matched = |sub: &crate::rule::SubCondition| {
                let value = leaf_matches(&sub.condition, ctx);
                if sub.negated {
                    !value
                } else {
                    value
                }
            };
            match c.operator {
                Operator::And => !c.conditions.is_empty() && c.conditions.iter().all(&mut matched),
                Operator::Or => c.conditions.iter().any(&mut matched),
            }
        }
    }
}

fn leaf_matches(leaf: &LeafCondition, ctx: &ResolutionContext) -> bool {
    match leaf {
        LeafCondition::DayOfWeek(c) => day_of_week_matches(c, ctx),
        LeafCondition::TimeRange(c) => time_range_matches(c, ctx),
        LeafCondition::Domain(c) => domain_matches(c, ctx),
        LeafCondition::SpecialDate(c) => special_date_matches(c, ctx),
    }
}

fn day_of_week_matches(c: &DayOfWeek, ctx: &ResolutionContext) -> bool {
    let today = ctx.now.weekday().num_days_from_sunday() as u8;
    c.days.contains(&today)
}

/// Inclusive on both endpoints. A range whose end precedes its start wraps
/// past midnight (22:00-06:00 matches 23:00 and 05:00, not 12:00).
fn time_range_matches(c: &TimeRange, ctx: &ResolutionContext) -> bool {
    if c.start_hour > 23 || c.end_hour > 23 || c.start_minute > 59 || c.end_minute > 59 {
        return false;
    }
    let now = ctx.now.hour() * 60 + ctx.now.minute();
    let start = c.start_minutes();
    let end = c.end_minutes();
    if start <= end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

fn domain_matches(c: &DomainMatch, ctx: &ResolutionContext) -> bool {
    let hostname = ctx.hostname.to_lowercase();
    c.domains
        .iter()
        .filter(|d| !d.trim().is_empty())
        .any(|d| hostname.contains(&d.to_lowercase()))
}

fn special_date_matches(c: &SpecialDate, ctx: &ResolutionContext) -> bool {
    ctx.now.month() == c.month as u32 && ctx.now.day() == c.day as u32
}
