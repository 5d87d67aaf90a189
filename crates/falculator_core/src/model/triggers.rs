//! The trigger language: value comparisons, tag-set predicates over
//! other items, and date ranges, composed under a match type.
//!
//! Evaluation is split in two phases so the simulator can read the full
//! item list immutably while deciding, then apply counter mutations:
//! [`TriggerConditions::evaluate`] returns a [`TriggerDecision`] naming
//! the value triggers that matched, and the caller feeds it back through
//! [`TriggerConditions::record_hits`] once the decision has been acted
//! on.

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::ids::ItemId;
use crate::model::item::FinancialItem;
use crate::sanitize::SanitizeReport;
use crate::serde_util::named_enum;

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum CompareOp {
        Equal = 0,
        NotEqual = 1,
        GreaterThan = 2,
        #[default]
        GreaterThanOrEqual = 3,
        LessThan = 4,
        LessThanOrEqual = 5,
    }
}

impl CompareOp {
    pub fn apply(self, value: Decimal, reference: Decimal) -> bool {
        match self {
            CompareOp::Equal => value == reference,
            CompareOp::NotEqual => value != reference,
            CompareOp::GreaterThan => value > reference,
            CompareOp::GreaterThanOrEqual => value >= reference,
            CompareOp::LessThan => value < reference,
            CompareOp::LessThanOrEqual => value <= reference,
        }
    }
}

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum MatchType {
        #[default]
        All = 0,
        Any = 1,
        None = 2,
    }
}

fn combine(match_type: MatchType, match_value: bool, results: &[bool]) -> bool {
    match match_type {
        MatchType::All => results.iter().all(|&r| r == match_value),
        MatchType::Any => results.iter().any(|&r| r == match_value),
        MatchType::None => !results.iter().any(|&r| r == match_value),
    }
}

/// One `value ⊙ k` comparison with trigger-limit accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueTrigger {
    pub enabled: bool,
    pub operator: CompareOp,
    pub comparison_value: Decimal,
    pub trigger_limit: u32,
    pub trigger_count: u32,
    pub last_trigger_date: Option<Date>,
}

impl Default for ValueTrigger {
    fn default() -> Self {
        Self {
            enabled: false,
            operator: CompareOp::default(),
            comparison_value: Decimal::ZERO,
            trigger_limit: 0,
            trigger_count: 0,
            last_trigger_date: None,
        }
    }
}

impl ValueTrigger {
    pub fn new(operator: CompareOp, comparison_value: Decimal) -> Self {
        Self {
            enabled: true,
            operator,
            comparison_value,
            ..Self::default()
        }
    }

    pub fn check(&self, value: Decimal) -> bool {
        if !self.enabled {
            return false;
        }
        if !self.operator.apply(value, self.comparison_value) {
            return false;
        }
        !(self.trigger_limit > 0 && self.trigger_count >= self.trigger_limit)
    }

    /// Called exactly once per firing, once the enclosing conditions
    /// have fired.
    pub fn record(&mut self, now: Date) {
        self.trigger_count = self.trigger_count.saturating_add(1);
        self.last_trigger_date = Some(now);
    }
}

/// A boolean condition over the set of items carrying any of the listed
/// tags: do All/Any/None of them have `enabled_by_sim == match_value`?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagPredicate {
    pub enabled: bool,
    pub tags: Vec<String>,
    pub match_type: MatchType,
    pub match_value: bool,
}

impl Default for TagPredicate {
    fn default() -> Self {
        Self {
            enabled: true,
            tags: Vec::new(),
            match_type: MatchType::All,
            match_value: true,
        }
    }
}

impl TagPredicate {
    pub fn new(tags: Vec<String>, match_type: MatchType, match_value: bool) -> Self {
        Self {
            enabled: true,
            tags,
            match_type,
            match_value,
        }
    }

    /// Evaluate against the full item list. The owner is excluded from
    /// the candidate set so an item never predicates on itself.
    pub fn evaluate(&self, items: &[FinancialItem], owner: usize) -> bool {
        if self.tags.is_empty() {
            tracing::warn!("tag predicate with empty tag list always matches");
            return true;
        }
        let candidates = items.iter().enumerate().filter(|(idx, item)| {
            *idx != owner && item.tags.iter().any(|t| self.tags.contains(t))
        });

        let mut candidate_count = 0usize;
        let mut matching = 0usize;
        for (_, item) in candidates {
            candidate_count += 1;
            if item.enabled_by_sim == self.match_value {
                matching += 1;
            }
        }

        match self.match_type {
            MatchType::All => candidate_count > 0 && matching == candidate_count,
            MatchType::Any => matching > 0,
            MatchType::None => matching == 0,
        }
    }
}

/// Which value triggers matched during an evaluation; fed back through
/// [`TriggerConditions::record_hits`] when the composite fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueTriggerHits {
    pub age: bool,
    pub liquid_assets: bool,
    pub main_savings_balance: bool,
    pub target_balance: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerDecision {
    pub fired: bool,
    pub hits: ValueTriggerHits,
}

/// Everything a trigger evaluation can see. `target_value` is `Some`
/// only when evaluating in an event context; the target-balance trigger
/// is ignored everywhere else.
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext<'a> {
    pub items: &'a [FinancialItem],
    pub owner: usize,
    pub sim_date: Date,
    pub age: i32,
    pub liquid_assets: Decimal,
    pub main_savings_balance: Decimal,
    pub target_value: Option<Decimal>,
}

/// Composite predicate gating item activation and event firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConditions {
    pub id: ItemId,
    pub trigger_match_type: MatchType,
    pub trigger_match_value: bool,
    pub tag_match_type: MatchType,
    pub age: ValueTrigger,
    pub liquid_assets: ValueTrigger,
    pub main_savings_balance: ValueTrigger,
    pub target_balance: ValueTrigger,
    pub tag_rules: Vec<TagPredicate>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,

    // Deprecated numeric bounds from the legacy format. Parse-only:
    // migrated into the operator triggers by sanitize and never written
    // back out.
    #[serde(skip_serializing, alias = "MinAge")]
    pub legacy_min_age: Option<i32>,
    #[serde(skip_serializing, alias = "MaxAge")]
    pub legacy_max_age: Option<i32>,
    #[serde(skip_serializing, alias = "MinEnabled")]
    pub legacy_min_enabled: Option<bool>,
    #[serde(skip_serializing, alias = "MinValue")]
    pub legacy_min_value: Option<Decimal>,
    #[serde(skip_serializing, alias = "MaxEnabled")]
    pub legacy_max_enabled: Option<bool>,
    #[serde(skip_serializing, alias = "MaxValue")]
    pub legacy_max_value: Option<Decimal>,
}

impl Default for TriggerConditions {
    fn default() -> Self {
        Self {
            id: ItemId::UNSET,
            trigger_match_type: MatchType::All,
            trigger_match_value: true,
            tag_match_type: MatchType::All,
            age: ValueTrigger::default(),
            liquid_assets: ValueTrigger::default(),
            main_savings_balance: ValueTrigger::default(),
            target_balance: ValueTrigger::default(),
            tag_rules: Vec::new(),
            start_date: None,
            end_date: None,
            legacy_min_age: None,
            legacy_max_age: None,
            legacy_min_enabled: None,
            legacy_min_value: None,
            legacy_max_enabled: None,
            legacy_max_value: None,
        }
    }
}

impl TriggerConditions {
    /// Whether any condition is configured. An unconstrained trigger
    /// never fires, so callers use this to tell "no opinion" apart from
    /// "evaluated false". `target_balance` only counts in an event
    /// context.
    pub fn has_any_conditions(&self, event_context: bool) -> bool {
        self.tag_rules.iter().any(|r| r.enabled)
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.age.enabled
            || self.liquid_assets.enabled
            || self.main_savings_balance.enabled
            || (event_context && self.target_balance.enabled)
    }

    /// Evaluate every configured condition, in fixed order, and combine
    /// under the trigger match type. Returns the composite decision and
    /// the value triggers that matched; no counters are mutated here.
    pub fn evaluate(&self, ctx: &TriggerContext<'_>) -> TriggerDecision {
        let mut results: Vec<bool> = Vec::new();
        let mut hits = ValueTriggerHits::default();

        let enabled_rules: Vec<bool> = self
            .tag_rules
            .iter()
            .filter(|rule| rule.enabled)
            .map(|rule| rule.evaluate(ctx.items, ctx.owner))
            .collect();
        if !enabled_rules.is_empty() {
            results.push(combine(self.tag_match_type, true, &enabled_rules));
        }

        if let Some(start) = self.start_date {
            results.push(ctx.sim_date >= start);
        }
        if let Some(end) = self.end_date {
            results.push(ctx.sim_date <= end);
        }
        if self.age.enabled {
            let ok = self.age.check(Decimal::from(ctx.age));
            hits.age = ok;
            results.push(ok);
        }
        if self.liquid_assets.enabled {
            let ok = self.liquid_assets.check(ctx.liquid_assets);
            hits.liquid_assets = ok;
            results.push(ok);
        }
        if self.main_savings_balance.enabled {
            let ok = self.main_savings_balance.check(ctx.main_savings_balance);
            hits.main_savings_balance = ok;
            results.push(ok);
        }
        if let Some(target_value) = ctx.target_value
            && self.target_balance.enabled
        {
            let ok = self.target_balance.check(target_value);
            hits.target_balance = ok;
            results.push(ok);
        }

        if results.is_empty() {
            return TriggerDecision::default();
        }

        let fired = combine(self.trigger_match_type, self.trigger_match_value, &results);
        if !fired {
            hits = ValueTriggerHits::default();
        }
        TriggerDecision { fired, hits }
    }

    /// Record the matched value triggers after a firing was acted on.
    pub fn record_hits(&mut self, hits: ValueTriggerHits, now: Date) {
        if hits.age {
            self.age.record(now);
        }
        if hits.liquid_assets {
            self.liquid_assets.record(now);
        }
        if hits.main_savings_balance {
            self.main_savings_balance.record(now);
        }
        if hits.target_balance {
            self.target_balance.record(now);
        }
    }

    /// Migrate the deprecated min/max bounds into operator triggers and
    /// erase them, then normalize the date range.
    pub fn sanitize(&mut self, owner: ItemId, report: &mut SanitizeReport) {
        if let Some(min) = self.legacy_min_age.take() {
            report.correct(owner, format!("legacy MinAge {min} migrated to age trigger"));
            self.age = ValueTrigger::new(CompareOp::GreaterThanOrEqual, Decimal::from(min));
        }
        if let Some(max) = self.legacy_max_age.take() {
            if self.age.enabled {
                report.correct(owner, "legacy MaxAge dropped; age trigger already configured");
            } else {
                report.correct(owner, format!("legacy MaxAge {max} migrated to age trigger"));
                self.age = ValueTrigger::new(CompareOp::LessThanOrEqual, Decimal::from(max));
            }
        }
        let min_value = self
            .legacy_min_enabled
            .take()
            .unwrap_or(false)
            .then(|| self.legacy_min_value)
            .flatten();
        let max_value = self
            .legacy_max_enabled
            .take()
            .unwrap_or(false)
            .then(|| self.legacy_max_value)
            .flatten();
        self.legacy_min_value = None;
        self.legacy_max_value = None;
        if let Some(min) = min_value {
            report.correct(owner, "legacy Min balance migrated to main-savings trigger");
            self.main_savings_balance = ValueTrigger::new(CompareOp::GreaterThanOrEqual, min);
        }
        if let Some(max) = max_value {
            if self.main_savings_balance.enabled {
                report.correct(owner, "legacy Max balance dropped; trigger already configured");
            } else {
                report.correct(owner, "legacy Max balance migrated to main-savings trigger");
                self.main_savings_balance = ValueTrigger::new(CompareOp::LessThanOrEqual, max);
            }
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            report.correct(owner, format!("trigger start date {start} after end date {end}"));
            self.start_date = Some(end);
        }
    }
}
