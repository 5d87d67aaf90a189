//! Financial items: the entities money lives in and flows between.
//!
//! The item type is a closed sum with per-type behavior (credit cards
//! force-enable, loans self-disable at zero, shares carry unit math);
//! shared fields live on the common record.

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::date_math::add_years;
use crate::model::amount::{AmountFreq, PercentageBasis};
use crate::model::events::EventItem;
use crate::model::ids::ItemId;
use crate::model::schedule::AmountSchedule;
use crate::model::triggers::{TriggerConditions, TriggerContext, ValueTriggerHits};
use crate::sanitize::SanitizeReport;
use crate::serde_util::named_enum;

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum ItemType {
        #[default]
        Income = 0,
        Expense = 1,
        Savings = 2,
        Asset = 3,
        Liability = 4,
        Loan = 5,
        Shares = 6,
        CreditCard = 7,
    }
}

impl ItemType {
    /// Debt-shaped items: their own `cash_out` is a repayment applied
    /// against `value`, snapped so the balance never crosses zero.
    pub fn is_debt(self) -> bool {
        matches!(self, ItemType::Liability | ItemType::Loan | ItemType::CreditCard)
    }
}

/// Unitized holdings for [`ItemType::Shares`] items. The item's `value`
/// is always `unit_count * unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShareDetails {
    pub unit_count: Decimal,
    pub unit_price: Decimal,
    pub total_cost_base: Decimal,
}

/// How far the self trigger got and what it decided; computed against
/// an immutable view of the item list, applied afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfTriggerOutcome {
    /// The `enabled_by_sim` value for this tick.
    pub active: bool,
    /// Whether the configured trigger conditions actually fired (drives
    /// `liquidate_self_on_trigger` and counter recording).
    pub fired: bool,
    pub hits: ValueTriggerHits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialItem {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub value: Decimal,
    pub cash_in: AmountFreq,
    pub cash_out: AmountFreq,
    pub interest: AmountFreq,
    pub share_details: Option<ShareDetails>,
    pub events: Vec<EventItem>,
    pub self_trigger: TriggerConditions,
    pub start_enabled: bool,
    pub disabled_by_user: bool,
    pub enabled_by_sim: bool,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub is_main_savings: bool,
    pub is_liquid_asset: bool,
    pub eval_order: i32,
    pub liquidate_self_on_trigger: bool,
}

impl Default for FinancialItem {
    fn default() -> Self {
        Self {
            id: ItemId::UNSET,
            name: String::new(),
            description: String::new(),
            tags: Vec::new(),
            item_type: ItemType::Income,
            value: Decimal::ZERO,
            cash_in: AmountFreq::default(),
            cash_out: AmountFreq::default(),
            interest: AmountFreq {
                is_percentage: true,
                ..AmountFreq::default()
            },
            share_details: None,
            events: Vec::new(),
            self_trigger: TriggerConditions::default(),
            start_enabled: true,
            disabled_by_user: false,
            enabled_by_sim: false,
            start_date: None,
            end_date: None,
            is_main_savings: false,
            is_liquid_asset: false,
            eval_order: 0,
            liquidate_self_on_trigger: false,
        }
    }
}

impl FinancialItem {
    pub fn new(name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            name: name.into(),
            item_type,
            share_details: matches!(item_type, ItemType::Shares)
                .then(ShareDetails::default),
            is_liquid_asset: matches!(item_type, ItemType::Savings | ItemType::Shares),
            ..Self::default()
        }
    }

    /// The synthesized cash-flow hub used when a config has no main
    /// savings item.
    pub fn default_main_savings(today: Date) -> Self {
        Self {
            name: "Main Savings".to_string(),
            item_type: ItemType::Savings,
            is_main_savings: true,
            is_liquid_asset: true,
            start_enabled: true,
            end_date: Some(add_years(today, 95)),
            eval_order: 0,
            ..Self::default()
        }
    }

    /// Re-derive `value` from the share holdings. No-op for other types.
    pub fn resync_share_value(&mut self) {
        if let Some(details) = &self.share_details {
            self.value = details.unit_count * details.unit_price;
        }
    }

    /// Run the §self-trigger ladder for one tick. Pure; the caller
    /// applies `active` to `enabled_by_sim` and records the hits.
    pub fn self_trigger_outcome(&self, ctx: &TriggerContext<'_>) -> SelfTriggerOutcome {
        if self.disabled_by_user {
            return SelfTriggerOutcome::default();
        }
        if self.item_type == ItemType::CreditCard {
            return SelfTriggerOutcome {
                active: true,
                ..SelfTriggerOutcome::default()
            };
        }
        if self.item_type == ItemType::Loan && self.value.is_zero() {
            return SelfTriggerOutcome::default();
        }
        if self.start_date.is_some_and(|start| start > ctx.sim_date)
            || self.end_date.is_some_and(|end| end < ctx.sim_date)
        {
            return SelfTriggerOutcome::default();
        }
        if self.self_trigger.has_any_conditions(false) {
            let decision = self.self_trigger.evaluate(ctx);
            return SelfTriggerOutcome {
                active: decision.fired,
                fired: decision.fired,
                hits: decision.hits,
            };
        }
        if self.item_type == ItemType::Loan {
            return SelfTriggerOutcome {
                active: true,
                ..SelfTriggerOutcome::default()
            };
        }
        // No conditions configured: the item keeps whatever state it had
        // (seeded from start_enabled when the simulation was built).
        SelfTriggerOutcome {
            active: self.enabled_by_sim,
            ..SelfTriggerOutcome::default()
        }
    }

    /// Normalize this item and everything it owns. Cross-item passes
    /// (ids, tags, event targets, main-savings election) run at the
    /// config level.
    pub fn sanitize(&mut self, report: &mut SanitizeReport) {
        let id = self.id;

        for (freq, field) in [
            (&mut self.cash_in, "cash_in"),
            (&mut self.cash_out, "cash_out"),
            (&mut self.interest, "interest"),
        ] {
            if freq.percentage_basis == PercentageBasis::Destination {
                report.correct(id, format!("{field} basis Destination is event-only; reset to Source"));
                freq.percentage_basis = PercentageBasis::Source;
            }
        }
        if !self.interest.is_percentage {
            report.correct(id, "interest is always a percentage");
            self.interest.is_percentage = true;
        }

        match self.item_type {
            ItemType::Shares => self.sanitize_shares(report),
            ItemType::CreditCard => self.sanitize_credit_card(report),
            _ => {}
        }

        self.cash_in.sanitize(id, report);
        self.cash_out.sanitize(id, report);
        self.interest.sanitize(id, report);

        for event in &mut self.events {
            event.sanitize(report);
        }

        self.self_trigger.sanitize(id, report);

        // Case-sensitive tag dedupe, preserving first occurrence.
        let mut seen: Vec<&str> = Vec::with_capacity(self.tags.len());
        let before = self.tags.len();
        let mut deduped = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag.as_str());
                deduped.push(tag.clone());
            }
        }
        if deduped.len() != before {
            report.correct(id, "duplicate tags removed");
            self.tags = deduped;
        }
    }

    fn sanitize_shares(&mut self, report: &mut SanitizeReport) {
        let id = self.id;
        let details = self.share_details.get_or_insert_with(|| {
            report.correct(id, "shares item had no share details; defaults added");
            ShareDetails::default()
        });
        if details.unit_count < Decimal::ZERO {
            report.correct(id, "negative unit count reset to zero");
            details.unit_count = Decimal::ZERO;
        }
        if self.cash_out.enabled {
            report.correct(id, "shares have no direct cash out; disabled");
            self.cash_out.enabled = false;
        }
        if self.cash_in.enabled && !self.cash_in.is_percentage {
            report.correct(id, "shares cash in must be a percentage (dividend yield)");
            self.cash_in.is_percentage = true;
        }
        if self.disabled_by_user {
            self.value = Decimal::ZERO;
        } else {
            self.resync_share_value();
        }
    }

    fn sanitize_credit_card(&mut self, report: &mut SanitizeReport) {
        let id = self.id;
        if self.value < Decimal::ZERO {
            report.correct(id, "credit card balance cannot be negative; reset to zero");
            self.value = Decimal::ZERO;
        }
        if !self.interest.enabled {
            report.correct(id, "credit card interest re-enabled");
            self.interest.enabled = true;
        }
        if self.interest.amount < Decimal::ZERO {
            report.correct(id, "credit card interest rate cannot be negative; reset to zero");
            self.interest.amount = Decimal::ZERO;
        }
        if !self.interest.is_percentage || !self.interest.annual_rate_monthly_compounding {
            report.correct(id, "credit card interest forced to annual rate, monthly compounding");
            self.interest.is_percentage = true;
            self.interest.annual_rate_monthly_compounding = true;
        }
        let mandated = AmountSchedule::monthly_compounding();
        if self.interest.schedule != mandated {
            report.correct(id, "credit card interest schedule reset to monthly, last day");
            self.interest.schedule = mandated;
        }
        if self.disabled_by_user {
            report.correct(id, "credit cards cannot be disabled by the user");
            self.disabled_by_user = false;
        }
        if !self.start_enabled {
            report.correct(id, "credit cards always start enabled");
            self.start_enabled = true;
        }
        if self.is_liquid_asset {
            report.correct(id, "a credit card is not a liquid asset");
            self.is_liquid_asset = false;
        }
        if self.self_trigger.has_any_conditions(true) {
            report.correct(id, "credit cards ignore self triggers; conditions cleared");
            self.self_trigger = TriggerConditions {
                id: self.self_trigger.id,
                ..TriggerConditions::default()
            };
        }
    }
}
