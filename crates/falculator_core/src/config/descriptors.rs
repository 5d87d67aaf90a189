//! Property descriptors for GUI code generation.
//!
//! The desktop property grid drives its editors from a static schema
//! rather than runtime reflection: each entity lists its editable
//! properties as `(name, kind, constraints)` triples.

/// Editor kind for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Text,
    Flag,
    Money,
    Percent,
    Integer,
    Date,
    /// Closed choice rendered as a dropdown.
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub kind: PropertyKind,
    /// Human-readable constraint note, empty when unconstrained.
    pub constraints: &'static str,
}

const fn prop(name: &'static str, kind: PropertyKind, constraints: &'static str) -> PropertyDescriptor {
    PropertyDescriptor {
        name,
        kind,
        constraints,
    }
}

const ITEM_TYPES: &[&str] = &[
    "Income",
    "Expense",
    "Savings",
    "Asset",
    "Liability",
    "Loan",
    "Shares",
    "CreditCard",
];
const FREQUENCIES: &[&str] = &["Daily", "Weekly", "Fortnightly", "Monthly", "Annual"];
const MATCH_TYPES: &[&str] = &["All", "Any", "None"];
const OPERATORS: &[&str] = &[
    "Equal",
    "NotEqual",
    "GreaterThan",
    "GreaterThanOrEqual",
    "LessThan",
    "LessThanOrEqual",
];
const STATE_ACTIONS: &[&str] = &["Enable", "Disable", "Toggle"];
const TAX_MODES: &[&str] = &["NoTax", "FlatTax", "AustralianComprehensive"];
const LOG_LEVELS: &[&str] = &["Debug", "Info", "Warn", "Error"];

/// Static property schema for one entity kind.
pub trait Describe {
    fn describe() -> &'static [PropertyDescriptor];
}

impl Describe for crate::config::Config {
    fn describe() -> &'static [PropertyDescriptor] {
        const DESCRIPTORS: &[PropertyDescriptor] = &[
            prop("sim_name", PropertyKind::Text, ""),
            prop("birth_date", PropertyKind::Date, ""),
            prop("years_to_sim", PropertyKind::Integer, ">= 1"),
            prop("step_increment", PropertyKind::Choice(FREQUENCIES), ""),
            prop("start_date_is_today", PropertyKind::Flag, ""),
            prop("start_date", PropertyKind::Date, "ignored when start_date_is_today"),
            prop("tax_mode", PropertyKind::Choice(TAX_MODES), ""),
            prop("tax_percent", PropertyKind::Percent, "0 to 100"),
            prop("end_of_fy", PropertyKind::Date, ""),
            prop("log_level", PropertyKind::Choice(LOG_LEVELS), ""),
            prop("fail_on_overdraw", PropertyKind::Flag, ""),
        ];
        DESCRIPTORS
    }
}

impl Describe for crate::model::FinancialItem {
    fn describe() -> &'static [PropertyDescriptor] {
        const DESCRIPTORS: &[PropertyDescriptor] = &[
            prop("name", PropertyKind::Text, ""),
            prop("description", PropertyKind::Text, ""),
            prop("tags", PropertyKind::Text, "comma separated"),
            prop("type", PropertyKind::Choice(ITEM_TYPES), ""),
            prop("value", PropertyKind::Money, ""),
            prop("start_enabled", PropertyKind::Flag, ""),
            prop("disabled_by_user", PropertyKind::Flag, "not editable for credit cards"),
            prop("start_date", PropertyKind::Date, ""),
            prop("end_date", PropertyKind::Date, ""),
            prop("is_main_savings", PropertyKind::Flag, "exactly one item"),
            prop("is_liquid_asset", PropertyKind::Flag, ""),
            prop("eval_order", PropertyKind::Integer, "unique; main savings is 0"),
            prop("liquidate_self_on_trigger", PropertyKind::Flag, ""),
        ];
        DESCRIPTORS
    }
}

impl Describe for crate::model::AmountFreq {
    fn describe() -> &'static [PropertyDescriptor] {
        const DESCRIPTORS: &[PropertyDescriptor] = &[
            prop("enabled", PropertyKind::Flag, ""),
            prop("amount", PropertyKind::Money, "percentage when is_percentage"),
            prop("is_percentage", PropertyKind::Flag, ""),
            prop(
                "percentage_basis",
                PropertyKind::Choice(&["Source", "Destination", "SelfValue"]),
                "Destination only on events",
            ),
            prop("annual_rate_monthly_compounding", PropertyKind::Flag, ""),
        ];
        DESCRIPTORS
    }
}

impl Describe for crate::model::AmountSchedule {
    fn describe() -> &'static [PropertyDescriptor] {
        const DESCRIPTORS: &[PropertyDescriptor] = &[
            prop("frequency", PropertyKind::Choice(FREQUENCIES), ""),
            prop("day_of_week", PropertyKind::Integer, "0 = Monday"),
            prop("day_of_month", PropertyKind::Integer, "1 to 31; 31 = last day"),
            prop("month_of_year", PropertyKind::Integer, "1 to 12"),
            prop("trigger_limit", PropertyKind::Integer, "0 = unlimited"),
        ];
        DESCRIPTORS
    }
}

impl Describe for crate::model::EventItem {
    fn describe() -> &'static [PropertyDescriptor] {
        const DESCRIPTORS: &[PropertyDescriptor] = &[
            prop("name", PropertyKind::Text, ""),
            prop("enabled", PropertyKind::Flag, ""),
            prop("target_id", PropertyKind::Text, "existing item, not self"),
            prop("target_name", PropertyKind::Text, "fallback lookup"),
            prop("set_state_on_trigger", PropertyKind::Flag, ""),
            prop("target_state_action", PropertyKind::Choice(STATE_ACTIONS), ""),
            prop("liquidate", PropertyKind::Flag, "excludes cash flows"),
        ];
        DESCRIPTORS
    }
}

impl Describe for crate::model::TriggerConditions {
    fn describe() -> &'static [PropertyDescriptor] {
        const DESCRIPTORS: &[PropertyDescriptor] = &[
            prop("trigger_match_type", PropertyKind::Choice(MATCH_TYPES), ""),
            prop("trigger_match_value", PropertyKind::Flag, ""),
            prop("tag_match_type", PropertyKind::Choice(MATCH_TYPES), ""),
            prop("start_date", PropertyKind::Date, ""),
            prop("end_date", PropertyKind::Date, ""),
        ];
        DESCRIPTORS
    }
}

impl Describe for crate::model::ValueTrigger {
    fn describe() -> &'static [PropertyDescriptor] {
        const DESCRIPTORS: &[PropertyDescriptor] = &[
            prop("enabled", PropertyKind::Flag, ""),
            prop("operator", PropertyKind::Choice(OPERATORS), ""),
            prop("comparison_value", PropertyKind::Money, ""),
            prop("trigger_limit", PropertyKind::Integer, "0 = unlimited"),
        ];
        DESCRIPTORS
    }
}

impl Describe for crate::model::TagPredicate {
    fn describe() -> &'static [PropertyDescriptor] {
        const DESCRIPTORS: &[PropertyDescriptor] = &[
            prop("enabled", PropertyKind::Flag, ""),
            prop("tags", PropertyKind::Text, "must exist on some item"),
            prop("match_type", PropertyKind::Choice(MATCH_TYPES), ""),
            prop("match_value", PropertyKind::Flag, ""),
        ];
        DESCRIPTORS
    }
}
