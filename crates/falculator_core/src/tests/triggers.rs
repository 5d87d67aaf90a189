//! Tests for the trigger language
//!
//! Value comparisons with limit accounting, tag predicates over the
//! item list, and the composite conditions that gate item and event
//! activation.

use jiff::civil::date;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::{
    CompareOp, FinancialItem, ItemType, MatchType, TagPredicate, TriggerConditions,
    TriggerContext, ValueTrigger,
};

fn tagged(name: &str, tags: &[&str], enabled: bool) -> FinancialItem {
    FinancialItem {
        tags: tags.iter().map(|t| t.to_string()).collect(),
        enabled_by_sim: enabled,
        ..FinancialItem::new(name, ItemType::Asset)
    }
}

fn ctx<'a>(items: &'a [FinancialItem], owner: usize) -> TriggerContext<'a> {
    TriggerContext {
        items,
        owner,
        sim_date: date(2026, 6, 15),
        age: 45,
        liquid_assets: dec!(20000),
        main_savings_balance: dec!(5000),
        target_value: None,
    }
}

#[test]
fn test_compare_ops() {
    let cases = [
        (CompareOp::Equal, dec!(5), dec!(5), true),
        (CompareOp::Equal, dec!(5), dec!(6), false),
        (CompareOp::NotEqual, dec!(5), dec!(6), true),
        (CompareOp::GreaterThan, dec!(6), dec!(5), true),
        (CompareOp::GreaterThan, dec!(5), dec!(5), false),
        (CompareOp::GreaterThanOrEqual, dec!(5), dec!(5), true),
        (CompareOp::LessThan, dec!(4), dec!(5), true),
        (CompareOp::LessThanOrEqual, dec!(5), dec!(5), true),
        (CompareOp::LessThanOrEqual, dec!(6), dec!(5), false),
    ];
    for (op, value, reference, expected) in cases {
        assert_eq!(
            op.apply(value, reference),
            expected,
            "{value} {op} {reference}"
        );
    }
}

#[test]
fn test_value_trigger_disabled_never_checks() {
    let trigger = ValueTrigger {
        enabled: false,
        ..ValueTrigger::new(CompareOp::GreaterThan, dec!(0))
    };
    assert!(!trigger.check(dec!(100)));
}

#[test]
fn test_value_trigger_limit_is_honored() {
    let mut trigger = ValueTrigger {
        trigger_limit: 2,
        ..ValueTrigger::new(CompareOp::GreaterThanOrEqual, dec!(10))
    };

    assert!(trigger.check(dec!(10)));
    trigger.record(date(2026, 1, 1));
    assert!(trigger.check(dec!(10)));
    trigger.record(date(2026, 2, 1));

    assert!(!trigger.check(dec!(10)), "limit of 2 must stop the third fire");
    assert_eq!(trigger.trigger_count, 2);
    assert_eq!(trigger.last_trigger_date, Some(date(2026, 2, 1)));
}

#[test]
fn test_tag_predicate_match_types() {
    let items = vec![
        tagged("a", &["property"], true),
        tagged("b", &["property"], true),
        tagged("c", &["property"], false),
        tagged("watcher", &[], false),
    ];
    let owner = 3;

    let all = TagPredicate::new(vec!["property".into()], MatchType::All, true);
    let any = TagPredicate::new(vec!["property".into()], MatchType::Any, true);
    let none = TagPredicate::new(vec!["property".into()], MatchType::None, true);

    assert!(!all.evaluate(&items, owner), "one candidate is disabled");
    assert!(any.evaluate(&items, owner));
    assert!(!none.evaluate(&items, owner));

    let mut items_on = items.clone();
    items_on[2].enabled_by_sim = true;
    assert!(all.evaluate(&items_on, owner));

    // match_value = false inverts the membership test.
    let all_disabled = TagPredicate::new(vec!["property".into()], MatchType::All, false);
    let mut items_off = items.clone();
    items_off[0].enabled_by_sim = false;
    items_off[1].enabled_by_sim = false;
    assert!(all_disabled.evaluate(&items_off, owner));
}

#[test]
fn test_tag_predicate_excludes_owner() {
    let items = vec![
        tagged("a", &["pool"], false),
        tagged("b", &["pool"], true),
    ];
    // From a's perspective only b is a candidate, so All(enabled) holds
    // even though a itself is disabled.
    let all = TagPredicate::new(vec!["pool".into()], MatchType::All, true);
    assert!(all.evaluate(&items, 0));
    assert!(!all.evaluate(&items, 1));
}

#[test]
fn test_tag_predicate_empty_candidate_set() {
    let items = vec![tagged("only", &[], false)];
    let all = TagPredicate::new(vec!["ghost".into()], MatchType::All, true);
    let any = TagPredicate::new(vec!["ghost".into()], MatchType::Any, true);
    let none = TagPredicate::new(vec!["ghost".into()], MatchType::None, true);
    assert!(!all.evaluate(&items, 0), "All over nothing is false");
    assert!(!any.evaluate(&items, 0));
    assert!(none.evaluate(&items, 0), "None over nothing is true");
}

#[test]
fn test_unconstrained_conditions_never_fire() {
    let conditions = TriggerConditions::default();
    let items = vec![tagged("x", &[], true)];
    assert!(!conditions.has_any_conditions(true));
    assert!(!conditions.evaluate(&ctx(&items, 0)).fired);
}

#[test]
fn test_date_range_conditions() {
    let items = vec![tagged("x", &[], true)];
    let conditions = TriggerConditions {
        start_date: Some(date(2026, 6, 1)),
        end_date: Some(date(2026, 6, 30)),
        ..TriggerConditions::default()
    };
    // ctx sim date is 2026-06-15, inside the window.
    assert!(conditions.evaluate(&ctx(&items, 0)).fired);

    let after = TriggerConditions {
        start_date: Some(date(2026, 7, 1)),
        ..TriggerConditions::default()
    };
    assert!(!after.evaluate(&ctx(&items, 0)).fired);
}

#[test]
fn test_composite_all_and_any() {
    let items = vec![tagged("x", &[], true)];
    let base = TriggerConditions {
        age: ValueTrigger::new(CompareOp::GreaterThanOrEqual, dec!(40)),
        main_savings_balance: ValueTrigger::new(CompareOp::GreaterThanOrEqual, dec!(10000)),
        ..TriggerConditions::default()
    };

    // ctx: age 45 (true), main savings 5000 (false).
    let all = TriggerConditions {
        trigger_match_type: MatchType::All,
        ..base.clone()
    };
    assert!(!all.evaluate(&ctx(&items, 0)).fired);

    let any = TriggerConditions {
        trigger_match_type: MatchType::Any,
        ..base.clone()
    };
    let decision = any.evaluate(&ctx(&items, 0));
    assert!(decision.fired);
    assert!(decision.hits.age, "the matching trigger is recorded");
    assert!(!decision.hits.main_savings_balance);

    let none = TriggerConditions {
        trigger_match_type: MatchType::None,
        ..base
    };
    assert!(!none.evaluate(&ctx(&items, 0)).fired);
}

#[test]
fn test_match_value_false_fires_on_all_false() {
    let items = vec![tagged("x", &[], true)];
    // "Fire while the balance has NOT reached 10k."
    let conditions = TriggerConditions {
        trigger_match_type: MatchType::All,
        trigger_match_value: false,
        main_savings_balance: ValueTrigger::new(CompareOp::GreaterThanOrEqual, dec!(10000)),
        ..TriggerConditions::default()
    };
    let decision = conditions.evaluate(&ctx(&items, 0));
    assert!(decision.fired);
    assert!(
        !decision.hits.main_savings_balance,
        "a trigger that checked false is not recorded"
    );
}

#[test]
fn test_hits_cleared_when_composite_fails() {
    let items = vec![tagged("x", &[], true)];
    let conditions = TriggerConditions {
        trigger_match_type: MatchType::All,
        age: ValueTrigger::new(CompareOp::GreaterThanOrEqual, dec!(40)),
        liquid_assets: ValueTrigger::new(CompareOp::GreaterThanOrEqual, dec!(1000000)),
        ..TriggerConditions::default()
    };
    let decision = conditions.evaluate(&ctx(&items, 0));
    assert!(!decision.fired);
    assert_eq!(decision.hits, Default::default(), "no hits without a firing");
}

#[test]
fn test_target_balance_ignored_outside_event_context() {
    let items = vec![tagged("x", &[], true)];
    // "Fire once the loan balance has climbed back to zero."
    let conditions = TriggerConditions {
        target_balance: ValueTrigger::new(CompareOp::GreaterThanOrEqual, dec!(0)),
        ..TriggerConditions::default()
    };
    assert!(!conditions.has_any_conditions(false));
    assert!(conditions.has_any_conditions(true));
    // Without a target value the trigger contributes nothing, so the
    // result list is empty and the conditions cannot fire.
    assert!(!conditions.evaluate(&ctx(&items, 0)).fired);

    let event_ctx = TriggerContext {
        target_value: Some(dec!(-100)),
        ..ctx(&items, 0)
    };
    assert!(!conditions.evaluate(&event_ctx).fired);
    let event_ctx_paid = TriggerContext {
        target_value: Some(Decimal::ZERO),
        ..ctx(&items, 0)
    };
    assert!(conditions.evaluate(&event_ctx_paid).fired);
}

#[test]
fn test_record_hits_updates_counts() {
    let items = vec![tagged("x", &[], true)];
    let mut conditions = TriggerConditions {
        age: ValueTrigger::new(CompareOp::GreaterThanOrEqual, dec!(40)),
        ..TriggerConditions::default()
    };
    let decision = conditions.evaluate(&ctx(&items, 0));
    assert!(decision.fired);
    conditions.record_hits(decision.hits, date(2026, 6, 15));
    assert_eq!(conditions.age.trigger_count, 1);
    assert_eq!(conditions.age.last_trigger_date, Some(date(2026, 6, 15)));
}

#[test]
fn test_legacy_min_max_migration() {
    let mut conditions = TriggerConditions {
        legacy_min_age: Some(60),
        legacy_min_enabled: Some(true),
        legacy_min_value: Some(dec!(25000)),
        ..TriggerConditions::default()
    };
    let mut report = crate::sanitize::SanitizeReport::default();
    conditions.sanitize(crate::model::ItemId::UNSET, &mut report);

    assert!(conditions.age.enabled);
    assert_eq!(conditions.age.operator, CompareOp::GreaterThanOrEqual);
    assert_eq!(conditions.age.comparison_value, dec!(60));
    assert!(conditions.main_savings_balance.enabled);
    assert_eq!(conditions.main_savings_balance.comparison_value, dec!(25000));
    assert_eq!(conditions.legacy_min_age, None, "legacy fields are erased");
    assert_eq!(conditions.legacy_min_enabled, None);
    assert_eq!(conditions.legacy_min_value, None);
    assert!(!report.corrections().is_empty());
}
