//! End-to-end simulation scenarios
//!
//! These drive the full tick loop: compound interest, mortgage payoff,
//! share purchases, tag-driven activation, overdraw termination,
//! cancellation, conservation, and run-to-run determinism.

use jiff::civil::{Date, date};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::{Config, StepIncrement};
use crate::model::{
    AmountFreq, AmountSchedule, CompareOp, EventItem, FinancialItem, ItemId, ItemType, MatchType,
    ShareDetails, SimEvent, TagPredicate, TriggerConditions, ValueTrigger,
};
use crate::simulation::Simulator;
use crate::taxes::TaxMode;

fn id(n: u32) -> ItemId {
    ItemId::from_seq(9000 + n)
}

fn base_config(start: Date, years: u32) -> Config {
    Config {
        start_date_is_today: false,
        start_date: Some(start),
        years_to_sim: years,
        step_increment: StepIncrement::Monthly,
        ..Config::default()
    }
}

fn main_savings(value: Decimal) -> FinancialItem {
    FinancialItem {
        id: id(0),
        value,
        is_main_savings: true,
        ..FinancialItem::new("Main Savings", ItemType::Savings)
    }
}

fn always_after(start: Date) -> TriggerConditions {
    TriggerConditions {
        start_date: Some(start),
        ..TriggerConditions::default()
    }
}

/// Compound interest sanity: 5% annual rate with monthly compounding is
/// exactly 5% after twelve monthly applications.
#[test]
fn test_savings_compound_interest_one_year() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 1);
    config.items = vec![FinancialItem {
        interest: AmountFreq::annual_rate(dec!(5)),
        ..main_savings(dec!(10000))
    }];

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run();

    assert_eq!(frames.len(), 13, "initial snapshot plus twelve steps");
    let final_value = frames.last().unwrap().item(id(0)).unwrap().value;
    assert!(
        (final_value - dec!(10500)).abs() < dec!(0.01),
        "expected ~$10,500.00, got {final_value}"
    );
}

/// Mortgage payoff: the loan hits exactly zero, disables itself, and
/// never moves again.
#[test]
fn test_mortgage_payoff_disables_loan() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 30);
    config.items = vec![
        main_savings(dec!(50000)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            cash_in: AmountFreq::fixed(dec!(3000), AmountSchedule::monthly(15)),
            ..FinancialItem::new("Salary", ItemType::Income)
        },
        FinancialItem {
            id: id(2),
            eval_order: 2,
            value: dec!(-400000),
            interest: AmountFreq::annual_rate(dec!(6.5)),
            cash_out: AmountFreq::fixed(dec!(2500), AmountSchedule::monthly(31)),
            ..FinancialItem::new("Mortgage", ItemType::Loan)
        },
    ];

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run();
    assert_eq!(frames.len(), 361);

    let paid_off = frames
        .iter()
        .position(|frame| frame.item(id(2)).unwrap().value.is_zero())
        .expect("loan should pay off within 30 years");
    assert!(paid_off < frames.len() - 1, "payoff must happen before the end");

    for frame in &frames[paid_off..] {
        assert_eq!(frame.item(id(2)).unwrap().value, dec!(0));
    }
    // From the tick after payoff onward the loan is disabled.
    for frame in &frames[paid_off + 1..] {
        assert!(!frame.item(id(2)).unwrap().enabled_by_sim);
    }
}

/// Share purchase: whole units only, the remainder stays with the
/// source.
#[test]
fn test_event_buys_whole_share_units() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 1);
    config.items = vec![
        main_savings(dec!(10000)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            events: vec![EventItem {
                target_id: Some(id(2)),
                cash_out: AmountFreq::fixed(dec!(1000), AmountSchedule::monthly(31)),
                triggers: always_after(start),
                ..EventItem::default()
            }],
            ..FinancialItem::new("Salary", ItemType::Income)
        },
        FinancialItem {
            id: id(2),
            eval_order: 2,
            share_details: Some(ShareDetails {
                unit_count: dec!(0),
                unit_price: dec!(95.50),
                total_cost_base: dec!(0),
            }),
            ..FinancialItem::new("ETF", ItemType::Shares)
        },
    ];

    let mut sim = Simulator::new(config).unwrap();
    sim.tick(); // initial snapshot
    let frame = sim.tick().unwrap();

    // floor(1000 / 95.50) = 10 units at $955; $45 never leaves.
    let shares = frame.item(id(2)).unwrap();
    assert_eq!(shares.value, dec!(955));
    let salary = frame.item(id(1)).unwrap();
    assert_eq!(salary.cash_flow, dec!(-955));
    assert_eq!(frame.item(id(0)).unwrap().value, dec!(9045));

    assert!(frame.events.iter().any(|event| matches!(
        event,
        SimEvent::SharesPurchased { units, cost, .. }
            if *units == dec!(10) && *cost == dec!(955)
    )));
}

/// Shares identity: value == unit_count * unit_price after every tick,
/// including under price growth.
#[test]
fn test_shares_value_identity_under_growth() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 2);
    config.items = vec![
        main_savings(dec!(0)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            share_details: Some(ShareDetails {
                unit_count: dec!(40),
                unit_price: dec!(25),
                total_cost_base: dec!(1000),
            }),
            interest: AmountFreq::annual_rate(dec!(8)),
            ..FinancialItem::new("ETF", ItemType::Shares)
        },
    ];

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run();

    // 40 units never change; the price grows 8% over each year.
    let final_value = frames.last().unwrap().item(id(1)).unwrap().value;
    let expected = dec!(1000) * dec!(1.08) * dec!(1.08);
    assert!(
        (final_value - expected).abs() < dec!(0.01),
        "expected ~{expected}, got {final_value}"
    );
}

/// Tag-driven activation: the watcher evaluates before the property
/// items, so it sees them all enabled only on the following tick.
#[test]
fn test_tag_predicate_activates_next_tick() {
    let start = date(2026, 1, 1);
    let activation = date(2026, 6, 15);
    let mut config = base_config(start, 1);

    let mut items = vec![
        main_savings(dec!(0)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            start_enabled: false,
            self_trigger: TriggerConditions {
                tag_rules: vec![TagPredicate::new(
                    vec!["property".to_string()],
                    MatchType::All,
                    true,
                )],
                ..TriggerConditions::default()
            },
            ..FinancialItem::new("Holiday Fund", ItemType::Expense)
        },
    ];
    for n in 0..3u32 {
        items.push(FinancialItem {
            id: id(2 + n),
            eval_order: 2 + n as i32,
            tags: vec!["property".to_string()],
            start_enabled: false,
            self_trigger: always_after(activation),
            ..FinancialItem::new(format!("Property {n}"), ItemType::Asset)
        });
    }
    config.items = items;

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run().to_vec();

    // Steps 1..=5 (Feb..Jun 1): nothing is active yet.
    for frame in &frames[1..=5] {
        assert!(!frame.item(id(1)).unwrap().enabled_by_sim);
        assert!(!frame.item(id(2)).unwrap().enabled_by_sim);
    }
    // Step 6 (Jul 1): the properties switch on, but the watcher ran
    // first and still saw them disabled.
    let awakening = &frames[6];
    for n in 0..3 {
        assert!(awakening.item(id(2 + n)).unwrap().enabled_by_sim);
    }
    assert!(!awakening.item(id(1)).unwrap().enabled_by_sim);
    // Step 7: the watcher catches up.
    assert!(frames[7].item(id(1)).unwrap().enabled_by_sim);
}

/// Overdraw terminates the run at exactly the first negative tick.
#[test]
fn test_overdraw_stops_simulation() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 1);
    config.fail_on_overdraw = true;
    config.items = vec![
        main_savings(dec!(100)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            cash_out: AmountFreq::fixed(dec!(60), AmountSchedule::monthly(31)),
            ..FinancialItem::new("Groceries", ItemType::Expense)
        },
    ];

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run().to_vec();

    // 100 -> 40 -> -20: two processing steps, then stop.
    assert_eq!(frames.len(), 3);
    let last = frames.last().unwrap();
    assert!(last.has_overdraw());
    assert_eq!(last.item(id(0)).unwrap().value, dec!(-20));
    assert!(sim.tick().is_none(), "no frames after the terminal event");
}

/// Credit cards never disable and never go negative, and payments snap
/// the balance to exactly zero.
#[test]
fn test_credit_card_stays_enabled_and_non_negative() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 1);
    config.items = vec![
        main_savings(dec!(10000)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            value: dec!(500),
            interest: AmountFreq::annual_rate(dec!(20)),
            cash_out: AmountFreq::fixed(dec!(100), AmountSchedule::monthly(31)),
            ..FinancialItem::new("Visa", ItemType::CreditCard)
        },
    ];

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run();

    for frame in frames {
        let card = frame.item(id(1)).unwrap();
        assert!(card.enabled_by_sim, "credit cards never disable");
        assert!(card.value >= dec!(0), "balance went negative: {}", card.value);
    }
    assert_eq!(frames.last().unwrap().item(id(1)).unwrap().value, dec!(0));
}

/// Conservation: with no interest on main savings, its balance moves by
/// exactly the sum of all items' cash flows each tick.
#[test]
fn test_cash_flow_conservation() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 2);
    config.tax_mode = TaxMode::FlatTax;
    config.tax_percent = dec!(30);
    config.items = vec![
        main_savings(dec!(1000)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            cash_in: AmountFreq::fixed(dec!(2000), AmountSchedule::monthly(15)),
            ..FinancialItem::new("Salary", ItemType::Income)
        },
        FinancialItem {
            id: id(2),
            eval_order: 2,
            cash_out: AmountFreq::fixed(dec!(700), AmountSchedule::monthly(1)),
            ..FinancialItem::new("Rent", ItemType::Expense)
        },
    ];

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run();

    for window in frames.windows(2) {
        let (before, after) = (&window[0], &window[1]);
        let swept: Decimal = after.items.iter().map(|state| state.cash_flow).sum();
        let delta = after.item(id(0)).unwrap().value - before.item(id(0)).unwrap().value;
        assert_eq!(delta, swept, "sweep mismatch at {}", after.frame_date);
    }

    // Flat tax withheld 30% of every salary deposit.
    let last = frames.last().unwrap();
    assert_eq!(last.item(id(1)).unwrap().cash_in_amount, dec!(1400));
    assert!(last.total_tax_paid > dec!(0));
}

/// A liquidate event empties the target into main savings, once.
#[test]
fn test_liquidate_event() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 1);
    config.items = vec![
        main_savings(dec!(100)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            value: dec!(5000),
            ..FinancialItem::new("Boat", ItemType::Asset)
        },
        FinancialItem {
            id: id(2),
            eval_order: 2,
            events: vec![EventItem {
                target_id: Some(id(1)),
                liquidate: true,
                triggers: always_after(date(2026, 6, 15)),
                ..EventItem::default()
            }],
            ..FinancialItem::new("Downsizer", ItemType::Income)
        },
    ];

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run();

    let sold = &frames[6];
    assert_eq!(sold.item(id(1)).unwrap().value, dec!(0));
    assert!(!sold.item(id(1)).unwrap().enabled_by_sim);
    assert_eq!(sold.item(id(0)).unwrap().value, dec!(5100));

    let liquidations = frames
        .iter()
        .flat_map(|frame| &frame.events)
        .filter(|event| matches!(event, SimEvent::Liquidated { .. }))
        .count();
    assert_eq!(liquidations, 1, "an emptied item is not liquidated again");
}

/// A push event pays a loan down and caps at zero instead of crossing.
#[test]
fn test_push_event_overpayment_cap() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 1);
    config.items = vec![
        main_savings(dec!(20000)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            events: vec![EventItem {
                target_id: Some(id(2)),
                cash_out: AmountFreq::fixed(dec!(400), AmountSchedule::monthly(31)),
                triggers: always_after(start),
                ..EventItem::default()
            }],
            ..FinancialItem::new("Payer", ItemType::Income)
        },
        FinancialItem {
            id: id(2),
            eval_order: 2,
            value: dec!(-1000),
            ..FinancialItem::new("Car Loan", ItemType::Loan)
        },
    ];

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run();

    // 400 + 400 + 200(capped): exactly zero after three payments.
    assert_eq!(frames[1].item(id(2)).unwrap().value, dec!(-600));
    assert_eq!(frames[2].item(id(2)).unwrap().value, dec!(-200));
    assert_eq!(frames[3].item(id(2)).unwrap().value, dec!(0));
    // The capped payment only moved $200 out of the payer.
    assert_eq!(frames[3].item(id(1)).unwrap().cash_flow, dec!(-200));
    // Main savings paid out 400 + 400 + 200 in total.
    assert_eq!(frames[4].item(id(0)).unwrap().value, dec!(19000));
}

/// Identical configs produce bit-identical frame sequences.
#[test]
fn test_determinism_across_runs() {
    let build = || {
        let start = date(2026, 1, 1);
        let mut config = base_config(start, 3);
        config.tax_mode = TaxMode::FlatTax;
        config.tax_percent = dec!(15);
        config.items = vec![
            FinancialItem {
                interest: AmountFreq::annual_rate(dec!(4.25)),
                ..main_savings(dec!(2500))
            },
            FinancialItem {
                id: id(1),
                eval_order: 1,
                cash_in: AmountFreq::fixed(dec!(4321.09), AmountSchedule::monthly(15)),
                ..FinancialItem::new("Salary", ItemType::Income)
            },
            FinancialItem {
                id: id(2),
                eval_order: 2,
                value: dec!(-90000),
                interest: AmountFreq::annual_rate(dec!(5.99)),
                cash_out: AmountFreq::fixed(dec!(1500), AmountSchedule::monthly(31)),
                ..FinancialItem::new("Loan", ItemType::Loan)
            },
        ];
        config
    };

    let mut first = Simulator::new(build()).unwrap();
    let mut second = Simulator::new(build()).unwrap();
    assert_eq!(first.run(), second.run());
}

/// Cancellation is checked between ticks and stops the run cleanly.
#[test]
fn test_cancellation_between_ticks() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 5);
    config.items = vec![main_savings(dec!(1000))];

    let mut sim = Simulator::new(config).unwrap();
    sim.tick();
    sim.tick();
    sim.tick();
    sim.cancel();

    assert!(sim.tick().is_none(), "cancelled run produces no more frames");
    assert_eq!(sim.frames().len(), 3);
    assert_eq!(sim.progress(), (2, 60));
}

/// A self trigger with a value condition activates an item, and the
/// trigger limit keeps the count bounded.
#[test]
fn test_self_trigger_on_main_savings_balance() {
    let start = date(2026, 1, 1);
    let mut config = base_config(start, 1);
    config.items = vec![
        main_savings(dec!(0)),
        FinancialItem {
            id: id(1),
            eval_order: 1,
            cash_in: AmountFreq::fixed(dec!(1000), AmountSchedule::monthly(15)),
            ..FinancialItem::new("Salary", ItemType::Income)
        },
        FinancialItem {
            id: id(2),
            eval_order: 2,
            start_enabled: false,
            cash_out: AmountFreq::fixed(dec!(50), AmountSchedule::monthly(31)),
            self_trigger: TriggerConditions {
                main_savings_balance: ValueTrigger::new(
                    CompareOp::GreaterThanOrEqual,
                    dec!(2500),
                ),
                ..TriggerConditions::default()
            },
            ..FinancialItem::new("Charity", ItemType::Expense)
        },
    ];

    let mut sim = Simulator::new(config).unwrap();
    let frames = sim.run();

    // Main savings (seen at tick entry): 0, 1000, 2000, 3000...
    // The charity's condition first holds at step 4.
    assert!(!frames[3].item(id(2)).unwrap().enabled_by_sim);
    assert!(frames[4].item(id(2)).unwrap().enabled_by_sim);
    assert_eq!(frames[4].item(id(2)).unwrap().cash_flow, dec!(-50));
}
