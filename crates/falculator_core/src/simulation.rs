//! The simulation driver.
//!
//! One tick: evaluate each item's self trigger in ascending eval order,
//! then for active items accrue interest, produce cash flows, and apply
//! events; sweep every item's cash flow into main savings; check for
//! overdraw; snapshot a frame. Event effects are computed against an
//! immutable view of the items and applied afterwards, so evaluation
//! order is the only thing that determines what an event can observe.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jiff::civil::Date;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::error::SimulatorError;
use crate::logging::DebugLogger;
use crate::model::{
    FinancialItem, ItemId, ItemType, SimEvent, SimFrame, TriggerContext, ValueTriggerHits,
};
use crate::sanitize::SanitizeReport;
use crate::simulation_state::{SimState, TickFlow};
use crate::taxes::{TaxMode, withhold};

/// Cooperative cancellation: checked between ticks, never mid-tick. The
/// tick running when the flag is raised completes and keeps its frame.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Aggregates every trigger in one tick sees, computed before any item
/// is processed.
#[derive(Debug, Clone, Copy)]
struct TickCtx {
    prev: Date,
    curr: Date,
    age: i32,
    liquid_assets: Decimal,
    main_savings_balance: Decimal,
    tax_mode: TaxMode,
    tax_percent: Decimal,
}

pub struct Simulator {
    config: Config,
    state: SimState,
    cancelled: Arc<AtomicBool>,
    total_steps: u32,
    sanitize_report: SanitizeReport,
    _logger: DebugLogger,
}

impl Simulator {
    /// Sanitize the config and build the runtime state. Fails when
    /// sanitize reports a fatal condition (multiple main savings, zero
    /// unit price on a transfer target).
    pub fn new(mut config: Config) -> Result<Self, SimulatorError> {
        let logger = DebugLogger::scoped(config.log_level);
        let today = jiff::Zoned::now().date();
        let sanitize_report = config.sanitize_with_today(today);
        if sanitize_report.has_fatal() {
            return Err(SimulatorError::Sanitize(sanitize_report.fatals().to_vec()));
        }
        let Some(state) = SimState::from_config(&config) else {
            return Err(SimulatorError::Sanitize(sanitize_report.fatals().to_vec()));
        };
        let total_steps = config.total_steps();
        tracing::info!(
            sim = %config.sim_name,
            steps = total_steps,
            "simulation initialized"
        );
        Ok(Self {
            config,
            state,
            cancelled: Arc::new(AtomicBool::new(false)),
            total_steps,
            sanitize_report,
            _logger: logger,
        })
    }

    /// What sanitize changed while constructing this simulator.
    pub fn sanitize_report(&self) -> &SanitizeReport {
        &self.sanitize_report
    }

    pub fn frames(&self) -> &[SimFrame] {
        &self.state.frames
    }

    /// `(completed processing steps, total processing steps)`. The
    /// initial snapshot frame does not count as a step.
    pub fn progress(&self) -> (u32, u32) {
        (
            self.state.next_step.saturating_sub(1).min(self.total_steps),
            self.total_steps,
        )
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// A clonable handle another thread can use to request cancellation.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }

    /// Drive the run to its end (natural, overdraw, or cancellation) and
    /// return the full frame history.
    pub fn run(&mut self) -> &[SimFrame] {
        while self.tick().is_some() {}
        self.frames()
    }

    /// Advance one step and return its frame; `None` once the run has
    /// ended. Step 0 emits the initial snapshot without processing.
    pub fn tick(&mut self) -> Option<SimFrame> {
        if self.state.halted || self.state.next_step > self.total_steps {
            return None;
        }
        if self.cancelled.load(Ordering::Relaxed) {
            tracing::info!("simulation cancelled after {} steps", self.state.next_step);
            self.state.halted = true;
            return None;
        }

        let step = self.state.next_step;
        let start = self.state.start_date;
        let frame = if step == 0 {
            let flows = vec![TickFlow::default(); self.state.items.len()];
            self.state.snapshot(start, &flows, Vec::new())
        } else {
            let curr = self.config.step_increment.date_at(start, step);
            let prev = self.config.step_increment.date_at(start, step - 1);
            let ctx = TickCtx {
                prev,
                curr,
                age: self.state.age_at(curr),
                liquid_assets: self.state.liquid_assets(),
                main_savings_balance: self.state.main_savings_balance(),
                tax_mode: self.config.tax_mode,
                tax_percent: self.config.tax_percent,
            };
            self.process_step(&ctx)
        };

        self.state.next_step += 1;
        self.state.frames.push(frame.clone());
        Some(frame)
    }

    fn process_step(&mut self, ctx: &TickCtx) -> SimFrame {
        let state = &mut self.state;
        let item_count = state.items.len();
        let mut flows = vec![TickFlow::default(); item_count];
        let mut emitted: Vec<SimEvent> = Vec::new();

        for idx in 0..item_count {
            let outcome = {
                let trigger_ctx = TriggerContext {
                    items: &state.items,
                    owner: idx,
                    sim_date: ctx.curr,
                    age: ctx.age,
                    liquid_assets: ctx.liquid_assets,
                    main_savings_balance: ctx.main_savings_balance,
                    target_value: None,
                };
                state.items[idx].self_trigger_outcome(&trigger_ctx)
            };
            state.items[idx].enabled_by_sim = outcome.active;
            if outcome.fired {
                state.items[idx].self_trigger.record_hits(outcome.hits, ctx.curr);
            }
            if !outcome.active {
                continue;
            }

            apply_interest(&mut state.items[idx], ctx, &mut flows[idx]);
            apply_own_cash_flows(&mut state.items[idx], ctx, &mut flows[idx]);

            let event_count = state.items[idx].events.len();
            for event_idx in 0..event_count {
                let fire =
                    evaluate_event(&state.items, &state.index_by_id, idx, event_idx, ctx);
                if let Some(fire) = fire {
                    apply_event_fire(
                        &mut state.items,
                        &mut flows,
                        &mut emitted,
                        idx,
                        fire,
                        ctx.curr,
                    );
                }
            }

            if outcome.fired && state.items[idx].liquidate_self_on_trigger {
                let item = &mut state.items[idx];
                let id = item.id;
                let amount = item.value;
                liquidate(item, &mut flows[idx]);
                emitted.push(SimEvent::Liquidated {
                    source_id: id,
                    target_id: id,
                    amount,
                });
            }
        }

        // Sweep: every item's cash flow lands in main savings. Item
        // values themselves are untouched here.
        let swept: Decimal = flows.iter().map(|flow| flow.cash_flow).sum();
        state.items[state.main_idx].value += swept;

        let main_balance = state.items[state.main_idx].value;
        if main_balance < Decimal::ZERO {
            if self.config.fail_on_overdraw {
                tracing::error!(%main_balance, "main savings overdrawn; terminating");
                emitted.push(SimEvent::Overdrawn {
                    balance: main_balance,
                });
                state.halted = true;
            } else {
                tracing::warn!(%main_balance, "main savings overdrawn");
            }
        }

        state.total_tax_paid += flows.iter().map(|flow| flow.tax).sum::<Decimal>();
        state.snapshot(ctx.curr, &flows, emitted)
    }
}

// ============================================================================
// Per-item processing
// ============================================================================

fn apply_interest(item: &mut FinancialItem, ctx: &TickCtx, flow: &mut TickFlow) {
    if item.item_type == ItemType::Shares {
        // Growth applies to the unit price; value is resynced from the
        // holdings.
        let Some(unit_price) = item.share_details.as_ref().map(|d| d.unit_price) else {
            return;
        };
        let delta = item.interest.compute(ctx.prev, ctx.curr, unit_price, None);
        if delta.is_zero() {
            return;
        }
        let old_value = item.value;
        if let Some(details) = item.share_details.as_mut() {
            details.unit_price += delta.delta;
        }
        item.resync_share_value();
        flow.interest = item.value - old_value;
        item.interest.schedule.record(delta.occurrences);
        return;
    }

    let delta = item.interest.compute(ctx.prev, ctx.curr, item.value, None);
    if delta.is_zero() {
        return;
    }
    if item.item_type == ItemType::Savings {
        let withheld = withhold(ctx.tax_mode, ctx.tax_percent, delta.delta);
        item.value += withheld.net;
        flow.interest = withheld.net;
        flow.tax += withheld.tax;
    } else {
        item.value += delta.delta;
        flow.interest = delta.delta;
    }
    item.interest.schedule.record(delta.occurrences);
}

fn apply_own_cash_flows(item: &mut FinancialItem, ctx: &TickCtx, flow: &mut TickFlow) {
    let cash_in = item.cash_in.compute(ctx.prev, ctx.curr, item.value, None);
    if !cash_in.is_zero() {
        let withheld = withhold(ctx.tax_mode, ctx.tax_percent, cash_in.delta);
        flow.cash_in = withheld.net;
        flow.tax += withheld.tax;
        item.cash_in.schedule.record(cash_in.occurrences);
    }

    let cash_out = item.cash_out.compute(ctx.prev, ctx.curr, item.value, None);
    if !cash_out.is_zero() {
        let effective = if item.item_type.is_debt() {
            // A debt item's own cash out is a repayment: it moves the
            // balance toward zero and snaps there instead of crossing.
            let repay = cash_out.delta.clamp(Decimal::ZERO, item.value.abs());
            if item.value < Decimal::ZERO {
                item.value += repay;
            } else {
                item.value -= repay;
            }
            repay
        } else {
            cash_out.delta
        };
        if !effective.is_zero() {
            flow.cash_out = effective;
            item.cash_out.schedule.record(cash_out.occurrences);
        }
    }

    flow.cash_flow += flow.cash_in - flow.cash_out;
}

// ============================================================================
// Event processing (evaluate immutably, apply afterwards)
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum EventOp {
    PushCash { amount: Decimal },
    PushDebt { amount: Decimal },
    PushShares { units: Decimal, cost: Decimal },
    PullCash { amount: Decimal },
    PullDebt { amount: Decimal },
    PullShares { units: Decimal, proceeds: Decimal },
    Liquidate,
    SetState { enabled: bool },
}

#[derive(Debug)]
struct EventFire {
    event_idx: usize,
    target_idx: usize,
    hits: ValueTriggerHits,
    ops: Vec<EventOp>,
    push_occurrences: u32,
    pull_occurrences: u32,
}

fn evaluate_event(
    items: &[FinancialItem],
    index_by_id: &FxHashMap<ItemId, usize>,
    source_idx: usize,
    event_idx: usize,
    ctx: &TickCtx,
) -> Option<EventFire> {
    let source = &items[source_idx];
    let event = &source.events[event_idx];
    if !event.enabled {
        return None;
    }
    let target_idx = event
        .target_id
        .and_then(|id| index_by_id.get(&id).copied())?;
    if target_idx == source_idx {
        return None;
    }
    let target = &items[target_idx];

    let decision = event.triggers.evaluate(&TriggerContext {
        items,
        owner: source_idx,
        sim_date: ctx.curr,
        age: ctx.age,
        liquid_assets: ctx.liquid_assets,
        main_savings_balance: ctx.main_savings_balance,
        target_value: Some(target.value),
    });
    if !decision.fired {
        return None;
    }

    let mut ops = Vec::new();
    let mut push_occurrences = 0;
    let mut pull_occurrences = 0;

    if event.liquidate {
        // Nothing left to do once the target is empty and disabled.
        if !target.value.is_zero() || target.enabled_by_sim {
            ops.push(EventOp::Liquidate);
        }
    } else if event.cash_out.enabled {
        let flow = event
            .cash_out
            .compute(ctx.prev, ctx.curr, source.value, Some(target.value));
        if flow.delta > Decimal::ZERO {
            match target.item_type {
                ItemType::Loan | ItemType::Liability => {
                    // Overpayment cap: never push the balance past zero.
                    let amount = if target.value < Decimal::ZERO {
                        flow.delta.min(-target.value)
                    } else {
                        Decimal::ZERO
                    };
                    if amount > Decimal::ZERO {
                        ops.push(EventOp::PushDebt { amount });
                        push_occurrences = flow.occurrences;
                    }
                }
                ItemType::Shares => {
                    if let Some(details) = &target.share_details
                        && details.unit_price > Decimal::ZERO
                    {
                        let units = (flow.delta / details.unit_price).floor();
                        if units > Decimal::ZERO {
                            ops.push(EventOp::PushShares {
                                units,
                                cost: units * details.unit_price,
                            });
                            push_occurrences = flow.occurrences;
                        }
                    }
                }
                _ => {
                    ops.push(EventOp::PushCash { amount: flow.delta });
                    push_occurrences = flow.occurrences;
                }
            }
        }
    } else if event.cash_in.enabled {
        let flow = event
            .cash_in
            .compute(ctx.prev, ctx.curr, source.value, Some(target.value));
        if flow.delta > Decimal::ZERO {
            match target.item_type {
                ItemType::Shares => {
                    if let Some(details) = &target.share_details
                        && details.unit_price > Decimal::ZERO
                    {
                        let wanted = (flow.delta / details.unit_price).ceil();
                        let units = wanted.min(details.unit_count);
                        if units > Decimal::ZERO {
                            ops.push(EventOp::PullShares {
                                units,
                                proceeds: units * details.unit_price,
                            });
                            pull_occurrences = flow.occurrences;
                        }
                    }
                }
                ItemType::Loan | ItemType::Liability => {
                    // Pulling from a debt is a redraw: the balance moves
                    // away from zero.
                    ops.push(EventOp::PullDebt { amount: flow.delta });
                    pull_occurrences = flow.occurrences;
                }
                _ => {
                    ops.push(EventOp::PullCash { amount: flow.delta });
                    pull_occurrences = flow.occurrences;
                }
            }
        }
    }

    if event.set_state_on_trigger {
        ops.push(EventOp::SetState {
            enabled: event.target_state_action.apply(target.enabled_by_sim),
        });
    }

    Some(EventFire {
        event_idx,
        target_idx,
        hits: decision.hits,
        ops,
        push_occurrences,
        pull_occurrences,
    })
}

fn apply_event_fire(
    items: &mut [FinancialItem],
    flows: &mut [TickFlow],
    emitted: &mut Vec<SimEvent>,
    source_idx: usize,
    fire: EventFire,
    sim_date: Date,
) {
    let (event_id, source_id) = {
        let source = &mut items[source_idx];
        let event = &mut source.events[fire.event_idx];
        event.triggers.record_hits(fire.hits, sim_date);
        if fire.push_occurrences > 0 {
            event.cash_out.schedule.record(fire.push_occurrences);
        }
        if fire.pull_occurrences > 0 {
            event.cash_in.schedule.record(fire.pull_occurrences);
        }
        (event.id, source.id)
    };

    let target = &mut items[fire.target_idx];
    let target_id = target.id;

    for op in fire.ops {
        match op {
            EventOp::PushCash { amount } => {
                flows[source_idx].cash_flow -= amount;
                flows[fire.target_idx].cash_flow += amount;
                emitted.push(SimEvent::CashPushed {
                    event_id,
                    source_id,
                    target_id,
                    amount,
                });
            }
            EventOp::PushDebt { amount } => {
                flows[source_idx].cash_flow -= amount;
                target.value += amount;
                emitted.push(SimEvent::CashPushed {
                    event_id,
                    source_id,
                    target_id,
                    amount,
                });
            }
            EventOp::PushShares { units, cost } => {
                flows[source_idx].cash_flow -= cost;
                if let Some(details) = target.share_details.as_mut() {
                    details.unit_count += units;
                    details.total_cost_base += cost;
                }
                target.resync_share_value();
                emitted.push(SimEvent::SharesPurchased {
                    event_id,
                    source_id,
                    target_id,
                    units,
                    cost,
                });
            }
            EventOp::PullCash { amount } => {
                flows[fire.target_idx].cash_flow -= amount;
                flows[source_idx].cash_flow += amount;
                emitted.push(SimEvent::CashPulled {
                    event_id,
                    source_id,
                    target_id,
                    amount,
                });
            }
            EventOp::PullDebt { amount } => {
                target.value -= amount;
                flows[source_idx].cash_flow += amount;
                emitted.push(SimEvent::CashPulled {
                    event_id,
                    source_id,
                    target_id,
                    amount,
                });
            }
            EventOp::PullShares { units, proceeds } => {
                if let Some(details) = target.share_details.as_mut() {
                    details.unit_count -= units;
                }
                target.resync_share_value();
                flows[source_idx].cash_flow += proceeds;
                emitted.push(SimEvent::SharesSold {
                    event_id,
                    source_id,
                    target_id,
                    units,
                    proceeds,
                });
            }
            EventOp::Liquidate => {
                let amount = target.value;
                liquidate(target, &mut flows[fire.target_idx]);
                emitted.push(SimEvent::Liquidated {
                    source_id,
                    target_id,
                    amount,
                });
            }
            EventOp::SetState { enabled } => {
                target.enabled_by_sim = enabled;
                emitted.push(SimEvent::StateChanged {
                    event_id,
                    source_id,
                    target_id,
                    enabled,
                });
            }
        }
    }
}

/// Move an item's entire value into its cash flow (bound for main
/// savings in the sweep) and disable it.
fn liquidate(item: &mut FinancialItem, flow: &mut TickFlow) {
    flow.cash_flow += item.value;
    item.value = Decimal::ZERO;
    if let Some(details) = item.share_details.as_mut() {
        details.unit_count = Decimal::ZERO;
    }
    item.enabled_by_sim = false;
}
