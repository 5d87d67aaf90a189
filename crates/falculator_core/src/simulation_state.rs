//! Mutable runtime state derived from a sanitized config.
//!
//! The config is the read-only plan of a run; `SimState` carries
//! everything the simulator mutates: per-item runtime values, trigger
//! counters (inside the cloned items), the tax accumulator, and the
//! frame history. Frames are immutable once appended.

use jiff::civil::Date;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::date_math::whole_years_between;
use crate::model::{FinancialItem, ItemId, ItemState, SimEvent, SimFrame};

/// Per-item scratch for the tick in progress. Reset every tick;
/// projected into the frame's [`ItemState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TickFlow {
    pub cash_in: Decimal,
    pub cash_out: Decimal,
    pub interest: Decimal,
    pub tax: Decimal,
    pub cash_flow: Decimal,
}

#[derive(Debug, Clone)]
pub struct SimState {
    pub start_date: Date,
    pub birth_date: Date,
    /// Runtime items, sorted ascending by `eval_order`; the main
    /// savings item (order 0) is always first.
    pub items: Vec<FinancialItem>,
    pub index_by_id: FxHashMap<ItemId, usize>,
    pub main_idx: usize,
    /// Index of the next processing step; 0 is the initial snapshot.
    pub next_step: u32,
    pub total_tax_paid: Decimal,
    pub frames: Vec<SimFrame>,
    /// Set on overdraw termination or cancellation; no further frames.
    pub halted: bool,
}

impl SimState {
    /// Build runtime state from a sanitized config. `None` when the
    /// config has no elected main-savings item (fatal sanitize state).
    pub fn from_config(config: &Config) -> Option<Self> {
        let start_date = config.start_date?;
        let mut items = config.items.clone();
        items.sort_by_key(|item| item.eval_order);
        for item in &mut items {
            item.enabled_by_sim = item.start_enabled && !item.disabled_by_user;
        }
        let main_idx = items.iter().position(|item| item.is_main_savings)?;
        let index_by_id = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.id, idx))
            .collect();

        Some(Self {
            start_date,
            birth_date: config.birth_date,
            items,
            index_by_id,
            main_idx,
            next_step: 0,
            total_tax_paid: Decimal::ZERO,
            frames: Vec::new(),
            halted: false,
        })
    }

    pub fn age_at(&self, date: Date) -> i32 {
        whole_years_between(self.birth_date, date)
    }

    /// Sum of value over enabled liquid-asset items.
    pub fn liquid_assets(&self) -> Decimal {
        self.items
            .iter()
            .filter(|item| item.is_liquid_asset && item.enabled_by_sim)
            .map(|item| item.value)
            .sum()
    }

    pub fn main_savings_balance(&self) -> Decimal {
        self.items[self.main_idx].value
    }

    /// Project the current item states into an immutable frame.
    pub fn snapshot(&self, frame_date: Date, flows: &[TickFlow], events: Vec<SimEvent>) -> SimFrame {
        let items = self
            .items
            .iter()
            .zip(flows)
            .map(|(item, flow)| ItemState {
                id: item.id,
                value: item.value,
                cash_in_amount: flow.cash_in,
                cash_out_amount: flow.cash_out,
                interest_amount: flow.interest,
                cash_flow: flow.cash_flow,
                enabled_by_sim: item.enabled_by_sim,
                tax_paid: flow.tax,
            })
            .collect();

        SimFrame {
            frame_date,
            items,
            total_tax_paid: self.total_tax_paid,
            events,
        }
    }
}
