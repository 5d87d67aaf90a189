//! Immutable per-tick snapshots.

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::ids::ItemId;

/// One item's runtime state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemState {
    pub id: ItemId,
    pub value: Decimal,
    pub cash_in_amount: Decimal,
    pub cash_out_amount: Decimal,
    pub interest_amount: Decimal,
    pub cash_flow: Decimal,
    pub enabled_by_sim: bool,
    pub tax_paid: Decimal,
}

/// Something the tick did that an exporter or GUI wants to show.
/// Emitted in application order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    CashPushed {
        event_id: ItemId,
        source_id: ItemId,
        target_id: ItemId,
        amount: Decimal,
    },
    CashPulled {
        event_id: ItemId,
        source_id: ItemId,
        target_id: ItemId,
        amount: Decimal,
    },
    SharesPurchased {
        event_id: ItemId,
        source_id: ItemId,
        target_id: ItemId,
        units: Decimal,
        cost: Decimal,
    },
    SharesSold {
        event_id: ItemId,
        source_id: ItemId,
        target_id: ItemId,
        units: Decimal,
        proceeds: Decimal,
    },
    Liquidated {
        source_id: ItemId,
        target_id: ItemId,
        amount: Decimal,
    },
    StateChanged {
        event_id: ItemId,
        source_id: ItemId,
        target_id: ItemId,
        enabled: bool,
    },
    /// Terminal: main savings went negative with `fail_on_overdraw` set.
    Overdrawn { balance: Decimal },
}

/// Snapshot of every item plus the accumulated tax and the events the
/// tick emitted. Immutable once appended to the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimFrame {
    pub frame_date: Date,
    pub items: Vec<ItemState>,
    /// Cumulative tax withheld since the start of the run.
    pub total_tax_paid: Decimal,
    pub events: Vec<SimEvent>,
}

impl SimFrame {
    pub fn item(&self, id: ItemId) -> Option<&ItemState> {
        self.items.iter().find(|state| state.id == id)
    }

    pub fn has_overdraw(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, SimEvent::Overdrawn { .. }))
    }
}
