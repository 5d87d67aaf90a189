//! Conditional inter-item operations.
//!
//! An [`EventItem`] is owned by a source item and, when its triggers
//! fire, pushes cash to a target, pulls cash from it, toggles its
//! state, or liquidates it into main savings. The operation kinds are
//! mutually exclusive after sanitize.

use serde::{Deserialize, Serialize};

use crate::model::amount::AmountFreq;
use crate::model::ids::ItemId;
use crate::model::triggers::TriggerConditions;
use crate::sanitize::SanitizeReport;
use crate::serde_util::named_enum;

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum StateAction {
        #[default]
        Enable = 0,
        Disable = 1,
        Toggle = 2,
    }
}

impl StateAction {
    pub fn apply(self, current: bool) -> bool {
        match self {
            StateAction::Enable => true,
            StateAction::Disable => false,
            StateAction::Toggle => !current,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventItem {
    pub id: ItemId,
    pub name: String,
    pub enabled: bool,
    /// Preferred target reference; `target_name` is the fallback lookup
    /// the sanitize pass uses to repair configs from older versions.
    pub target_id: Option<ItemId>,
    pub target_name: String,
    pub set_state_on_trigger: bool,
    pub target_state_action: StateAction,
    /// Cash pushed from the source to the target.
    pub cash_out: AmountFreq,
    /// Cash pulled from the target to the source.
    pub cash_in: AmountFreq,
    pub liquidate: bool,
    pub triggers: TriggerConditions,
}

impl Default for EventItem {
    fn default() -> Self {
        Self {
            id: ItemId::UNSET,
            name: String::new(),
            enabled: true,
            target_id: None,
            target_name: String::new(),
            set_state_on_trigger: false,
            target_state_action: StateAction::Enable,
            cash_out: AmountFreq::default(),
            cash_in: AmountFreq::default(),
            liquidate: false,
            triggers: TriggerConditions::default(),
        }
    }
}

impl EventItem {
    /// Normalize the event's own structure. Target resolution is a
    /// config-level pass (it needs the full item list).
    pub fn sanitize(&mut self, report: &mut SanitizeReport) {
        let id = self.id;

        // Destination-basis percentages are legal here, but the two cash
        // directions must not both run; push wins.
        if self.cash_out.enabled && self.cash_in.enabled {
            report.correct(id, "event cannot push and pull at once; pull disabled");
            self.cash_in.enabled = false;
        }
        if self.liquidate && (self.cash_out.enabled || self.cash_in.enabled) {
            report.correct(id, "liquidate event cannot also move cash; cash flows disabled");
            self.cash_out.enabled = false;
            self.cash_in.enabled = false;
        }

        self.cash_out.sanitize(id, report);
        self.cash_in.sanitize(id, report);
        self.triggers.sanitize(id, report);
    }
}
