//! Data model: items, schedules, amounts, triggers, events, frames.

pub mod amount;
pub mod events;
pub mod frame;
pub mod ids;
pub mod item;
pub mod schedule;
pub mod triggers;

pub use amount::{AmountFreq, FlowDelta, PercentageBasis};
pub use events::{EventItem, StateAction};
pub use frame::{ItemState, SimEvent, SimFrame};
pub use ids::ItemId;
pub use item::{FinancialItem, ItemType, SelfTriggerOutcome, ShareDetails};
pub use schedule::{AmountSchedule, DayOfWeek, Frequency};
pub use triggers::{
    CompareOp, MatchType, TagPredicate, TriggerConditions, TriggerContext, TriggerDecision,
    ValueTrigger, ValueTriggerHits,
};
