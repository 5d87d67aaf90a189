//! The root configuration container.
//!
//! A `Config` owns every financial item plus the global simulation
//! settings. It is created by deserializing a JSON document (or by a
//! GUI), normalized by the sanitize pass, and then treated as the
//! read-only plan of a simulation run.

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::date_math::{add_days, add_months, add_years};
use crate::logging::LogLevel;
use crate::model::{FinancialItem, ItemId};
use crate::sanitize::{self, SanitizeReport};
use crate::serde_util::named_enum;
use crate::taxes::TaxMode;

pub mod descriptors;

pub use descriptors::{Describe, PropertyDescriptor, PropertyKind};

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum StepIncrement {
        Daily = 0,
        Weekly = 1,
        Fortnightly = 2,
        #[default]
        Monthly = 3,
        Annual = 4,
    }
}

impl StepIncrement {
    pub const fn steps_per_year(self) -> u32 {
        match self {
            StepIncrement::Daily => 365,
            StepIncrement::Weekly => 52,
            StepIncrement::Fortnightly => 26,
            StepIncrement::Monthly => 12,
            StepIncrement::Annual => 1,
        }
    }

    /// The simulation date at `step` ticks past `start`. Always derived
    /// from the start date, never incrementally, so identical configs
    /// walk identical date sequences.
    pub fn date_at(self, start: Date, step: u32) -> Date {
        let step = step as i32;
        match self {
            StepIncrement::Daily => add_days(start, step),
            StepIncrement::Weekly => add_days(start, 7 * step),
            StepIncrement::Fortnightly => add_days(start, 14 * step),
            StepIncrement::Monthly => add_months(start, step),
            StepIncrement::Annual => add_years(start, step),
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_birth_date() -> Date {
    jiff::civil::date(1970, 1, 1)
}

fn default_years_to_sim() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub sim_name: String,
    #[serde(default = "default_birth_date")]
    pub birth_date: Date,
    #[serde(default = "default_years_to_sim")]
    pub years_to_sim: u32,
    pub step_increment: StepIncrement,
    #[serde(default = "default_true")]
    pub start_date_is_today: bool,
    pub start_date: Option<Date>,
    pub tax_mode: TaxMode,
    pub tax_percent: Decimal,
    /// End of the financial year; only meaningful to the comprehensive
    /// tax mode, defaulted to June 30 by sanitize.
    pub end_of_fy: Option<Date>,
    pub items: Vec<FinancialItem>,
    /// Index of the single main-savings item; derived by sanitize, not
    /// persisted.
    #[serde(skip)]
    pub main_savings_idx: Option<usize>,
    pub log_level: LogLevel,
    pub fail_on_overdraw: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            sim_name: String::new(),
            birth_date: default_birth_date(),
            years_to_sim: default_years_to_sim(),
            step_increment: StepIncrement::Monthly,
            start_date_is_today: true,
            start_date: None,
            tax_mode: TaxMode::NoTax,
            tax_percent: Decimal::ZERO,
            end_of_fy: None,
            items: Vec::new(),
            main_savings_idx: None,
            log_level: LogLevel::Warn,
            fail_on_overdraw: false,
        }
    }
}

impl Config {
    /// Run the full sanitize pipeline against the current wall-clock
    /// date. Running the simulator on an unsanitized config is
    /// undefined; the simulator therefore sanitizes on construction.
    pub fn sanitize(&mut self) -> SanitizeReport {
        self.sanitize_with_today(jiff::Zoned::now().date())
    }

    /// Deterministic variant for tests and replays: "today" is supplied
    /// by the caller.
    pub fn sanitize_with_today(&mut self, today: Date) -> SanitizeReport {
        sanitize::sanitize_config(self, today)
    }

    pub fn main_savings(&self) -> Option<&FinancialItem> {
        self.main_savings_idx.and_then(|idx| self.items.get(idx))
    }

    pub fn find_item(&self, id: ItemId) -> Option<&FinancialItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Total processing ticks for a run (the initial snapshot frame is
    /// extra).
    pub fn total_steps(&self) -> u32 {
        self.years_to_sim * self.step_increment.steps_per_year()
    }
}
