//! Recurring monetary deltas.
//!
//! An [`AmountFreq`] pairs an amount with a schedule: a fixed sum per
//! fire, a per-fire percentage of some basis value, or an annual rate
//! applied with monthly compounding (each monthly fire contributes the
//! twelfth root of the annual factor).

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::ids::ItemId;
use crate::model::schedule::{AmountSchedule, Frequency};
use crate::money::{annual_monthly_factor, compound_factor};
use crate::sanitize::SanitizeReport;
use crate::serde_util::named_enum;

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum PercentageBasis {
        #[default]
        Source = 0,
        Destination = 1,
        SelfValue = 2,
    }
}

/// Outcome of evaluating an [`AmountFreq`] over an interval: the signed
/// delta and the number of schedule fires that produced it. The caller
/// records the fires on the schedule once the delta has actually been
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowDelta {
    pub delta: Decimal,
    pub occurrences: u32,
}

impl FlowDelta {
    pub const ZERO: FlowDelta = FlowDelta {
        delta: Decimal::ZERO,
        occurrences: 0,
    };

    pub fn is_zero(&self) -> bool {
        self.delta.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountFreq {
    pub enabled: bool,
    pub amount: Decimal,
    pub is_percentage: bool,
    pub percentage_basis: PercentageBasis,
    pub annual_rate_monthly_compounding: bool,
    pub schedule: AmountSchedule,
}

impl Default for AmountFreq {
    fn default() -> Self {
        Self {
            enabled: false,
            amount: Decimal::ZERO,
            is_percentage: false,
            percentage_basis: PercentageBasis::Source,
            annual_rate_monthly_compounding: false,
            schedule: AmountSchedule::default(),
        }
    }
}

impl AmountFreq {
    /// A fixed amount on the given schedule.
    pub fn fixed(amount: Decimal, schedule: AmountSchedule) -> Self {
        Self {
            enabled: true,
            amount,
            schedule,
            ..Self::default()
        }
    }

    /// An annual percentage rate compounded monthly, the standard shape
    /// for savings and credit-card interest.
    pub fn annual_rate(percent: Decimal) -> Self {
        Self {
            enabled: true,
            amount: percent,
            is_percentage: true,
            percentage_basis: PercentageBasis::SelfValue,
            annual_rate_monthly_compounding: true,
            schedule: AmountSchedule::monthly_compounding(),
        }
    }

    /// Signed delta over `(prev, curr]`.
    ///
    /// `dest_value` is only consulted when `percentage_basis` is
    /// `Destination` (event amounts); item-owned amounts always resolve
    /// against `source_value`.
    pub fn compute(
        &self,
        prev: Date,
        curr: Date,
        source_value: Decimal,
        dest_value: Option<Decimal>,
    ) -> FlowDelta {
        if !self.enabled || self.amount.is_zero() {
            return FlowDelta::ZERO;
        }
        let occurrences = self.schedule.occurrences(prev, curr);
        if occurrences == 0 {
            return FlowDelta::ZERO;
        }

        let basis = match (self.percentage_basis, dest_value) {
            (PercentageBasis::Destination, Some(dest)) => dest,
            _ => source_value,
        };

        let delta = if !self.is_percentage {
            self.amount * Decimal::from(occurrences)
        } else if self.annual_rate_monthly_compounding {
            basis * (annual_monthly_factor(self.amount, occurrences) - Decimal::ONE)
        } else {
            basis * (compound_factor(self.amount, occurrences) - Decimal::ONE)
        };

        FlowDelta { delta, occurrences }
    }

    /// Enforce the annual-rate-monthly-compounding shape: percentage on
    /// a monthly last-day schedule with no month anchor.
    pub fn sanitize(&mut self, owner: ItemId, report: &mut SanitizeReport) {
        if self.annual_rate_monthly_compounding {
            if !self.is_percentage {
                report.correct(owner, "monthly-compounded amount forced to percentage");
                self.is_percentage = true;
            }
            if self.schedule.frequency != Frequency::Monthly
                || self.schedule.day_of_month != Some(31)
                || self.schedule.month_of_year.is_some()
            {
                report.correct(owner, "monthly-compounded amount rescheduled to monthly, last day");
                let kept = AmountSchedule {
                    trigger_limit: self.schedule.trigger_limit,
                    trigger_count: self.schedule.trigger_count,
                    ..AmountSchedule::monthly_compounding()
                };
                self.schedule = kept;
            }
        }
        self.schedule.sanitize(owner, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use rust_decimal_macros::dec;

    #[test]
    fn disabled_or_zero_amount_is_silent() {
        let mut freq = AmountFreq::fixed(dec!(100), AmountSchedule::monthly(15));
        freq.enabled = false;
        assert_eq!(
            freq.compute(date(2026, 1, 1), date(2026, 2, 1), dec!(1000), None),
            FlowDelta::ZERO
        );

        let zero = AmountFreq::fixed(dec!(0), AmountSchedule::monthly(15));
        assert_eq!(
            zero.compute(date(2026, 1, 1), date(2026, 2, 1), dec!(1000), None),
            FlowDelta::ZERO
        );
    }

    #[test]
    fn fixed_amount_scales_with_occurrences() {
        let freq = AmountFreq::fixed(dec!(250), AmountSchedule::monthly(15));
        let flow = freq.compute(date(2026, 1, 1), date(2026, 4, 1), dec!(0), None);
        assert_eq!(flow.occurrences, 3);
        assert_eq!(flow.delta, dec!(750));
    }

    #[test]
    fn simple_percentage_compounds_per_fire() {
        let freq = AmountFreq {
            enabled: true,
            amount: dec!(10),
            is_percentage: true,
            schedule: AmountSchedule::monthly(31),
            ..AmountFreq::default()
        };
        let flow = freq.compute(date(2026, 1, 1), date(2026, 3, 1), dec!(1000), None);
        assert_eq!(flow.occurrences, 2);
        // 1000 * (1.1^2 - 1) = 210 exactly
        assert_eq!(flow.delta, dec!(210));
    }

    #[test]
    fn annual_monthly_compounding_single_fire() {
        let freq = AmountFreq::annual_rate(dec!(5));
        let flow = freq.compute(date(2026, 1, 1), date(2026, 2, 1), dec!(10000), None);
        assert_eq!(flow.occurrences, 1);
        // 10000 * (1.05^(1/12) - 1) ~= 40.74
        let expected = dec!(10000) * (annual_monthly_factor(dec!(5), 1) - Decimal::ONE);
        assert_eq!(flow.delta, expected);
        assert!((flow.delta - dec!(40.74)).abs() < dec!(0.01), "got {}", flow.delta);
    }

    #[test]
    fn destination_basis_uses_dest_value() {
        let freq = AmountFreq {
            enabled: true,
            amount: dec!(50),
            is_percentage: true,
            percentage_basis: PercentageBasis::Destination,
            schedule: AmountSchedule::monthly(31),
            ..AmountFreq::default()
        };
        let flow = freq.compute(date(2026, 1, 1), date(2026, 2, 1), dec!(1000), Some(dec!(200)));
        assert_eq!(flow.delta, dec!(100));
        // Without a destination the basis falls back to the source.
        let fallback = freq.compute(date(2026, 1, 1), date(2026, 2, 1), dec!(1000), None);
        assert_eq!(fallback.delta, dec!(500));
    }

    #[test]
    fn sanitize_restores_compounding_shape() {
        let mut report = SanitizeReport::default();
        let mut freq = AmountFreq {
            enabled: true,
            amount: dec!(4),
            is_percentage: false,
            annual_rate_monthly_compounding: true,
            schedule: AmountSchedule {
                frequency: Frequency::Weekly,
                trigger_limit: 5,
                ..AmountSchedule::default()
            },
            ..AmountFreq::default()
        };
        freq.sanitize(ItemId::UNSET, &mut report);
        assert!(freq.is_percentage);
        assert_eq!(freq.schedule.frequency, Frequency::Monthly);
        assert_eq!(freq.schedule.day_of_month, Some(31));
        assert_eq!(freq.schedule.month_of_year, None);
        assert_eq!(freq.schedule.trigger_limit, 5);
        assert!(!report.corrections().is_empty());
    }
}
