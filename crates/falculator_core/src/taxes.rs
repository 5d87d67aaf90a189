//! Tax withholding.
//!
//! FlatTax withholds a flat percentage from savings interest and from
//! every cash-in, whatever the item type. The comprehensive
//! progressive-bracket mode is reserved in the format but behaves as
//! NoTax in this core.

use rust_decimal::Decimal;

use crate::money::percent_of;
use crate::serde_util::named_enum;

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum TaxMode {
        #[default]
        NoTax = 0,
        FlatTax = 1,
        // TODO: progressive brackets keyed off Config::end_of_fy.
        AustralianComprehensive = 2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withholding {
    pub net: Decimal,
    pub tax: Decimal,
}

/// Split a gross inflow into the net applied and the tax withheld.
/// Losses and outflows are never taxed.
pub fn withhold(mode: TaxMode, tax_percent: Decimal, gross: Decimal) -> Withholding {
    let tax = match mode {
        TaxMode::FlatTax if gross > Decimal::ZERO => percent_of(gross, tax_percent),
        _ => Decimal::ZERO,
    };
    Withholding {
        net: gross - tax,
        tax,
    }
}
