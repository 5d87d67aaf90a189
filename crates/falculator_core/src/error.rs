use std::fmt;

use crate::model::ids::ItemId;

/// Conditions sanitize cannot auto-correct; the simulation refuses to
/// start while any is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    /// More than one item claims `is_main_savings`.
    MultipleMainSavings { count: usize },
    /// A cash-transfer event targets a shares item whose unit price is
    /// zero; the unit math would divide by zero at runtime.
    ZeroUnitPrice { item: ItemId },
}

impl fmt::Display for SanitizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanitizeError::MultipleMainSavings { count } => {
                write!(f, "{count} items claim main savings; exactly one is required")
            }
            SanitizeError::ZeroUnitPrice { item } => {
                write!(f, "shares item {item} has a zero unit price but is a transfer target")
            }
        }
    }
}

impl std::error::Error for SanitizeError {}

/// Why a simulator could not be constructed.
#[derive(Debug, Clone)]
pub enum SimulatorError {
    Sanitize(Vec<SanitizeError>),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::Sanitize(errors) => {
                write!(f, "config failed sanitization: ")?;
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SimulatorError {}

/// Failures loading or saving a config document.
#[derive(Debug)]
pub enum ConfigIoError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ConfigIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIoError::Io(e) => write!(f, "config io error: {e}"),
            ConfigIoError::Json(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigIoError::Io(e) => Some(e),
            ConfigIoError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigIoError {
    fn from(e: std::io::Error) -> Self {
        ConfigIoError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigIoError {
    fn from(e: serde_json::Error) -> Self {
        ConfigIoError::Json(e)
    }
}
