//! Recurring bills: period arithmetic, the store capability the generator
//! needs, and the generator itself.

mod frequency;
pub mod materializer;
pub mod store;

use serde::{Deserialize, Serialize};
use time::Date;

pub use frequency::{add_months, Frequency};
pub use materializer::{MaterializeReport, RecurringMaterializer};
pub use store::{BillStore, Series};

/// How far ahead occurrences are generated, in calendar months from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Horizon {
    months: u32,
}

impl Horizon {
    pub const DEFAULT_MONTHS: u32 = 12;

    pub fn months_ahead(months: u32) -> Self {
        Self { months }
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    /// Last due date (inclusive) that may be generated when "today" is `today`.
    pub fn end_date(&self, today: Date) -> Date {
        add_months(today, self.months).unwrap_or(Date::MAX)
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self::months_ahead(Self::DEFAULT_MONTHS)
    }
}

/// Which rows count as occurrences of a recurring template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesMatch {
    /// The template row plus rows whose `template_id` points at it.
    #[default]
    Template,
    /// Any row sharing (user, creditor, name, amount) with the template.
    Fields,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown series match mode {0:?}, expected \"template\" or \"fields\"")]
pub struct UnknownSeriesMatch(String);

impl std::str::FromStr for SeriesMatch {
    type Err = UnknownSeriesMatch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "template" => Ok(SeriesMatch::Template),
            "fields" => Ok(SeriesMatch::Fields),
            _ => Err(UnknownSeriesMatch(s.to_string())),
        }
    }
}
