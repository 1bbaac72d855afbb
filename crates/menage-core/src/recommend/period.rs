//! Period resolution: which date ranges feed a recommendation

use chrono::NaiveDate;

use crate::models::{DateRange, PeriodClosure, YearMonth};

/// The historical periods selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriods {
    /// Month keys, most recent first
    pub months: Vec<YearMonth>,
    /// Date range analyzed for each month (same order as `months`)
    pub ranges: Vec<DateRange>,
}

impl ResolvedPeriods {
    /// Number of months actually analyzed; the divisor for monthly averages
    pub fn actual_months(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Resolve the `window` completed months before `selected`
///
/// The selected month itself is never included. A recorded closure for a
/// month replaces its calendar bounds. Months that end before
/// `history_start` (the user's first transaction) are dropped so a short
/// history is not averaged over empty months.
pub fn resolve_periods(
    window: u32,
    selected: YearMonth,
    closures: &[PeriodClosure],
    history_start: Option<NaiveDate>,
) -> ResolvedPeriods {
    let mut months = Vec::with_capacity(window as usize);
    let mut ranges = Vec::with_capacity(window as usize);

    let mut month = selected;
    for _ in 0..window {
        month = month.pred();

        let range = closures
            .iter()
            .find(|c| c.month == month)
            .map(PeriodClosure::range)
            .unwrap_or_else(|| month.calendar_range());

        if history_start.is_some_and(|first| range.end < first) {
            tracing::debug!(month = %month, "Skipping month before first transaction");
            continue;
        }

        months.push(month);
        ranges.push(range);
    }

    ResolvedPeriods { months, ranges }
}
