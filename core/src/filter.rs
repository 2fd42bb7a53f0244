//! Cascading line → year → month filters.
//!
//! `apply_filters` is a pure function of the record set and the requested
//! selection. Each step narrows the previous step's output and supplies the
//! options for the next selector, so a selector never offers a value with no
//! backing records.

use std::collections::BTreeSet;

use cori_types::{MonthKey, SelectionSummary, YearKey};

use crate::record::Record;

/// What the user asked for. Unset / unavailable year and month fall back to
/// the most recent value on offer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// Empty means every line passes
    pub lines: Vec<String>,
    pub year: Option<YearKey>,
    pub month: Option<MonthKey>,
}

/// Output of the filter chain: the record set after each step plus the
/// selector options and the selection actually in effect.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Every loaded record, before any filter
    pub all: Vec<Record>,
    pub available_lines: Vec<String>,
    pub lines: Vec<String>,
    pub by_line: Vec<Record>,
    pub available_years: Vec<YearKey>,
    pub year: Option<YearKey>,
    pub by_year: Vec<Record>,
    pub available_months: Vec<MonthKey>,
    pub month: Option<MonthKey>,
    pub by_month: Vec<Record>,
}

impl FilterOutcome {
    pub fn summary(&self) -> SelectionSummary {
        SelectionSummary {
            available_lines: self.available_lines.clone(),
            lines: self.lines.clone(),
            available_years: self.available_years.clone(),
            year: self.year,
            available_months: self.available_months.clone(),
            month: self.month,
        }
    }
}

pub fn apply_filters(records: &[Record], selection: &FilterSelection) -> FilterOutcome {
    let available_lines = distinct_lines(records);
    let by_line = filter_lines(records, &selection.lines);

    let available_years = distinct_years(&by_line);
    let year = resolve_choice(selection.year, &available_years);
    let by_year = match year {
        Some(year) => by_line.iter().filter(|r| r.year() == year).cloned().collect(),
        None => Vec::new(),
    };

    let available_months = distinct_months(&by_year);
    let month = resolve_choice(selection.month, &available_months);
    let by_month = match month {
        Some(month) => by_year.iter().filter(|r| r.month() == month).cloned().collect(),
        None => Vec::new(),
    };

    FilterOutcome {
        all: records.to_vec(),
        available_lines,
        lines: selection.lines.clone(),
        by_line,
        available_years,
        year,
        by_year,
        available_months,
        month,
        by_month,
    }
}

/// Sorted distinct line ids; records without a line are not offered.
pub fn distinct_lines(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.linha.as_deref())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Records whose line is in `lines`. An empty selection passes everything.
pub fn filter_lines(records: &[Record], lines: &[String]) -> Vec<Record> {
    if lines.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| r.linha.as_ref().is_some_and(|l| lines.contains(l)))
        .cloned()
        .collect()
}

pub fn distinct_years(records: &[Record]) -> Vec<YearKey> {
    records
        .iter()
        .map(Record::year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn distinct_months(records: &[Record]) -> Vec<MonthKey> {
    records
        .iter()
        .map(Record::month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Requested value if it is on offer, otherwise the latest option.
fn resolve_choice<T: Copy + Ord>(requested: Option<T>, options: &[T]) -> Option<T> {
    match requested {
        Some(value) if options.contains(&value) => Some(value),
        _ => options.last().copied(),
    }
}
