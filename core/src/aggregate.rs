//! Monthly aggregation and derived production metrics.
//!
//! Every reduction here goes through [`safe_numeric_reduce`]: absent and
//! non-finite values are skipped, and an input with no valid values yields the
//! caller's default instead of an error or NaN. Ratios substitute 0 for a zero
//! denominator.

use std::collections::BTreeMap;

use cori_types::{
    MonthKey, MonthTotals, MonthlyMinutes, MonthlyOee, MonthlyProduction, Productivity,
    ProductivityRow,
};

use crate::record::{Measure, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    Sum,
    Mean,
}

/// Reduce the valid values of `values` with `op`; `default` when none are valid.
pub fn safe_numeric_reduce<I>(values: I, op: Reduce, default: f64) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut count = 0usize;
    let mut acc = 0.0;
    for value in values.into_iter().flatten().filter(|v| v.is_finite()) {
        count += 1;
        acc += value;
    }
    if count == 0 {
        return default;
    }
    let result = match op {
        Reduce::Mean => acc / count as f64,
        Reduce::Sum => acc,
    };
    if result.is_finite() { result } else { default }
}

/// Mean of `measure` over `records`; 0.0 when no record carries a value.
pub fn mean(records: &[Record], measure: Measure) -> f64 {
    safe_numeric_reduce(records.iter().map(|r| r.measure(measure)), Reduce::Mean, 0.0)
}

/// Sum of `measure` over `records`; 0.0 on empty input.
pub fn sum(records: &[Record], measure: Measure) -> f64 {
    safe_numeric_reduce(records.iter().map(|r| r.measure(measure)), Reduce::Sum, 0.0)
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        let value = numerator / denominator;
        if value.is_finite() { value } else { 0.0 }
    } else {
        0.0
    }
}

/// Records grouped by calendar month, in chronological order.
pub fn group_by_month(records: &[Record]) -> BTreeMap<MonthKey, Vec<&Record>> {
    let mut groups: BTreeMap<MonthKey, Vec<&Record>> = BTreeMap::new();
    for record in records {
        groups.entry(record.month()).or_default().push(record);
    }
    groups
}

fn group_reduce(group: &[&Record], measure: Measure, op: Reduce) -> f64 {
    safe_numeric_reduce(group.iter().map(|r| r.measure(measure)), op, 0.0)
}

/// Mean and total production per month.
pub fn monthly_production(records: &[Record]) -> Vec<MonthlyProduction> {
    group_by_month(records)
        .into_iter()
        .map(|(month, group)| MonthlyProduction {
            month,
            month_label: month.label(),
            producao_media: group_reduce(&group, Measure::Producao, Reduce::Mean),
            producao_total: group_reduce(&group, Measure::Producao, Reduce::Sum),
        })
        .collect()
}

/// Mean OEE per month. Months without any OEE reading are left out.
pub fn monthly_oee(records: &[Record]) -> Vec<MonthlyOee> {
    group_by_month(records)
        .into_iter()
        .filter(|(_, group)| group.iter().any(|r| r.measure(Measure::Oee).is_some()))
        .map(|(month, group)| MonthlyOee {
            month,
            month_label: month.label(),
            oee: group_reduce(&group, Measure::Oee, Reduce::Mean),
        })
        .collect()
}

/// Running, stopped and available minutes summed per month.
pub fn monthly_minutes(records: &[Record]) -> Vec<MonthlyMinutes> {
    group_by_month(records)
        .into_iter()
        .map(|(month, group)| MonthlyMinutes {
            month,
            month_label: month.label(),
            produzindo: group_reduce(&group, Measure::Produzindo, Reduce::Sum),
            parada: group_reduce(&group, Measure::Parada, Reduce::Sum),
            disponivel: group_reduce(&group, Measure::Disponivel, Reduce::Sum),
        })
        .collect()
}

/// Production against running time per month, with the global reference rate
/// used to express hours as kg-equivalent.
pub fn productivity(records: &[Record]) -> Productivity {
    let mut rows: Vec<ProductivityRow> = group_by_month(records)
        .into_iter()
        .map(|(month, group)| {
            let producao_kg = group_reduce(&group, Measure::Producao, Reduce::Sum);
            let tempo_min = group_reduce(&group, Measure::Produzindo, Reduce::Sum);
            let horas = tempo_min / 60.0;
            ProductivityRow {
                month,
                month_label: month.label(),
                producao_kg,
                tempo_min,
                horas,
                kg_per_hour: ratio(producao_kg, horas),
                minutes_per_kg: ratio(tempo_min, producao_kg),
                tempo_kg_equiv: 0.0,
            }
        })
        .collect();

    let total_kg: f64 = rows.iter().map(|r| r.producao_kg).sum();
    let total_h: f64 = rows.iter().map(|r| r.horas).sum();
    let taxa_ref_kgh = ratio(total_kg, total_h);
    for row in &mut rows {
        row.tempo_kg_equiv = row.horas * taxa_ref_kgh;
    }

    Productivity { rows, taxa_ref_kgh }
}

/// Sums over the selected month's records.
pub fn month_totals(records: &[Record]) -> MonthTotals {
    MonthTotals {
        producao: sum(records, Measure::Producao),
        rejeito: sum(records, Measure::Rejeito),
        produzindo: sum(records, Measure::Produzindo),
        parada: sum(records, Measure::Parada),
    }
}
