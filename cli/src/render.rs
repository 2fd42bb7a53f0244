//! Terminal rendering of dashboard views.

use cori_core::format::fmt_decimal;
use cori_types::{ChartKind, Dashboard, KpiTile, Panel, SelectionSummary, TableRow, TableView};
use tabled::builder::Builder;
use tabled::settings::Style;

fn rounded(builder: Builder) -> String {
    builder.build().with(Style::rounded()).to_string()
}

fn tiles(tiles: &[KpiTile]) -> String {
    let mut builder = Builder::default();
    builder.push_record(tiles.iter().map(|t| t.label.clone()));
    builder.push_record(tiles.iter().map(|t| t.value.clone()));
    rounded(builder)
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

pub fn selection(summary: &SelectionSummary) -> String {
    let years: Vec<String> = summary.available_years.iter().map(|y| y.to_string()).collect();
    let months: Vec<String> = summary.available_months.iter().map(|m| m.to_string()).collect();

    let mut builder = Builder::default();
    builder.push_record(["Filter", "Selected", "Available"]);
    builder.push_record([
        "Linha".to_string(),
        join_or(&summary.lines, "(all)"),
        join_or(&summary.available_lines, "-"),
    ]);
    builder.push_record([
        "Ano".to_string(),
        summary.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
        join_or(&years, "-"),
    ]);
    builder.push_record([
        "Mês".to_string(),
        summary.month.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
        join_or(&months, "-"),
    ]);
    rounded(builder)
}

pub fn panel(panel: &Panel) -> String {
    let spec = match panel {
        Panel::NoData { message } => return format!("{message}\n"),
        Panel::Chart(spec) => spec,
    };

    let mut builder = Builder::default();
    match spec.kind {
        ChartKind::Pie { .. } => {
            let values = spec.series.first().map(|s| s.values.as_slice()).unwrap_or(&[]);
            let total: f64 = values.iter().sum();
            builder.push_record(["", "Valor", "%"]);
            for (name, value) in spec.categories.iter().zip(values) {
                let share = if total > 0.0 { value / total * 100.0 } else { 0.0 };
                builder.push_record([name.clone(), fmt_decimal(*value, 0), fmt_decimal(share, 1)]);
            }
        }
        _ => {
            let mut header = vec![spec.x_axis.title.clone()];
            header.extend(spec.series.iter().map(|s| s.name.clone()));
            builder.push_record(header);
            for (i, category) in spec.categories.iter().enumerate() {
                let mut row = vec![category.clone()];
                row.extend(spec.series.iter().map(|s| {
                    s.values
                        .get(i)
                        .map(|v| fmt_decimal(*v, s.label_decimals as usize))
                        .unwrap_or_default()
                }));
                builder.push_record(row);
            }
        }
    }
    format!("{}\n{}\n", spec.title, rounded(builder))
}

pub fn overview(dashboard: &Dashboard) -> String {
    let month = dashboard
        .selection
        .month
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string());
    [
        format!("{} ({month})\n", dashboard.title),
        tiles(&dashboard.overview.percent_tiles),
        tiles(&dashboard.overview.production_tiles),
        panel(&dashboard.overview.daily_average),
        panel(&dashboard.overview.monthly_total),
    ]
    .join("\n")
}

pub fn series(dashboard: &Dashboard) -> String {
    dashboard
        .series
        .panels()
        .into_iter()
        .map(panel)
        .collect::<Vec<_>>()
        .join("\n")
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| fmt_decimal(v, 2)).unwrap_or_default()
}

fn table_record(row: &TableRow) -> Vec<String> {
    let mut record = vec![row.inicio.clone(), row.linha.clone().unwrap_or_default()];
    record.extend(row.measures().into_iter().map(cell));
    record
}

/// Month detail table, truncated to `limit` rows when given.
pub fn table(view: &TableView, limit: Option<usize>) -> String {
    if view.rows.is_empty() {
        return format!("{}\nSem linhas para o mês selecionado.\n", view.title);
    }
    let shown = limit.unwrap_or(view.rows.len()).min(view.rows.len());

    let mut builder = Builder::default();
    builder.push_record(TableRow::COLUMNS);
    for row in &view.rows[..shown] {
        builder.push_record(table_record(row));
    }

    let mut out = format!("{}\n{}\n", view.title, rounded(builder));
    if shown < view.rows.len() {
        out.push_str(&format!("({} of {} rows)\n", shown, view.rows.len()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cori_types::{AxisSpec, ChartSpec, SeriesSpec};

    fn row(inicio: &str, producao: f64) -> TableRow {
        TableRow {
            inicio: inicio.to_string(),
            linha: Some("A".to_string()),
            producao: Some(producao),
            rejeito: None,
            oee: Some(72.4),
            performance: None,
            disponibilidade: None,
            qualidade: None,
            produzindo: None,
            parada: None,
            disponivel: None,
        }
    }

    #[test]
    fn no_data_panel_prints_message() {
        let out = panel(&Panel::no_data("Sem dados para Eficiência Mensal (OEE%)."));
        assert_eq!(out, "Sem dados para Eficiência Mensal (OEE%).\n");
    }

    #[test]
    fn chart_panel_lists_categories_and_series() {
        let spec = ChartSpec {
            title: "Total Mensal da Produção".to_string(),
            kind: ChartKind::Bar,
            categories: vec!["Jan 2024".to_string()],
            series: vec![SeriesSpec::bar("Total Mensal", vec![1234567.0], 0)],
            x_axis: AxisSpec::titled("Mês"),
            y_axis: AxisSpec::titled("Total Mensal"),
            y2_axis: None,
        };
        let out = panel(&Panel::Chart(spec));
        assert!(out.starts_with("Total Mensal da Produção\n"));
        assert!(out.contains("Jan 2024"));
        assert!(out.contains("1,234,567"));
    }

    #[test]
    fn table_respects_limit() {
        let view = TableView {
            title: "Detalhamento do mês selecionado: 2024-01".to_string(),
            rows: vec![row("2024-01-03 06:00:00", 100.0), row("2024-01-17 06:00:00", 200.0)],
        };
        let out = table(&view, Some(1));
        assert!(out.contains("2024-01-03 06:00:00"));
        assert!(!out.contains("2024-01-17 06:00:00"));
        assert!(out.contains("(1 of 2 rows)"));
        assert!(out.contains("72.40"));
    }

    #[test]
    fn empty_table_has_title_and_notice() {
        let view = TableView {
            title: "Detalhamento do mês selecionado: -".to_string(),
            rows: Vec::new(),
        };
        assert!(table(&view, None).starts_with("Detalhamento do mês selecionado: -\n"));
    }
}
