//! Dashboard assembly: turns a filter outcome into the three views.
//!
//! Monthly charts cover the line-filtered set (every year), tiles and the
//! table cover the selected month. Empty inputs produce "no data" panels.

use cori_types::{
    AxisSpec, ChartKind, ChartSpec, Dashboard, KpiTile, MonthlyMinutes, OverviewView, Panel,
    SeriesSpec, SeriesView, TableView,
};

use crate::aggregate::{
    mean, month_totals, monthly_minutes, monthly_oee, monthly_production, productivity,
};
use crate::filter::FilterOutcome;
use crate::format::{fmt_decimal, fmt_int, fmt_pct};
use crate::record::Measure;

/// Lower bound for the daily-average axis so small months do not look full
const DAILY_AVERAGE_AXIS_FLOOR: f64 = 20_000.0;
const MONTHLY_TOTAL_AXIS_FLOOR: f64 = 300_000.0;
const AXIS_HEADROOM: f64 = 1.2;
const HOURS_AXIS_MAX: f64 = 600.0;
const MONTH_AXIS: &str = "Mês";

pub fn build_dashboard(outcome: &FilterOutcome, title: &str) -> Dashboard {
    Dashboard {
        title: title.to_string(),
        selection: outcome.summary(),
        overview: build_overview(outcome),
        series: build_series(outcome),
        table: build_table(outcome),
    }
}

fn axis_max(floor: f64, series: &SeriesSpec) -> f64 {
    floor.max(series.max_value() * AXIS_HEADROOM)
}

pub fn build_overview(outcome: &FilterOutcome) -> OverviewView {
    let month = &outcome.by_month;
    let percent_tiles = [
        ("OEE", Measure::Oee),
        ("PERFORMANCE", Measure::Performance),
        ("DISPONIBILIDADE", Measure::Disponibilidade),
        ("QUALIDADE", Measure::Qualidade),
    ]
    .into_iter()
    .map(|(label, measure)| KpiTile::new(label, fmt_pct(Some(mean(month, measure)))))
    .collect();

    let production_tiles = vec![
        KpiTile::new(
            "PRODUÇÃO (média no mês)",
            fmt_int(mean(month, Measure::Producao)),
        ),
        KpiTile::new(
            "REJEITO (média no mês)",
            fmt_int(mean(month, Measure::Rejeito)),
        ),
    ];

    let monthly = monthly_production(&outcome.by_line);
    let categories: Vec<String> = monthly.iter().map(|m| m.month_label.clone()).collect();

    let (daily_average, monthly_total) = if monthly.is_empty() {
        (
            Panel::no_data("Sem dados para Média Diária da Produção por Mês."),
            Panel::no_data("Sem dados para Total Mensal da Produção."),
        )
    } else {
        let media = SeriesSpec::bar(
            "Média Diária",
            monthly.iter().map(|m| m.producao_media).collect(),
            0,
        );
        let total = SeriesSpec::bar(
            "Total Mensal",
            monthly.iter().map(|m| m.producao_total).collect(),
            0,
        );
        let media_axis = AxisSpec::titled("Média Diária")
            .with_range(0.0, axis_max(DAILY_AVERAGE_AXIS_FLOOR, &media));
        let total_axis = AxisSpec::titled("Total Mensal")
            .with_range(0.0, axis_max(MONTHLY_TOTAL_AXIS_FLOOR, &total));
        (
            Panel::Chart(ChartSpec {
                title: "Média Diária da Produção por Mês".to_string(),
                kind: ChartKind::Bar,
                categories: categories.clone(),
                series: vec![media],
                x_axis: AxisSpec::titled(MONTH_AXIS),
                y_axis: media_axis,
                y2_axis: None,
            }),
            Panel::Chart(ChartSpec {
                title: "Total Mensal da Produção".to_string(),
                kind: ChartKind::Bar,
                categories,
                series: vec![total],
                x_axis: AxisSpec::titled(MONTH_AXIS),
                y_axis: total_axis,
                y2_axis: None,
            }),
        )
    };

    OverviewView {
        percent_tiles,
        production_tiles,
        daily_average,
        monthly_total,
    }
}

pub fn build_series(outcome: &FilterOutcome) -> SeriesView {
    let month_label = outcome.month.map(|m| m.to_string()).unwrap_or_default();

    SeriesView {
        quality_pie: quality_pie(outcome, &month_label),
        oee_trend: oee_trend(outcome),
        running_vs_stopped: minutes_chart(
            outcome,
            "Total de Máquina Rodando vs Parada (min)",
            "Máquina Parada",
            |m: &MonthlyMinutes| m.parada,
            "Sem dados para Rodando vs Parada.",
        ),
        available_vs_running: minutes_chart(
            outcome,
            "Total de Máquina Disponível vs Rodando (min)",
            "Máquina Disponível",
            |m: &MonthlyMinutes| m.disponivel,
            "Sem dados para Disponível vs Rodando.",
        ),
        production_vs_time: production_vs_time(outcome),
        productivity_rate: productivity_rate(outcome),
        equivalent_time: equivalent_time(outcome),
    }
}

fn quality_pie(outcome: &FilterOutcome, month_label: &str) -> Panel {
    let totals = month_totals(&outcome.by_month);
    if totals.producao == 0.0 && totals.rejeito == 0.0 {
        return Panel::no_data("Sem dados para Produção vs Rejeito.");
    }
    Panel::Chart(ChartSpec {
        title: format!("QUALIDADE - Prod x Rejeito - {month_label}"),
        kind: ChartKind::Pie { hole: 0.4 },
        categories: vec!["Produção".to_string(), "Rejeito".to_string()],
        series: vec![SeriesSpec::bar(
            "Produção vs Rejeito",
            vec![totals.producao, totals.rejeito],
            0,
        )],
        x_axis: AxisSpec::default(),
        y_axis: AxisSpec::default(),
        y2_axis: None,
    })
}

fn oee_trend(outcome: &FilterOutcome) -> Panel {
    let oee = monthly_oee(&outcome.by_line);
    if oee.is_empty() {
        return Panel::no_data("Sem dados para Eficiência Mensal (OEE%).");
    }
    Panel::Chart(ChartSpec {
        title: "Eficiência Mensal da Moagem (OEE%)".to_string(),
        kind: ChartKind::Line,
        categories: oee.iter().map(|m| m.month_label.clone()).collect(),
        series: vec![SeriesSpec::line(
            "OEE (%)",
            oee.iter().map(|m| m.oee).collect(),
            0,
        )],
        x_axis: AxisSpec::titled(MONTH_AXIS),
        y_axis: AxisSpec::titled("OEE (%)").with_range(0.0, 100.0),
        y2_axis: None,
    })
}

/// Line chart of running minutes against one other minute column, over every
/// loaded record regardless of the line selection.
fn minutes_chart(
    outcome: &FilterOutcome,
    title: &str,
    other_name: &str,
    other_value: fn(&MonthlyMinutes) -> f64,
    empty_message: &str,
) -> Panel {
    let minutes = monthly_minutes(&outcome.all);
    if minutes.is_empty() {
        return Panel::no_data(empty_message);
    }
    Panel::Chart(ChartSpec {
        title: title.to_string(),
        kind: ChartKind::Line,
        categories: minutes.iter().map(|m| m.month_label.clone()).collect(),
        series: vec![
            SeriesSpec::line(
                "Máquina Rodando",
                minutes.iter().map(|m| m.produzindo).collect(),
                0,
            ),
            SeriesSpec::line(other_name, minutes.iter().map(other_value).collect(), 0),
        ],
        x_axis: AxisSpec::titled(MONTH_AXIS),
        y_axis: AxisSpec::titled("Minutos Totais"),
        y2_axis: None,
    })
}

fn production_vs_time(outcome: &FilterOutcome) -> Panel {
    let result = productivity(&outcome.by_line);
    if result.rows.is_empty() {
        return Panel::no_data("Sem dados para montar Produção x Tempo.");
    }
    Panel::Chart(ChartSpec {
        title: "Produção (kg) vs Tempo (h) por mês".to_string(),
        kind: ChartKind::Combo,
        categories: result.rows.iter().map(|r| r.month_label.clone()).collect(),
        series: vec![
            SeriesSpec::bar(
                "Produção (kg)",
                result.rows.iter().map(|r| r.producao_kg).collect(),
                0,
            ),
            SeriesSpec::line("Tempo (h)", result.rows.iter().map(|r| r.horas).collect(), 1)
                .on_secondary_axis(),
        ],
        x_axis: AxisSpec::titled(MONTH_AXIS),
        y_axis: AxisSpec::titled("Produção (kg)"),
        y2_axis: Some(AxisSpec::titled("Tempo (h)").with_range(0.0, HOURS_AXIS_MAX)),
    })
}

fn productivity_rate(outcome: &FilterOutcome) -> Panel {
    let result = productivity(&outcome.by_line);
    if result.rows.is_empty() {
        return Panel::no_data("Sem dados para Produtividade (kg/h).");
    }
    let rate = SeriesSpec::bar(
        "Produtividade (kg/h)",
        result.rows.iter().map(|r| r.kg_per_hour).collect(),
        2,
    );
    Panel::Chart(ChartSpec {
        title: "Produtividade (kg/h) por mês".to_string(),
        kind: ChartKind::Bar,
        categories: result.rows.iter().map(|r| r.month_label.clone()).collect(),
        series: vec![rate],
        x_axis: AxisSpec::titled(MONTH_AXIS),
        y_axis: AxisSpec::titled("Produtividade (kg/h)"),
        y2_axis: None,
    })
}

fn equivalent_time(outcome: &FilterOutcome) -> Panel {
    let result = productivity(&outcome.by_line);
    if result.rows.is_empty() {
        return Panel::no_data("Sem dados para montar Produção x Tempo.");
    }
    if result.taxa_ref_kgh == 0.0 {
        return Panel::no_data(
            "Sem taxa de referência (kg/h) para empilhar tempo como kg-equivalente.",
        );
    }
    Panel::Chart(ChartSpec {
        title: format!(
            "Produção real + Tempo/'kg-equivalente' (taxa ref: {} kg/h)",
            fmt_decimal(result.taxa_ref_kgh, 1)
        ),
        kind: ChartKind::StackedBar,
        categories: result.rows.iter().map(|r| r.month_label.clone()).collect(),
        series: vec![
            SeriesSpec::bar(
                "Produção (kg)",
                result.rows.iter().map(|r| r.producao_kg).collect(),
                0,
            ),
            SeriesSpec::bar(
                "Tempo (kg equivalente)",
                result.rows.iter().map(|r| r.tempo_kg_equiv).collect(),
                0,
            ),
        ],
        x_axis: AxisSpec::titled(MONTH_AXIS),
        y_axis: AxisSpec::titled("kg"),
        y2_axis: None,
    })
}

pub fn build_table(outcome: &FilterOutcome) -> TableView {
    let month = outcome
        .month
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string());
    TableView {
        title: format!("Detalhamento do mês selecionado: {month}"),
        rows: outcome.by_month.iter().map(|r| r.to_table_row()).collect(),
    }
}
