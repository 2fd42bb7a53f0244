//! Standalone dashboard export: an HTML page drawing every chart with ECharts,
//! or the raw dashboard as JSON.

use std::path::Path;

use cori_core::chart_option;
use cori_types::{Dashboard, KpiTile, Panel};

const ECHARTS_CDN: &str = "https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn tiles_html(tiles: &[KpiTile]) -> String {
    let cells: String = tiles
        .iter()
        .map(|t| {
            format!(
                "<div class=\"tile\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
                escape(&t.label),
                escape(&t.value)
            )
        })
        .collect();
    format!("<div class=\"tiles\">{cells}</div>\n")
}

/// Chart containers plus the script lines that fill them.
struct Charts {
    html: String,
    script: String,
    count: usize,
}

impl Charts {
    fn new() -> Self {
        Self {
            html: String::new(),
            script: String::new(),
            count: 0,
        }
    }

    fn push(&mut self, panel: &Panel) {
        match panel {
            Panel::NoData { message } => {
                self.html
                    .push_str(&format!("<p class=\"no-data\">{}</p>\n", escape(message)));
            }
            Panel::Chart(spec) => {
                let id = format!("chart-{}", self.count);
                self.count += 1;
                self.html
                    .push_str(&format!("<div class=\"chart\" id=\"{id}\"></div>\n"));
                // JSON is valid JS; escape "</" so chart titles cannot close the script tag
                let option = chart_option(spec).to_string().replace("</", "<\\/");
                self.script.push_str(&format!(
                    "echarts.init(document.getElementById('{id}')).setOption({option});\n"
                ));
            }
        }
    }
}

pub fn html_document(dashboard: &Dashboard) -> String {
    let mut charts = Charts::new();
    let mut body = String::new();

    body.push_str("<h2>Visão Geral</h2>\n");
    body.push_str(&tiles_html(&dashboard.overview.percent_tiles));
    body.push_str(&tiles_html(&dashboard.overview.production_tiles));
    charts.push(&dashboard.overview.daily_average);
    charts.push(&dashboard.overview.monthly_total);
    body.push_str(&std::mem::take(&mut charts.html));

    body.push_str("<h2>Séries</h2>\n");
    for panel in dashboard.series.panels() {
        charts.push(panel);
    }
    body.push_str(&std::mem::take(&mut charts.html));

    body.push_str(&format!("<h2>{}</h2>\n", escape(&dashboard.table.title)));
    body.push_str(&table_html(dashboard));

    let month = dashboard
        .selection
        .month
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{ECHARTS_CDN}"></script>
<style>
body {{ font-family: sans-serif; margin: 24px; }}
.tiles {{ display: flex; gap: 12px; margin-bottom: 12px; }}
.tile {{ border: 1px solid #ccc; border-radius: 6px; padding: 8px 16px; text-align: center; }}
.tile .value {{ font-size: 1.6em; font-weight: bold; }}
.chart {{ width: 100%; height: 420px; }}
table {{ border-collapse: collapse; font-size: 0.85em; }}
td, th {{ border: 1px solid #ddd; padding: 2px 6px; text-align: right; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>Mês: {month}</p>
{body}<script>
{script}</script>
</body>
</html>
"#,
        title = escape(&dashboard.title),
        script = charts.script,
    )
}

fn table_html(dashboard: &Dashboard) -> String {
    let rows = &dashboard.table.rows;
    if rows.is_empty() {
        return "<p class=\"no-data\">Sem linhas para o mês selecionado.</p>\n".to_string();
    }
    let header: String = cori_types::TableRow::COLUMNS
        .iter()
        .map(|c| format!("<th>{c}</th>"))
        .collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let measures: String = row
                .measures()
                .iter()
                .map(|v| format!("<td>{}</td>", v.map(|v| v.to_string()).unwrap_or_default()))
                .collect();
            format!(
                "<tr><td>{}</td><td>{}</td>{measures}</tr>\n",
                escape(&row.inicio),
                escape(row.linha.as_deref().unwrap_or(""))
            )
        })
        .collect();
    format!("<table>\n<tr>{header}</tr>\n{body}</table>\n")
}

/// Write the dashboard to `path` as HTML, or as pretty JSON when `json` is set.
pub fn write(dashboard: &Dashboard, path: &Path, json: bool) -> Result<(), String> {
    let contents = if json {
        serde_json::to_string_pretty(dashboard).map_err(|e| e.to_string())?
    } else {
        html_document(dashboard)
    };
    std::fs::write(path, contents)
        .map_err(|e| format!("Failed to write {}: {}\n", path.display(), e))?;
    tracing::info!(path = %path.display(), json, "Dashboard exported");
    Ok(())
}
