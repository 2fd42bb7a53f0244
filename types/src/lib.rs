//! Shared view and configuration types for the Cori dashboard
//!
//! This crate contains serializable types that are shared between the
//! aggregation backend (cori-core) and the front ends (terminal, HTML export).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

mod chart;

pub use chart::{AxisSpec, ChartKind, ChartSpec, Panel, SeriesKind, SeriesSpec};

// ─────────────────────────────────────────────────────────────────────────────
// Period Keys
// ─────────────────────────────────────────────────────────────────────────────

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Calendar year a record falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearKey(pub i32);

impl fmt::Display for YearKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for YearKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(YearKey)
            .map_err(|_| format!("invalid year '{s}', expected YYYY"))
    }
}

/// Calendar year-month a record falls in. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    /// 1-based month number
    pub month: u32,
}

impl MonthKey {
    /// Returns None when `month` is outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year_key(&self) -> YearKey {
        YearKey(self.year)
    }

    /// Human-readable label used on chart axes, e.g. "Jan 2024"
    pub fn label(&self) -> String {
        let idx = (self.month.clamp(1, 12) - 1) as usize;
        format!("{} {}", MONTH_ABBR[idx], self.year)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || format!("invalid month '{s}', expected YYYY-MM");
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year = year.parse::<i32>().map_err(|_| err())?;
        let month = month.parse::<u32>().map_err(|_| err())?;
        MonthKey::new(year, month).ok_or_else(err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate Rows (produced by the aggregator, consumed by the views)
// ─────────────────────────────────────────────────────────────────────────────

/// Mean and total production for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProduction {
    pub month: MonthKey,
    pub month_label: String,
    pub producao_media: f64,
    pub producao_total: f64,
}

/// Mean OEE for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyOee {
    pub month: MonthKey,
    pub month_label: String,
    pub oee: f64,
}

/// Summed machine minutes for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMinutes {
    pub month: MonthKey,
    pub month_label: String,
    pub produzindo: f64,
    pub parada: f64,
    pub disponivel: f64,
}

/// Production against running time for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityRow {
    pub month: MonthKey,
    pub month_label: String,
    pub producao_kg: f64,
    pub tempo_min: f64,
    pub horas: f64,
    /// Throughput; 0 when no running time was recorded
    pub kg_per_hour: f64,
    /// Inverse throughput; 0 when nothing was produced
    pub minutes_per_kg: f64,
    /// Running hours expressed as kg at the reference rate
    pub tempo_kg_equiv: f64,
}

/// Monthly productivity plus the global reference rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Productivity {
    pub rows: Vec<ProductivityRow>,
    /// Total production over total running hours; 0 when no hours
    pub taxa_ref_kgh: f64,
}

/// Totals over the selected month, feeding the quality donut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthTotals {
    pub producao: f64,
    pub rejeito: f64,
    pub produzindo: f64,
    pub parada: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Dashboard Views
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiTile {
    pub label: String,
    pub value: String,
}

impl KpiTile {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Which selector values were offered and which ones are in effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub available_lines: Vec<String>,
    /// Empty means every line
    pub lines: Vec<String>,
    pub available_years: Vec<YearKey>,
    pub year: Option<YearKey>,
    pub available_months: Vec<MonthKey>,
    pub month: Option<MonthKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewView {
    /// OEE, PERFORMANCE, DISPONIBILIDADE, QUALIDADE
    pub percent_tiles: Vec<KpiTile>,
    /// Production and rejects, month means
    pub production_tiles: Vec<KpiTile>,
    pub daily_average: Panel,
    pub monthly_total: Panel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesView {
    pub quality_pie: Panel,
    pub oee_trend: Panel,
    pub running_vs_stopped: Panel,
    pub available_vs_running: Panel,
    pub production_vs_time: Panel,
    pub productivity_rate: Panel,
    pub equivalent_time: Panel,
}

impl SeriesView {
    pub fn panels(&self) -> [&Panel; 7] {
        [
            &self.quality_pie,
            &self.oee_trend,
            &self.running_vs_stopped,
            &self.available_vs_running,
            &self.production_vs_time,
            &self.productivity_rate,
            &self.equivalent_time,
        ]
    }
}

/// One raw record as shown in the table view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub inicio: String,
    pub linha: Option<String>,
    pub producao: Option<f64>,
    pub rejeito: Option<f64>,
    pub oee: Option<f64>,
    pub performance: Option<f64>,
    pub disponibilidade: Option<f64>,
    pub qualidade: Option<f64>,
    pub produzindo: Option<f64>,
    pub parada: Option<f64>,
    pub disponivel: Option<f64>,
}

impl TableRow {
    pub const COLUMNS: [&'static str; 11] = [
        "inicio",
        "linha",
        "producao",
        "rejeito",
        "oee",
        "performance",
        "disponibilidade",
        "qualidade",
        "produzindo",
        "parada",
        "disponivel",
    ];

    /// Measure cells in column order (after `inicio` and `linha`)
    pub fn measures(&self) -> [Option<f64>; 9] {
        [
            self.producao,
            self.rejeito,
            self.oee,
            self.performance,
            self.disponibilidade,
            self.qualidade,
            self.produzindo,
            self.parada,
            self.disponivel,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub title: String,
    pub rows: Vec<TableRow>,
}

/// Everything a front end needs to draw the three dashboard tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub title: String,
    pub selection: SelectionSummary,
    pub overview: OverviewView,
    pub series: SeriesView,
    pub table: TableView,
}

// ─────────────────────────────────────────────────────────────────────────────
// App Config
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_TABLE: &str = "tbl_oee_moinho";
pub const DEFAULT_FACTORY_NAME: &str = "Cori Ingredientes - Três Lagoas";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// MySQL connection URL. Kept out of source; `CORI_DB_URL` takes precedence.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Parquet or CSV export of the table, used instead of the database
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_factory_name")]
    pub factory_name: String,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_factory_name() -> String {
    DEFAULT_FACTORY_NAME.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            snapshot_path: None,
            table: default_table(),
            cache_ttl_secs: default_cache_ttl_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            factory_name: default_factory_name(),
        }
    }
}
