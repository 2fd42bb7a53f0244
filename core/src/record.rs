//! Record model and best-effort coercion from raw rows.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use cori_types::{MonthKey, TableRow, YearKey};

/// Timestamp layouts accepted for `inicio`, tried in order.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Numeric measures carried by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Producao,
    Rejeito,
    Oee,
    Performance,
    Disponibilidade,
    Qualidade,
    Produzindo,
    Parada,
    Disponivel,
}

impl Measure {
    pub const ALL: [Measure; 9] = [
        Measure::Producao,
        Measure::Rejeito,
        Measure::Oee,
        Measure::Performance,
        Measure::Disponibilidade,
        Measure::Qualidade,
        Measure::Produzindo,
        Measure::Parada,
        Measure::Disponivel,
    ];

    /// Column name in the source table
    pub fn column(self) -> &'static str {
        match self {
            Measure::Producao => "producao",
            Measure::Rejeito => "rejeito",
            Measure::Oee => "oee",
            Measure::Performance => "performance",
            Measure::Disponibilidade => "disponibilidade",
            Measure::Qualidade => "qualidade",
            Measure::Produzindo => "produzindo",
            Measure::Parada => "parada",
            Measure::Disponivel => "disponivel",
        }
    }
}

/// A row exactly as a source delivers it: every column as optional text.
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct RawRecord {
    pub inicio: Option<String>,
    pub linha: Option<String>,
    pub producao: Option<String>,
    pub rejeito: Option<String>,
    pub oee: Option<String>,
    pub performance: Option<String>,
    pub disponibilidade: Option<String>,
    pub qualidade: Option<String>,
    pub produzindo: Option<String>,
    pub parada: Option<String>,
    pub disponivel: Option<String>,
}

impl RawRecord {
    pub fn measure(&self, measure: Measure) -> Option<&str> {
        let cell = match measure {
            Measure::Producao => &self.producao,
            Measure::Rejeito => &self.rejeito,
            Measure::Oee => &self.oee,
            Measure::Performance => &self.performance,
            Measure::Disponibilidade => &self.disponibilidade,
            Measure::Qualidade => &self.qualidade,
            Measure::Produzindo => &self.produzindo,
            Measure::Parada => &self.parada,
            Measure::Disponivel => &self.disponivel,
        };
        cell.as_deref()
    }
}

/// One observation period for a line. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub inicio: NaiveDateTime,
    pub linha: Option<String>,
    measures: [Option<f64>; 9],
}

impl Record {
    /// Record with no line and no measures
    pub fn at(inicio: NaiveDateTime) -> Self {
        Self {
            inicio,
            linha: None,
            measures: [None; 9],
        }
    }

    pub fn with_line(mut self, linha: impl Into<String>) -> Self {
        self.linha = Some(linha.into());
        self
    }

    pub fn with_measure(mut self, measure: Measure, value: f64) -> Self {
        self.measures[measure as usize] = Some(value);
        self
    }

    /// Convert a raw row. Returns None when `inicio` is missing or unparseable.
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        let inicio = parse_timestamp(raw.inicio.as_deref()?)?;
        let linha = raw
            .linha
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        let mut measures = [None; 9];
        for measure in Measure::ALL {
            measures[measure as usize] = raw.measure(measure).and_then(coerce_numeric);
        }
        Some(Self {
            inicio,
            linha,
            measures,
        })
    }

    pub fn measure(&self, measure: Measure) -> Option<f64> {
        self.measures[measure as usize]
    }

    pub fn year(&self) -> YearKey {
        YearKey(self.inicio.year())
    }

    pub fn month(&self) -> MonthKey {
        MonthKey {
            year: self.inicio.year(),
            month: self.inicio.month(),
        }
    }

    pub fn to_table_row(&self) -> TableRow {
        TableRow {
            inicio: self.inicio.format("%Y-%m-%d %H:%M:%S").to_string(),
            linha: self.linha.clone(),
            producao: self.measure(Measure::Producao),
            rejeito: self.measure(Measure::Rejeito),
            oee: self.measure(Measure::Oee),
            performance: self.measure(Measure::Performance),
            disponibilidade: self.measure(Measure::Disponibilidade),
            qualidade: self.measure(Measure::Qualidade),
            produzindo: self.measure(Measure::Produzindo),
            parada: self.measure(Measure::Parada),
            disponivel: self.measure(Measure::Disponivel),
        }
    }
}

/// Parse a timestamp cell. RFC 3339 offsets are dropped, keeping wall time.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_local());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Best-effort numeric coercion. Accepts a decimal comma; anything that does
/// not yield a finite number is treated as absent.
pub fn coerce_numeric(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let value = match text.parse::<f64>() {
        Ok(v) => v,
        Err(_) if text.matches(',').count() == 1 && !text.contains('.') => {
            text.replace(',', ".").parse::<f64>().ok()?
        }
        Err(_) => return None,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(inicio: &str) -> RawRecord {
        RawRecord {
            inicio: Some(inicio.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_database_and_iso_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-01-15 08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T08:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T08:30:00-04:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-15"),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("ontem"), None);
        assert_eq!(parse_timestamp("2024-13-01 00:00:00"), None);
    }

    #[test]
    fn coercion_is_best_effort() {
        assert_eq!(coerce_numeric("72.4"), Some(72.4));
        assert_eq!(coerce_numeric(" 100 "), Some(100.0));
        assert_eq!(coerce_numeric("72,5"), Some(72.5));
        assert_eq!(coerce_numeric("1,234.5"), None);
        assert_eq!(coerce_numeric("n/a"), None);
        assert_eq!(coerce_numeric("NaN"), None);
        assert_eq!(coerce_numeric("inf"), None);
        assert_eq!(coerce_numeric(""), None);
    }

    #[test]
    fn raw_rows_without_timestamp_are_dropped() {
        assert!(Record::from_raw(&RawRecord::default()).is_none());
        assert!(Record::from_raw(&raw("not a date")).is_none());
        assert!(Record::from_raw(&raw("2024-02-01 00:00:00")).is_some());
    }

    #[test]
    fn raw_conversion_keeps_valid_measures_only() {
        let mut row = raw("2024-02-01 06:00:00");
        row.linha = Some("  ".to_string());
        row.producao = Some("1500".to_string());
        row.oee = Some("abc".to_string());

        let record = Record::from_raw(&row).unwrap();
        assert_eq!(record.linha, None);
        assert_eq!(record.measure(Measure::Producao), Some(1500.0));
        assert_eq!(record.measure(Measure::Oee), None);
        assert_eq!(record.month(), MonthKey { year: 2024, month: 2 });
        assert_eq!(record.year(), YearKey(2024));
    }
}
