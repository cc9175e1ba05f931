// src/present.rs
//! Presentation sink: labeled `(x, y)` series handed to whoever draws them.

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};

use crate::config::options::ExportFormat;
use crate::core::sanitize::sanitize_file_stem;
use crate::metrics::{AlignedPoint, Point, RatePoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XAxis {
    Date,
    DayOffset,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum XValue {
    Date(NaiveDate),
    Day(i64),
}

impl XValue {
    /// Plot coordinate: day number (from the common era) for dates.
    pub fn as_f64(&self) -> f64 {
        match self {
            XValue::Date(d) => d.num_days_from_ce() as f64,
            XValue::Day(n) => *n as f64,
        }
    }

    pub fn label(&self) -> String {
        match self {
            XValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            XValue::Day(n) => n.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(XValue, f64)>,
}

impl Series {
    /// Dated points; unknown values are left out.
    pub fn dated(label: impl Into<String>, points: &[Point]) -> Self {
        Self {
            label: label.into(),
            points: points
                .iter()
                .filter_map(|(d, v)| v.map(|v| (XValue::Date(*d), v as f64)))
                .collect(),
        }
    }

    /// Dated rate points.
    pub fn dated_rates(label: impl Into<String>, points: &[RatePoint]) -> Self {
        Self {
            label: label.into(),
            points: points.iter().filter_map(|(d, v)| v.map(|v| (XValue::Date(*d), v))).collect(),
        }
    }

    /// Day-offset points from day 0 on.
    pub fn aligned(label: impl Into<String>, points: &[AlignedPoint]) -> Self {
        Self {
            label: label.into(),
            points: points
                .iter()
                .filter(|p| p.day >= 0)
                .filter_map(|p| p.value.map(|v| (XValue::Day(p.day), v as f64)))
                .collect(),
        }
    }

    /// Day-offset rate points from day 0 on; `days` gives the offset of each date.
    pub fn aligned_rates(label: impl Into<String>, points: &[RatePoint], days: &[AlignedPoint]) -> Self {
        Self {
            label: label.into(),
            points: points
                .iter()
                .zip(days)
                .filter(|(_, a)| a.day >= 0)
                .filter_map(|((_, v), a)| v.map(|v| (XValue::Day(a.day), v)))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_axis: XAxis,
    pub series: Vec<Series>,
}

impl Chart {
    pub fn new(title: impl Into<String>, x_axis: XAxis) -> Self {
        Self { title: title.into(), x_axis, series: Vec::new() }
    }

    pub fn push(&mut self, series: Series) {
        if series.points.is_empty() {
            logd!("{}: `{}` has no points, skipped", self.title, series.label);
            return;
        }
        self.series.push(series);
    }
}

/// Consumer of finished charts. Rendering failures stay inside the sink.
pub trait ChartSink {
    fn show(&mut self, chart: &Chart);
}

/// Writes each chart as a long-format table (`Series, X, Y`), one file per chart.
pub struct TableChartSink {
    dir: PathBuf,
    format: ExportFormat,
    pub written: Vec<PathBuf>,
}

impl TableChartSink {
    pub fn new(dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self { dir: dir.into(), format, written: Vec::new() }
    }

    fn write(&self, chart: &Chart) -> crate::error::Result<PathBuf> {
        let stem = sanitize_file_stem(&chart.title, "chart");
        let path = self.dir.join(format!("{stem}.{}", self.format.ext()));
        let x = match chart.x_axis {
            XAxis::Date => "Date",
            XAxis::DayOffset => "Day",
        };
        let rows: Vec<Vec<String>> = chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|(xv, y)| vec![s.label.clone(), xv.label(), y.to_string()]))
            .collect();
        crate::csv::write_table(&path, &strings!["Series", x, "Value"], &rows, self.format.delim())?;
        Ok(path)
    }
}

impl ChartSink for TableChartSink {
    fn show(&mut self, chart: &Chart) {
        match self.write(chart) {
            Ok(p) => {
                logf!("chart `{}` -> {}", chart.title, p.display());
                self.written.push(p);
            }
            Err(e) => loge!("chart `{}`: {e}", chart.title),
        }
    }
}

/// Keeps charts in memory (GUI and tests).
#[derive(Default)]
pub struct ChartBook {
    pub charts: Vec<Chart>,
}

impl ChartSink for ChartBook {
    fn show(&mut self, chart: &Chart) {
        self.charts.push(chart.clone());
    }
}
