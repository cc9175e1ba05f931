// src/gui/chart.rs
//
// Builds the chart for the current selection and paints it. Building is
// pure (no egui) so it can be tested without a window.

use std::collections::BTreeSet;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Vec2};

use crate::error::Issue;
use crate::metrics::{column, daily_deltas, delta_column, per_capita};
use crate::present::{Chart, Series, XAxis};
use crate::reconcile::group_by_key;
use crate::record::{CanonicalRecord, EntityKey, Field};
use crate::reference::PopulationTable;

/// What the y axis shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Cumulative,
    Daily,
    PerMillion,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Cumulative, Mode::Daily, Mode::PerMillion];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Cumulative => "Cumulative",
            Mode::Daily => "Daily",
            Mode::PerMillion => "Daily per 1M",
        }
    }
}

const PALETTE: [Color32; 8] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(127, 127, 127),
];

/// Chart of `field` for every selected entity. Per-1M needs a population
/// table; entities missing from it come back as issues.
pub fn build(
    records: &[CanonicalRecord],
    selected: &BTreeSet<EntityKey>,
    field: Field,
    mode: Mode,
    population: Option<&PopulationTable>,
) -> (Chart, Vec<Issue>) {
    let mut chart = Chart::new(format!("{} {}", mode.label(), field.label().to_lowercase()), XAxis::Date);
    let mut issues = Vec::new();

    for (key, mut series) in group_by_key(records) {
        if !selected.contains(&key) {
            continue;
        }
        series.sort_by_key(|r| r.date);
        let label = key.to_string();
        match mode {
            Mode::Cumulative => chart.push(Series::dated(label, &column(&series, field))),
            Mode::Daily => chart.push(Series::dated(label, &delta_column(&daily_deltas(&series), field))),
            Mode::PerMillion => {
                let Some(pop) = population else {
                    issues.push(Issue::LookupMiss { entity: label, table: "population" });
                    continue;
                };
                match per_capita(&delta_column(&daily_deltas(&series), field), &key, pop) {
                    Ok(rates) => chart.push(Series::dated_rates(label, &rates)),
                    Err(issue) => issues.push(issue),
                }
            }
        }
    }
    (chart, issues)
}

fn bounds(chart: &Chart) -> Option<(f64, f64, f64, f64)> {
    let mut pts = chart.series.iter().flat_map(|s| s.points.iter());
    let (x0, y0) = pts.next().map(|(x, y)| (x.as_f64(), *y))?;
    let init = (x0, x0, y0.min(0.0), y0.max(0.0));
    let b = chart.series.iter().flat_map(|s| s.points.iter()).fold(init, |(a, b, c, d), (x, y)| {
        let x = x.as_f64();
        (a.min(x), b.max(x), c.min(*y), d.max(*y))
    });
    Some(b)
}

/// Paint `chart` into the remaining space of `ui`.
pub fn draw(ui: &mut egui::Ui, chart: &Chart, height: f32) {
    let size = Vec2::new(ui.available_width(), height);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let frame = response.rect;
    let visuals = ui.visuals();
    painter.rect_stroke(frame, 2.0, visuals.widgets.noninteractive.bg_stroke, StrokeKind::Inside);

    let Some((x_min, x_max, y_min, y_max)) = bounds(chart) else {
        painter.text(frame.center(), Align2::CENTER_CENTER, "No data", FontId::proportional(14.0), visuals.weak_text_color());
        return;
    };
    let plot = Rect::from_min_max(frame.min + Vec2::new(60.0, 24.0), frame.max - Vec2::new(12.0, 24.0));
    let sx = if x_max > x_min { plot.width() as f64 / (x_max - x_min) } else { 0.0 };
    let sy = if y_max > y_min { plot.height() as f64 / (y_max - y_min) } else { 0.0 };
    let to_screen = |x: f64, y: f64| {
        Pos2::new(plot.left() + ((x - x_min) * sx) as f32, plot.bottom() - ((y - y_min) * sy) as f32)
    };

    let text_color = visuals.text_color();
    let font = FontId::monospace(11.0);
    painter.text(frame.center_top() + Vec2::new(0.0, 4.0), Align2::CENTER_TOP, &chart.title, FontId::proportional(14.0), text_color);
    painter.text(Pos2::new(frame.left() + 4.0, plot.top()), Align2::LEFT_CENTER, format!("{y_max:.0}"), font.clone(), text_color);
    painter.text(Pos2::new(frame.left() + 4.0, plot.bottom()), Align2::LEFT_CENTER, format!("{y_min:.0}"), font.clone(), text_color);

    let first = chart.series.iter().flat_map(|s| s.points.first()).min_by(|a, b| a.0.as_f64().total_cmp(&b.0.as_f64()));
    let last = chart.series.iter().flat_map(|s| s.points.last()).max_by(|a, b| a.0.as_f64().total_cmp(&b.0.as_f64()));
    if let (Some(f), Some(l)) = (first, last) {
        painter.text(Pos2::new(plot.left(), plot.bottom() + 4.0), Align2::LEFT_TOP, f.0.label(), font.clone(), text_color);
        painter.text(Pos2::new(plot.right(), plot.bottom() + 4.0), Align2::RIGHT_TOP, l.0.label(), font.clone(), text_color);
    }

    for (i, s) in chart.series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let line: Vec<Pos2> = s.points.iter().map(|(x, y)| to_screen(x.as_f64(), *y)).collect();
        painter.add(Shape::line(line, Stroke::new(1.5, color)));
        // legend
        let at = Pos2::new(plot.left() + 8.0, plot.top() + 4.0 + 14.0 * i as f32);
        painter.text(at, Align2::LEFT_TOP, &s.label, font.clone(), color);
    }
}
