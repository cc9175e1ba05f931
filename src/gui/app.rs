// src/gui/app.rs
use std::{
    collections::BTreeSet,
    error::Error,
    path::{Path, PathBuf},
};

use eframe::egui;

use crate::{
    config::options::RunConfig,
    error::{Issue, log_issues},
    pipeline::out_file,
    present::{ChartBook, ChartSink},
    record::{CanonicalRecord, EntityKey, Field},
    reference::PopulationTable,
    store,
};

use super::{
    chart::{self, Mode},
    table,
};

const CONFIG_FILE: &str = "covid_munge.toml";
const DEFAULT_PICKS: usize = 5;

pub fn run(options: eframe::NativeOptions) -> Result<(), Box<dyn Error>> {
    let cfg = RunConfig::load(Path::new(CONFIG_FILE))?;
    eframe::run_native(
        "COVID-19 Munge",
        options,
        Box::new(move |_cc| Ok(Box::new(App::new(&cfg)))),
    )?;
    Ok(())
}

pub struct App {
    // inputs (text fields)
    pub records_path_text: String,
    pub population_path_text: String,

    // loaded data
    pub records: Vec<CanonicalRecord>,
    pub population: Option<PopulationTable>,
    pub entities: Vec<EntityKey>,

    // selection
    pub selected: BTreeSet<EntityKey>,
    pub filter_text: String,
    pub field: Field,
    pub mode: Mode,

    // derived view
    pub book: ChartBook,
    pub rows: Vec<usize>,
    pub issues: Vec<Issue>,

    pub status: String,
}

impl App {
    pub fn new(cfg: &RunConfig) -> Self {
        let mut app = Self {
            records_path_text: out_file(cfg, "jhu-us-states").to_string_lossy().into(),
            population_path_text: cfg.reference.population.to_string_lossy().into(),
            records: Vec::new(),
            population: None,
            entities: Vec::new(),
            selected: BTreeSet::new(),
            filter_text: String::new(),
            field: Field::Confirmed,
            mode: Mode::Cumulative,
            book: ChartBook::default(),
            rows: Vec::new(),
            issues: Vec::new(),
            status: s!("Idle"),
        };
        app.load_records();
        app.load_population();
        app
    }

    pub fn load_records(&mut self) {
        let path = PathBuf::from(self.records_path_text.trim());
        match store::load_records(&path) {
            Ok(records) => {
                self.entities = records
                    .iter()
                    .map(CanonicalRecord::key)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();
                self.selected = self.entities.iter().take(DEFAULT_PICKS).cloned().collect();
                self.status = format!("Loaded {} records, {} entities", records.len(), self.entities.len());
                logf!("GUI: {} ({} records)", path.display(), records.len());
                self.records = records;
            }
            Err(e) => {
                self.records.clear();
                self.entities.clear();
                self.selected.clear();
                self.status = format!("Cannot load {}: {e}", path.display());
                logw!("GUI: {}", self.status);
            }
        }
        self.refresh();
    }

    pub fn load_population(&mut self) {
        let path = PathBuf::from(self.population_path_text.trim());
        self.population = match PopulationTable::load(&path) {
            Ok(t) => Some(t),
            Err(e) => {
                logd!("GUI: no population table at {}: {e}", path.display());
                None
            }
        };
        self.refresh();
    }

    /// Rebuild the chart and the table rows from the current selection.
    pub fn refresh(&mut self) {
        let (chart, issues) = chart::build(
            &self.records,
            &self.selected,
            self.field,
            self.mode,
            self.population.as_ref(),
        );
        log_issues(&issues);
        self.issues = issues;
        self.book = ChartBook::default();
        self.book.show(&chart);

        self.rows = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.selected.contains(&r.key()))
            .map(|(i, _)| i)
            .collect();
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        let mut dirty = false;

        ui.heading("Data");
        ui.label("Records file");
        ui.text_edit_singleline(&mut self.records_path_text);
        if ui.button("Load").clicked() {
            self.load_records();
        }
        ui.label("Population file");
        ui.text_edit_singleline(&mut self.population_path_text);
        if ui.button("Load population").clicked() {
            self.load_population();
        }
        ui.separator();

        egui::ComboBox::from_label("Field")
            .selected_text(self.field.label())
            .show_ui(ui, |ui| {
                for f in Field::ALL {
                    dirty |= ui.selectable_value(&mut self.field, f, f.label()).changed();
                }
            });
        egui::ComboBox::from_label("Mode")
            .selected_text(self.mode.label())
            .show_ui(ui, |ui| {
                for m in Mode::ALL {
                    dirty |= ui.selectable_value(&mut self.mode, m, m.label()).changed();
                }
            });
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Filter");
            ui.text_edit_singleline(&mut self.filter_text);
        });
        ui.horizontal(|ui| {
            if ui.button("None").clicked() {
                self.selected.clear();
                dirty = true;
            }
            if ui.button("First 5").clicked() {
                self.selected = self.entities.iter().take(DEFAULT_PICKS).cloned().collect();
                dirty = true;
            }
        });

        let needle = self.filter_text.trim().to_lowercase();
        egui::ScrollArea::vertical().id_salt("entities").show(ui, |ui| {
            for key in &self.entities {
                let label = key.to_string();
                if !needle.is_empty() && !label.to_lowercase().contains(&needle) {
                    continue;
                }
                let mut on = self.selected.contains(key);
                if ui.checkbox(&mut on, label).changed() {
                    if on {
                        self.selected.insert(key.clone());
                    } else {
                        self.selected.remove(key);
                    }
                    dirty = true;
                }
            }
        });

        if dirty {
            self.refresh();
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("entities")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.side_panel(ui));

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                if !self.issues.is_empty() {
                    ui.separator();
                    ui.colored_label(ui.visuals().warn_fg_color, format!("{} issue(s)", self.issues.len()))
                        .on_hover_text(
                            self.issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"),
                        );
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(c) = self.book.charts.last() {
                chart::draw(ui, c, (ui.available_height() * 0.55).max(200.0));
            }
            ui.separator();
            table::draw(ui, &self.records, &self.rows);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Totals;
    use chrono::NaiveDate;

    fn rec(day: u32, province: &str, confirmed: u64) -> CanonicalRecord {
        let date = NaiveDate::from_ymd_opt(2020, 3, day).unwrap();
        let totals = Totals { confirmed: Some(confirmed), ..Totals::ZERO };
        CanonicalRecord::new(date, &EntityKey::province("US", province), totals)
    }

    #[test]
    fn refresh_follows_selection() {
        let mut app = App::new(&RunConfig { out_dir: PathBuf::from("/nonexistent"), ..RunConfig::default() });
        app.records = vec![rec(1, "Ohio", 1), rec(1, "Utah", 2), rec(2, "Ohio", 4)];
        app.entities = vec![EntityKey::province("US", "Ohio"), EntityKey::province("US", "Utah")];
        app.selected = BTreeSet::from([EntityKey::province("US", "Ohio")]);
        app.refresh();

        assert_eq!(app.rows, vec![0, 2]);
        let chart = app.book.charts.last().unwrap();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].points.len(), 2);
    }
}
