// src/gui/table.rs
//
// Records of the selected entities, one row each.

use eframe::egui::{self, RichText};
use egui_extras::{Column, TableBuilder};

use crate::record::CanonicalRecord;
use crate::store::{RECORD_HEADERS, record_cells};

pub fn draw(ui: &mut egui::Ui, records: &[CanonicalRecord], rows: &[usize]) {
    let mut table = TableBuilder::new(ui)
        .striped(true)
        .min_scrolled_height(0.0)
        .id_salt("records_table");
    for (i, _) in RECORD_HEADERS.iter().enumerate() {
        let w = match i {
            0 => 90.0,
            1..=3 => 130.0,
            _ => 100.0,
        };
        table = table.column(Column::initial(w).resizable(true).clip(true).at_least(20.0));
    }

    table
        .header(22.0, |mut header| {
            for h in RECORD_HEADERS {
                header.col(|ui| {
                    ui.label(RichText::new(h).strong());
                });
            }
        })
        .body(|body| {
            body.rows(20.0, rows.len(), |mut row| {
                let Some(rec) = rows.get(row.index()).and_then(|&i| records.get(i)) else {
                    return;
                };
                for cell in record_cells(rec) {
                    row.col(|ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}
