// src/bin/gui.rs
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]
use covid_munge::{gui, log};
use eframe::egui::ViewportBuilder;

fn main() {
    log::init(log::Sink::File);

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("COVID-19 Munge")
            .with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };

    if let Err(e) = gui::run(options) {
        eprintln!("GUI failed: {}", e);
        std::process::exit(1);
    }
}
