// src/gui/mod.rs
pub mod app;
pub mod chart;
pub mod table;

pub use app::run;
