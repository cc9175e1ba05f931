// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;

pub mod csv;
pub mod file;
pub mod record;
pub mod reference;
pub mod store;

pub mod aggregate;
pub mod extract;
pub mod metrics;
pub mod normalize;
pub mod reconcile;

pub mod gui;
pub mod pipeline;
pub mod present;
pub mod progress;
