// src/bin/cli.rs
use covid_munge::{cli, log};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    log::init(log::Sink::Stderr);
    cli::run()
}
