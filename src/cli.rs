// src/cli.rs
use std::{io::Write, path::PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};

use crate::config::options::{ExportFormat, RunConfig};
use crate::extract::{self, ExtractTarget};
use crate::file::resolve_out_path;
use crate::pipeline::{self, today};
use crate::present::TableChartSink;
use crate::progress::LogProgress;
use crate::record::{DateWindow, sort_by_date_key};
use crate::reference::{DEFAULT_COUNTRY, ReferenceSet};
use crate::{reconcile, store};

/// Munge COVID-19 reports into canonical, gap-free daily series.
#[derive(Parser, Debug)]
#[command(name = "covid_munge", version)]
pub struct Cli {
    /// TOML run configuration (defaults when missing)
    #[arg(long, global = true, default_value = "covid_munge.toml")]
    pub config: PathBuf,

    /// Output directory (overrides `out_dir`)
    #[arg(short, long, global = true)]
    pub out: Option<PathBuf>,

    /// Output format (overrides `format`)
    #[arg(long, global = true, value_enum)]
    pub format: Option<ExportFormat>,

    /// Never fetch; only use files already on disk
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// JHU daily archive to US states, deltas, population join, charts
    Jhu,
    /// Wikipedia state articles to per-day county files and a merged file
    Wiki,
    /// ECDC export to aligned daily series and per-1M charts
    Ecdc,
    /// Extract the county table from one saved HTML page to stdout
    Extract {
        /// Saved article or revision HTML
        html: PathBuf,
        /// Province (state) the page reports on
        #[arg(long)]
        province: String,
        #[arg(long, default_value = DEFAULT_COUNTRY)]
        country: String,
        /// Day the page stands for (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Reference file of valid sub-regions (overrides the config)
        #[arg(long)]
        counties: Option<PathBuf>,
    },
    /// Forward-fill a canonical file so every entity has every day
    Reconcile {
        input: PathBuf,
        /// Output file or directory (default: `<input stem>-filled.<ext>`)
        #[arg(short = 'w', long = "write")]
        output: Option<String>,
        /// First day of the window (default: earliest record)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day of the window (default: latest record)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

fn load_config(cli: &Cli) -> Result<RunConfig> {
    let mut cfg = RunConfig::load(&cli.config)
        .wrap_err_with(|| format!("reading {}", cli.config.display()))?;
    if let Some(out) = &cli.out {
        cfg.out_dir = out.clone();
    }
    if let Some(format) = cli.format {
        cfg.format = format;
    }
    cfg.offline |= cli.offline;
    Ok(cfg)
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    match cli.command {
        Command::Jhu => {
            let fetcher = pipeline::fetcher_for(&cfg)?;
            let mut sink = TableChartSink::new(cfg.out_dir.join("charts"), cfg.format);
            let mut progress = LogProgress::default();
            pipeline::jhu::run(&cfg, fetcher.as_ref(), &mut sink, Some(&mut progress))?;
        }
        Command::Wiki => {
            let fetcher = pipeline::fetcher_for(&cfg)?;
            let mut progress = LogProgress::default();
            pipeline::wiki::run(&cfg, fetcher.as_ref(), Some(&mut progress))?;
        }
        Command::Ecdc => {
            let fetcher = pipeline::fetcher_for(&cfg)?;
            let mut sink = TableChartSink::new(cfg.out_dir.join("charts"), cfg.format);
            pipeline::ecdc::run(&cfg, fetcher.as_ref(), &mut sink)?;
        }
        Command::Extract { html, province, country, date, counties } => {
            let counties = counties.unwrap_or_else(|| cfg.reference.counties.clone());
            let reference = ReferenceSet::load(&counties)
                .wrap_err_with(|| format!("reading {}", counties.display()))?;
            let doc = std::fs::read_to_string(&html).wrap_err_with(|| format!("reading {}", html.display()))?;
            let target = ExtractTarget { country, province, date: date.unwrap_or_else(today) };
            let name = html.display().to_string();
            let found = extract::extract(&doc, &name, &target, &reference);
            crate::error::log_issues(&found.issues);

            let rows: Vec<Vec<String>> = found.records.iter().map(store::record_cells).collect();
            let headers: Vec<String> = store::RECORD_HEADERS.iter().map(|h| s!(*h)).collect();
            let text = crate::csv::rows_to_string(&headers, &rows, cfg.format.delim())?;
            std::io::stdout().write_all(text.as_bytes())?;
        }
        Command::Reconcile { input, output, from, to } => {
            let mut records = store::load_records(&input)
                .wrap_err_with(|| format!("reading {}", input.display()))?;
            let span = DateWindow::spanning(&records).ok_or_else(|| eyre!("{} has no records", input.display()))?;
            let window = DateWindow::new(from.unwrap_or(span.first), to.unwrap_or(span.last))?;
            sort_by_date_key(&mut records);
            let filled = reconcile::reconcile_all(&records, &window, cfg.workers());

            let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            let default_name = format!("{stem}-filled.{}", cfg.format.ext());
            let path = resolve_out_path(output.as_deref().unwrap_or(""), &default_name)?;
            store::save_records(&path, &filled)?;
            logf!("{} records -> {}", filled.len(), path.display());
        }
    }
    Ok(())
}
