//! dashql CLI - Check and resolve dashboard query templates
//!
//! Usage:
//!   dashql check <template.sql>
//!   dashql resolve [dashboard] [--filter name=value]... [--period <tag> | --from dd.mm.yyyy --to dd.mm.yyyy]
//!   dashql presets [dashboard] [--today YYYY-MM-DD]
//!
//! Examples:
//!   dashql check demos/views.sql
//!   dashql resolve demos/standard.toml --filter url_sti=/arbeid --period previous-month
//!   dashql resolve demos/fylkeskontor.json --filter url_sti=/no/lokalt/oslo --from 01.12.2025 --to 15.12.2025 --chart 1

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dashql::config::Settings;
use dashql::dashboard::{DashboardConfig, DashboardError, DashboardSession};
use dashql::filter::DateRange;
use dashql::period::{format_date_text, parse_date_text};
use dashql::template::{self, ParseError, TemplateCache};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dashql")]
#[command(about = "dashql - Filter-driven SQL query templates for analytics dashboards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a template and print its structure
    Check {
        /// Path to the template file ("-" reads stdin)
        template: PathBuf,
    },

    /// Resolve a dashboard's chart queries
    Resolve {
        /// Dashboard file, or a dashboard name in the configured directory
        /// (the configured default when omitted)
        dashboard: Option<String>,

        /// Filter value as name=value (repeatable)
        #[arg(short, long = "filter", value_name = "NAME=VALUE")]
        filters: Vec<String>,

        /// Period preset tag
        #[arg(short, long, conflicts_with_all = ["from", "to"])]
        period: Option<String>,

        /// Custom period start (dd.mm.yyyy)
        #[arg(long)]
        from: Option<String>,

        /// Custom period end (dd.mm.yyyy)
        #[arg(long)]
        to: Option<String>,

        /// Reference date for relative presets (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Resolve only the chart at this position
        #[arg(short, long)]
        chart: Option<usize>,
    },

    /// List a dashboard's period presets and their ranges
    Presets {
        /// Dashboard file, or a dashboard name in the configured directory
        /// (the configured default when omitted)
        dashboard: Option<String>,

        /// Reference date for relative presets (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings);

    match cli.command {
        Commands::Check { template } => cmd_check(template),
        Commands::Resolve {
            dashboard,
            filters,
            period,
            from,
            to,
            today,
            chart,
        } => {
            let today = today.unwrap_or_else(|| settings.today());
            let period = match (period, from, to) {
                (Some(tag), _, _) => PeriodArg::Preset(tag),
                (None, None, None) => PeriodArg::Default,
                (None, from, to) => PeriodArg::Custom(from, to),
            };
            cmd_resolve(&settings, dashboard.as_deref(), &filters, period, today, chart)
        }
        Commands::Presets { dashboard, today } => {
            let today = today.unwrap_or_else(|| settings.today());
            cmd_presets(&settings, dashboard.as_deref(), today)
        }
    }
}

/// `RUST_LOG` wins over the settings file.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

enum PeriodArg {
    Default,
    Preset(String),
    Custom(Option<String>, Option<String>),
}

fn cmd_check(path: PathBuf) -> ExitCode {
    let source = match read_template(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading template '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let parsed = match template::parse(&source) {
        Ok(parsed) => parsed,
        Err(err) => {
            report_parse_error(&path.display().to_string(), &source, &err);
            return ExitCode::FAILURE;
        }
    };

    println!("Template: {}", path.display());
    println!("  segments:     {}", parsed.segments.len());
    println!("  placeholders: {}", list_names(parsed.placeholders()));
    println!("  required:     {}", list_names(parsed.unguarded()));
    println!("  optional on:  {}", list_names(parsed.triggers()));
    ExitCode::SUCCESS
}

fn list_names(names: BTreeSet<&str>) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.into_iter().collect::<Vec<_>>().join(", ")
    }
}

fn read_template(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(path)
    }
}

fn report_parse_error(name: &str, source: &str, err: &ParseError) {
    let span = err.span();
    let result = Report::build(ReportKind::Error, (name, span.clone()))
        .with_config(Config::default().with_index_type(IndexType::Byte))
        .with_message("Malformed template")
        .with_label(Label::new((name, span)).with_message(err.to_string()))
        .finish()
        .eprint((name, Source::from(source)));
    if result.is_err() {
        eprintln!("{}: {}", name, err);
    }
}

fn open_session(settings: &Settings, dashboard: Option<&str>, today: NaiveDate) -> Result<DashboardSession, String> {
    let name = dashboard
        .or(settings.dashboards.default.as_deref())
        .ok_or_else(|| "no dashboard given and no default configured".to_string())?;
    let path = settings.find_dashboard(name).map_err(|e| e.to_string())?;
    let config = DashboardConfig::from_file(&path).map_err(|e| e.to_string())?;
    DashboardSession::new(config, today).map_err(|e| e.to_string())
}

fn cmd_resolve(
    settings: &Settings,
    dashboard: Option<&str>,
    filters: &[String],
    period: PeriodArg,
    today: NaiveDate,
    chart: Option<usize>,
) -> ExitCode {
    let mut session = match open_session(settings, dashboard, today) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error opening dashboard: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = apply_arguments(&mut session, filters, period) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let cache = TemplateCache::new();

    if let Some(index) = chart {
        return match session.resolve_chart(index, &cache) {
            Ok(sql) => {
                println!("{}", sql);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Resolution error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut failed = false;
    for query in session.resolve_charts(&cache) {
        println!("-- [{}] {}", query.index, query.title);
        match query.result {
            Ok(sql) => println!("{}", sql.trim()),
            Err(e) => {
                failed = true;
                println!("-- error: {}", e);
            }
        }
        println!();
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn apply_arguments(session: &mut DashboardSession, filters: &[String], period: PeriodArg) -> Result<(), String> {
    match period {
        PeriodArg::Default => {}
        PeriodArg::Preset(tag) => session.select_preset(&tag).map_err(|e| e.to_string())?,
        PeriodArg::Custom(from, to) => {
            let parse = |text: Option<String>| -> Result<Option<NaiveDate>, String> {
                text.map(|t| parse_date_text(&t).map_err(|e| e.to_string())).transpose()
            };
            let range = DateRange {
                start: parse(from)?,
                end: parse(to)?,
            };
            session.select_custom(range).map_err(|e| e.to_string())?;
        }
    }

    for filter in filters {
        let (name, value) = filter
            .split_once('=')
            .ok_or_else(|| format!("Invalid filter argument '{}' (expected name=value)", filter))?;
        session
            .set_filter_text(name.trim(), value)
            .map_err(|e: DashboardError| e.to_string())?;
    }

    Ok(())
}

fn cmd_presets(settings: &Settings, dashboard: Option<&str>, today: NaiveDate) -> ExitCode {
    let session = match open_session(settings, dashboard, today) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error opening dashboard: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let selected = session.display_tag();
    println!("Dashboard: {}", session.config().title);
    println!("Reference date: {}", format_date_text(today));
    println!();

    for preset in session.presets().iter() {
        let marker = if selected.as_str() == preset.tag { "*" } else { " " };
        let label = preset.label.as_deref().unwrap_or(&preset.tag);
        match preset.kind.range(today) {
            Ok((start, end)) => println!(
                "{} {:<16} {:<20} {} - {}",
                marker,
                preset.tag,
                label,
                format_date_text(start),
                format_date_text(end)
            ),
            Err(e) => println!("{} {:<16} {:<20} error: {}", marker, preset.tag, label, e),
        }
    }

    ExitCode::SUCCESS
}
