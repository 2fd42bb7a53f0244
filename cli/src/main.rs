use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cori_cli::context::error_chain;
use cori_cli::{CliContext, commands, logging, readline};
use cori_core::{AppConfigExt, SourceOverrides, build_loader};
use cori_types::AppConfig;

/// Launch options; they take precedence over `CORI_DB_URL` and the config file.
#[derive(Parser)]
#[command(version, about = "Cori production dashboard")]
struct LaunchArgs {
    /// Parquet or CSV export of the OEE table
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// MySQL connection URL
    #[arg(long)]
    db_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = LaunchArgs::parse();
    let _log_guard = logging::init();

    let config = AppConfig::load_or_default();
    let overrides = SourceOverrides {
        snapshot: args.snapshot,
        database_url: args.db_url,
    };
    let loader = match build_loader(&config, &overrides) {
        Ok(loader) => Some(loader),
        Err(e) => {
            tracing::warn!(error = %error_chain(&e), "No usable data source");
            println!("{}", error_chain(&e));
            None
        }
    };
    let ctx = CliContext::new(config, loader);

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                tracing::debug!(command = line, error = %err, "Command failed");
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(about = "cori")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// KPI tiles and monthly production charts
    Overview,
    /// Monthly trend charts
    Series,
    /// Raw rows of the selected month
    Table {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Select production lines
    Lines {
        lines: Vec<String>,
        /// Select every line
        #[arg(long)]
        all: bool,
    },
    /// Select a year (YYYY); no value picks the latest
    Year { year: Option<String> },
    /// Select a month (YYYY-MM); no value picks the latest
    Month { month: Option<String> },
    /// Show the current and available filter values
    Filters,
    /// Fetch from the source now, ignoring the cache
    Reload,
    /// Write the dashboard as HTML (or JSON)
    Export {
        #[arg(short, long)]
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the configuration, or change one setting
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    Exit,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set KEY to VALUE and save the config file ("-" clears a source)
    Set { key: String, value: String },
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "cori".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    let output = match &cli.command {
        Some(Commands::Overview) => commands::overview(ctx).await?,
        Some(Commands::Series) => commands::series(ctx).await?,
        Some(Commands::Table { limit }) => commands::table(ctx, *limit).await?,
        Some(Commands::Lines { lines, all }) => {
            if lines.is_empty() && !*all {
                commands::show_filters(ctx).await?
            } else {
                commands::set_lines(ctx, lines, *all).await?
            }
        }
        Some(Commands::Year { year }) => commands::set_year(ctx, year.as_deref()).await?,
        Some(Commands::Month { month }) => commands::set_month(ctx, month.as_deref()).await?,
        Some(Commands::Filters) => commands::show_filters(ctx).await?,
        Some(Commands::Reload) => commands::reload(ctx).await?,
        Some(Commands::Export { path, json }) => commands::export(ctx, path, *json).await?,
        Some(Commands::Config { action: None }) => commands::show_config(ctx).await?,
        Some(Commands::Config {
            action: Some(ConfigAction::Set { key, value }),
        }) => commands::set_config(ctx, key, value).await?,
        Some(Commands::Exit) => {
            commands::exit()?;
            return Ok(true);
        }
        None => String::new(),
    };
    write!(std::io::stdout(), "{output}").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    Ok(false)
}
