mod api;
mod app;
mod config;
mod history;
mod models;
mod rating;
mod render;
mod requests;
mod tui;
mod uploader;

use anyhow::{Context, Result};
use api::{HttpResumeApi, ResumeApi};
use app::App;
use clap::{Parser, Subcommand};
use config::Config;
use models::ResumeSummary;
use render::{analysis_text, comparison_table, to_plain};
use requests::Dispatcher;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TEXT_WIDTH: usize = 90;

#[derive(Parser)]
#[command(name = "resumeview")]
#[command(about = "Upload resumes for AI analysis, browse past results, and compare candidates")]
struct Cli {
    /// Base URL of the resume analysis service
    #[arg(long, global = true, env = "RESUMEVIEW_API_URL", default_value = config::DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "RESUMEVIEW_TIMEOUT", default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Where the interactive mode writes its log
    #[arg(long, global = true, env = "RESUMEVIEW_LOG")]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive terminal UI (default)
    Tui {
        /// Skip the welcome panel
        #[arg(long)]
        skip_intro: bool,

        /// PDF to preselect for upload
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List previously analyzed resumes
    List,

    /// Show the full analysis of a stored resume
    Show {
        /// Resume ID
        id: i64,
    },

    /// Upload a PDF and print its analysis
    Upload {
        /// Path to the PDF resume
        file: PathBuf,
    },

    /// Compare two stored resumes side by side
    Compare {
        /// First resume ID
        first: i64,

        /// Second resume ID
        second: i64,
    },
}

fn init_logging(config: &Config, interactive: bool) -> Result<()> {
    let default_level = match (config.verbose, interactive) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };
    let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string()));

    if interactive {
        // The terminal belongs to the UI, so logs go to a file.
        let log_path = config.log_path()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new(&cli.api_url, cli.timeout, cli.log_file, cli.verbose)?;
    let command = cli.command.unwrap_or(Commands::Tui {
        skip_intro: false,
        file: None,
    });

    init_logging(&config, matches!(command, Commands::Tui { .. }))?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let api = HttpResumeApi::new(&config.api_url, config.timeout)
        .context("Failed to build HTTP client")?;
    tracing::info!(api_url = api.base_url(), timeout = ?config.timeout, "starting");

    match command {
        Commands::Tui { skip_intro, file } => {
            let (dispatcher, mut completions) = Dispatcher::new(Arc::new(api), runtime.handle().clone());
            let mut app = App::new(dispatcher).with_initial_file(file);
            if skip_intro {
                app.update(app::Action::Start);
            }
            tui::run(&mut app, &mut completions)?;
            tracing::info!(inflight = app.dispatcher().inflight(), "exiting");
        }

        Commands::List => {
            let rows = runtime
                .block_on(api.list_resumes())
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Failed to load history")?;
            print_summaries(&rows);
        }

        Commands::Show { id } => {
            let detail = runtime
                .block_on(api.get_resume(id))
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("Failed to load details for resume #{}", id))?;
            println!("{}", show_text(&detail));
        }

        Commands::Upload { file } => {
            println!("Uploading {}...", file.display());
            let detail = runtime
                .block_on(api.upload_resume(&file))
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Upload failed")?;
            if let Some(id) = detail.id {
                println!("Stored as resume #{}\n", id);
            }
            println!("{}", to_plain(&analysis_text(&detail), TEXT_WIDTH));
        }

        Commands::Compare { first, second } => {
            let (a, b) = runtime
                .block_on(async { tokio::try_join!(api.get_resume(first), api.get_resume(second)) })
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Failed to fetch resume details for comparison")?;
            let table = comparison_table([&a, &b]);

            println!("{:<22} {:<32} {:<32}", "FIELD", truncate(&table.headers[0], 30), truncate(&table.headers[1], 30));
            println!("{}", "-".repeat(88));
            for row in &table.rows {
                let cells: Vec<Vec<String>> = row
                    .cells
                    .iter()
                    .map(|c| {
                        textwrap::wrap(&c.plain(), 30)
                            .into_iter()
                            .map(|l| l.into_owned())
                            .collect()
                    })
                    .collect();
                let height = cells.iter().map(Vec::len).max().unwrap_or(1);
                for i in 0..height {
                    let field = if i == 0 { row.field } else { "" };
                    let left = cells[0].get(i).map(String::as_str).unwrap_or("");
                    let right = cells[1].get(i).map(String::as_str).unwrap_or("");
                    println!("{:<22} {:<32} {:<32}", field, left, right);
                }
                println!();
            }
        }
    }

    Ok(())
}

fn show_text(detail: &models::ResumeDetail) -> String {
    format!(
        "{}\n{}\n{}",
        detail.display_title(),
        "=".repeat(TEXT_WIDTH.min(60)),
        to_plain(&analysis_text(detail), TEXT_WIDTH)
    )
}

fn print_summaries(rows: &[ResumeSummary]) {
    if rows.is_empty() {
        println!("No resumes found. Upload one with `resumeview upload <file>`.");
        return;
    }
    println!("{:<6} {:<26} {:<22} {:<28} {:>7}", "ID", "FILE NAME", "NAME", "EMAIL", "RATING");
    println!("{}", "-".repeat(93));
    for row in rows {
        println!(
            "{:<6} {:<26} {:<22} {:<28} {:>7}",
            row.id,
            truncate(&row.filename, 24),
            truncate(row.name.as_deref().unwrap_or(""), 20),
            truncate(row.email.as_deref().unwrap_or(""), 26),
            rating::rating_label(row.resume_rating),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
