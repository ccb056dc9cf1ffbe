//! Command-line front end
//!
//! Validates the request, runs the search against the configured site,
//! prints the ranked listings with the cheapest picks and price statistics,
//! and writes the CSV export.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use book_price_finder_lib::application::{SearchOrchestrator, SearchReport, export_csv};
use book_price_finder_lib::domain::SearchRequest;
use book_price_finder_lib::infrastructure::{
    AppConfig, ConfigManager, HttpClient, HttpSession, init_logging_with_config,
};

#[derive(Parser, Debug)]
#[command(
    name = "book-price-finder",
    version,
    about = "Find the cheapest listings of a book on an e-commerce site"
)]
struct Cli {
    /// Book name to search for
    #[arg(long, short)]
    book: String,

    /// Optional language, appended to the query
    #[arg(long, short)]
    language: Option<String>,

    /// Site to search (defaults to the first configured site)
    #[arg(long, env = "BOOK_PRICE_FINDER_SITE")]
    site: Option<String>,

    /// Soft cap on collected listings
    #[arg(long)]
    max_items: Option<usize>,

    /// Maximum result pages to visit
    #[arg(long)]
    max_pages: Option<usize>,

    /// Number of cheapest listings to highlight
    #[arg(long)]
    top_n: Option<usize>,

    /// Directory for the CSV export
    #[arg(long, env = "BOOK_PRICE_FINDER_EXPORT_DIR", default_value = ".")]
    export_dir: PathBuf,

    /// Skip the CSV export
    #[arg(long, default_value_t = false)]
    no_export: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, env = "BOOK_PRICE_FINDER_CONFIG")]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(max_items) = self.max_items {
            config.search.max_items = max_items;
        }
        if let Some(max_pages) = self.max_pages {
            config.search.max_pages = max_pages.max(1);
        }
        if let Some(top_n) = self.top_n {
            config.search.top_n = top_n;
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config().await?;
    cli.apply_overrides(&mut config);

    init_logging_with_config(config.logging.clone()).context("Failed to initialize logging")?;

    let site = match cli.site.clone().or_else(|| config.default_site().map(|s| s.name.clone())) {
        Some(site) => site,
        None => {
            eprintln!("❌ No sites configured in {:?}", manager.config_path());
            return Ok(ExitCode::from(2));
        }
    };

    let request = match SearchRequest::new(cli.book.clone(), cli.language.clone(), site, &config.allowed_sites()) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("❌ {e}");
            return Ok(ExitCode::from(2));
        }
    };

    let orchestrator = SearchOrchestrator::from_config(&config, request.target_site())?;
    let session = HttpSession::new(HttpClient::new(&config.http)?);

    info!("Searching for '{}' on {}", request.book_name(), request.target_site());

    let outcome = tokio::select! {
        outcome = orchestrator.search(session, &request) => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            return Ok(ExitCode::from(130));
        }
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) if e.is_empty_result() => {
            println!("⚠️  {e}");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Search failed")),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !cli.no_export && report.empty_reason().is_none() {
        let path = export_csv(&report, &cli.export_dir).context("Failed to export CSV")?;
        if !cli.json {
            println!("\n📥 Saved CSV to {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &SearchReport) {
    if report.empty_reason().is_some() {
        println!("⚠️  {}", report.summary());
        return;
    }

    println!("🎉 {}\n", report.summary());

    let rows = report.rows();
    let title_width = rows.iter().map(|r| r.title.chars().count()).max().unwrap_or(0).clamp(5, 60);
    let author_width = rows.iter().map(|r| r.author.chars().count()).max().unwrap_or(0).clamp(6, 30);

    println!(
        "{:<title_width$}  {:<author_width$}  {:>12}  Link",
        "Title", "Author", "Price"
    );
    for row in &rows {
        println!(
            "{:<title_width$}  {:<author_width$}  {:>12}  {}",
            truncate(&row.title, title_width),
            truncate(&row.author, author_width),
            row.price,
            row.link
        );
    }

    println!("\n💰 Top {} cheapest", report.top_n);
    for (rank, record) in report.top_cheapest().iter().enumerate() {
        let row = report.row(record);
        println!("  {}. {} - {}", rank + 1, row.title, row.price);
    }

    println!();
    if !report.statistics.is_available() {
        println!("⚠️  All prices are zero or unavailable. Cannot calculate lowest/average.");
    }
    println!("Lowest price:  {}", report.lowest_price());
    println!("Average price: {}", report.average_price());
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
