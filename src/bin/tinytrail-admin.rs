use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tinytrail::analytics::{parse_date, parse_date_time};
use tinytrail::config::Config;
use tinytrail::models::UrlMappingDto;
use tinytrail::service::UrlService;
use tinytrail::{storage, telemetry};

#[derive(Parser)]
#[command(name = "tinytrail-admin")]
#[command(about = "TinyTrail analytics and mapping inspection CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the short URLs owned by a user
    Urls {
        /// Owner username
        owner: String,
    },
    /// Show per-date clicks for one short URL
    Analytics {
        /// Short code
        short_url: String,
        /// Range start, ISO local date-time (e.g. 2024-01-01T00:00:00)
        #[arg(long)]
        start: String,
        /// Range end (inclusive), ISO local date-time
        #[arg(long)]
        end: String,
    },
    /// Show per-date clicks across all short URLs of a user
    Totals {
        /// Owner username
        owner: String,
        /// First day, ISO date (e.g. 2024-01-01)
        #[arg(long)]
        start: String,
        /// Last day (inclusive), ISO date
        #[arg(long)]
        end: String,
    },
    /// Check that a short URL's click counter matches its stored click events
    Verify {
        /// Short code
        short_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing("warn");

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    let storage = storage::connect(&config.database).await?;
    let service = UrlService::new(storage);

    match cli.command {
        Commands::Urls { owner } => {
            let urls = service.urls_for_owner(&owner).await?;
            if urls.is_empty() {
                println!("No short URLs found for '{}'.", owner);
            } else {
                println!(
                    "{:<10} {:<20} {:>8}  {}",
                    "Code", "Created", "Clicks", "Original URL"
                );
                println!("{}", "-".repeat(80));
                for url in urls.into_iter().map(UrlMappingDto::from) {
                    println!(
                        "{:<10} {:<20} {:>8}  {}",
                        url.short_url,
                        url.created_date.format("%Y-%m-%d %H:%M:%S"),
                        url.click_count,
                        url.original_url
                    );
                }
            }
        }
        Commands::Analytics {
            short_url,
            start,
            end,
        } => {
            let start = parse_date_time("--start", &start)?;
            let end = parse_date_time("--end", &end)?;

            match service.click_counts_by_date(&short_url, start, end).await? {
                None => println!("⚠ Short URL '{}' does not exist", short_url),
                Some(series) if series.is_empty() => {
                    println!("No clicks on '{}' in that range.", short_url)
                }
                Some(series) => {
                    println!("{:<12} {:>8}", "Date", "Clicks");
                    println!("{}", "-".repeat(21));
                    for entry in series {
                        println!(
                            "{:<12} {:>8}",
                            entry.click_date.format("%Y-%m-%d"),
                            entry.count
                        );
                    }
                }
            }
        }
        Commands::Totals { owner, start, end } => {
            let start = parse_date("--start", &start)?;
            let end = parse_date("--end", &end)?;

            let totals = service.total_clicks(&owner, start, end).await?;
            if totals.is_empty() {
                println!("No clicks for '{}' in that range.", owner);
            } else {
                println!("{:<12} {:>8}", "Date", "Clicks");
                println!("{}", "-".repeat(21));
                for (date, count) in &totals {
                    println!("{:<12} {:>8}", date, count);
                }
                println!("{}", "-".repeat(21));
                println!("{:<12} {:>8}", "Total", totals.values().sum::<i64>());
            }
        }
        Commands::Verify { short_url } => {
            let storage = service.storage();
            let Some(mapping) = storage.get(&short_url).await? else {
                println!("⚠ Short URL '{}' does not exist", short_url);
                return Ok(());
            };

            let events = storage.count_click_events(mapping.id).await?;
            if events == mapping.click_count {
                println!(
                    "✓ '{}' is consistent: {} clicks, {} click events",
                    short_url, mapping.click_count, events
                );
            } else {
                println!(
                    "✗ '{}' has drifted: counter says {}, {} click events stored",
                    short_url, mapping.click_count, events
                );
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
