use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prisonscraper::{
    fetch, logging,
    process::{self, Kind, DEFAULT_FILE_PATTERN},
    summary::{self, PivotTable, DEFAULT_WEEKS},
    viz, Config, Years,
};
use std::{path::PathBuf, time::Instant};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "prisonscraper",
    about = "Weekly prison population bulletins: download, tidy, summarize, chart"
)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download bulletin spreadsheets for the given years (default: all)
    Download { years: Vec<i32> },
    /// Rebuild the tidy CSV from the raw downloads
    Process {
        years: Vec<i32>,
        /// Glob for raw files inside each year directory
        #[arg(long, default_value = DEFAULT_FILE_PATTERN)]
        pattern: String,
    },
    /// Print the most recent weeks as one table per type
    Summary {
        years: Vec<i32>,
        #[arg(short = 'n', long, default_value_t = DEFAULT_WEEKS)]
        weeks: usize,
        /// Comma-separated types (default: prison, operational_capacity, hdc)
        #[arg(short = 't', long = "type", value_delimiter = ',')]
        kinds: Vec<Kind>,
    },
    /// Write chart figures as JSON
    Charts { years: Vec<i32> },
    /// Download, process, summarize and chart in one go
    Run {
        years: Vec<i32>,
        #[arg(short = 'n', long, default_value_t = DEFAULT_WEEKS)]
        weeks: usize,
    },
}

fn print_tables(tables: &[PivotTable]) {
    for table in tables {
        println!("{}", table);
    }
}

async fn make_dataset(config: &Config, years: Years, pattern: String) -> Result<PathBuf> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || process::make_dataset(&config, &years, &pattern))
        .await
        .context("processing task failed")?
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;
    logging::init(&config.data.logs_path)?;

    let t0 = Instant::now();
    match cli.command {
        Commands::Download { years } => {
            let years: Years = years.into_iter().collect();
            let report = fetch::download_prison_population_data(&config, &years).await?;
            println!(
                "Downloaded {}, skipped {}, failed {}",
                report.downloaded, report.skipped, report.failed
            );
        }
        Commands::Process { years, pattern } => {
            let out = make_dataset(&config, years.into_iter().collect(), pattern).await?;
            println!("Processed data saved to {}", out.display());
        }
        Commands::Summary {
            years,
            weeks,
            kinds,
        } => {
            let kinds = if kinds.is_empty() {
                summary::DEFAULT_KINDS.to_vec()
            } else {
                kinds
            };
            let years: Years = years.into_iter().collect();
            print_tables(&summary::weekly_summary(&config, &years, weeks, &kinds)?);
        }
        Commands::Charts { years } => {
            let years: Years = years.into_iter().collect();
            for path in viz::make_charts(&config, &years)? {
                println!("Chart saved to {}", path.display());
            }
        }
        Commands::Run { years, weeks } => {
            let years: Years = years.into_iter().collect();
            fetch::download_prison_population_data(&config, &years).await?;
            make_dataset(&config, years.clone(), DEFAULT_FILE_PATTERN.to_string()).await?;
            print_tables(&summary::weekly_summary(
                &config,
                &years,
                weeks,
                &summary::DEFAULT_KINDS,
            )?);
            viz::make_charts(&config, &years)?;
        }
    }

    info!(elapsed = ?t0.elapsed(), "done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_types_parse_from_comma_list() {
        let cli = Cli::try_parse_from(["prisonscraper", "summary", "2024", "--type", "hdc,prison"])
            .unwrap();
        match cli.command {
            Commands::Summary { years, weeks, kinds } => {
                assert_eq!(years, vec![2024]);
                assert_eq!(weeks, DEFAULT_WEEKS);
                assert_eq!(kinds, vec![Kind::Hdc, Kind::Prison]);
            }
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn unknown_summary_type_lists_valid_choices() {
        let err = match Cli::try_parse_from(["prisonscraper", "summary", "--type", "capacity"]) {
            Ok(_) => panic!("capacity is not a type"),
            Err(err) => err,
        };
        assert!(err
            .to_string()
            .contains("valid choices are: hdc, headroom, operational_capacity, prison"));
    }
}
