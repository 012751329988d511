mod countries;
mod error;
mod extract;
mod fetch;
mod merge;
mod output;
mod record;
mod settings;
mod sources;
mod text;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::fetch::{Fetch, HttpFetcher, Pacer};
use crate::settings::Settings;
use crate::sources::{afdb, ifad, wbp, wdi};

#[derive(Parser)]
#[command(name = "ifi_scraper", about = "IFI development-project scraper and harmonizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape AfDB project pages from the portal's exported listing
    Afdb {
        /// Exported project list (CSV with Project Code/Country/Status)
        #[arg(long, default_value = "data/afdb_ids.csv")]
        listing: PathBuf,
        /// Max projects to scrape
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Scrape IFAD projects (listing page + detail pages)
    Ifad {
        /// Max projects to scrape
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Transform the World Bank bulk project listing
    Wbp {
        /// Bulk project export (CSV)
        #[arg(long, default_value = "data/wbp_unfiltered.csv")]
        listing: PathBuf,
        /// Max projects to keep
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Download World Development Indicators
    Wdi {
        /// Indicator list (CSV with code/name columns)
        #[arg(long, default_value = "data/wdi_inds.csv")]
        indicators: PathBuf,
    },
    /// Run every source (shortest first), then merge
    Run {
        #[arg(long, default_value = "data/afdb_ids.csv")]
        afdb_listing: PathBuf,
        #[arg(long, default_value = "data/wbp_unfiltered.csv")]
        wbp_listing: PathBuf,
        #[arg(long, default_value = "data/wdi_inds.csv")]
        wdi_indicators: PathBuf,
        /// Max projects per source
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Merge the per-source tables into one dataset
    Merge,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Afdb { listing, limit } => run_afdb(&settings, &listing, limit),
        Commands::Ifad { limit } => run_ifad(&settings, limit),
        Commands::Wbp { listing, limit } => run_wbp(&settings, &listing, limit),
        Commands::Wdi { indicators } => run_wdi(&settings, &indicators),
        Commands::Run {
            afdb_listing,
            wbp_listing,
            wdi_indicators,
            limit,
        } => {
            // Shortest expected runtime first, so configuration errors
            // surface before the slow portals are touched.
            run_wdi(&settings, &wdi_indicators)?;
            run_wbp(&settings, &wbp_listing, limit)?;
            run_ifad(&settings, limit)?;
            run_afdb(&settings, &afdb_listing, limit)?;
            run_merge(&settings)
        }
        Commands::Merge => run_merge(&settings),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn run_afdb(settings: &Settings, listing: &Path, limit: Option<usize>) -> Result<()> {
    let countries = countries::afdb();
    let rows = afdb::load_listing(listing)?;
    let mut candidates = sources::prefilter(rows, &countries, afdb::STATUSES);
    if let Some(n) = limit {
        candidates.truncate(n);
    }
    println!("Scraping {} AfDB projects...", candidates.len());

    let mut fetcher = HttpFetcher::new(settings)?;
    let mut pacer = Pacer::new(afdb::MIN_DELAY);
    let records = afdb::collect(&mut fetcher, &mut pacer, &candidates);

    let path = data_path(settings, "afdb_data.csv");
    output::write_source_csv(&path, afdb::EXTRA_COLUMNS, &records)?;
    println!("Wrote {} AfDB records to {}", records.len(), path.display());
    Ok(())
}

fn run_ifad(settings: &Settings, limit: Option<usize>) -> Result<()> {
    let countries = countries::ifad();
    let mut fetcher = HttpFetcher::new(settings)?;

    let listing = fetcher
        .get_html(ifad::LISTING_URL)
        .map_err(|e| anyhow::anyhow!("IFAD listing page: {e}"))?;
    let mut candidates = ifad::parse_listing(&listing, &countries);
    if let Some(n) = limit {
        candidates.truncate(n);
    }
    println!("Scraping {} IFAD projects...", candidates.len());

    let mut pacer = Pacer::new(ifad::MIN_DELAY);
    let records = ifad::collect(&mut fetcher, &mut pacer, &candidates);

    let path = data_path(settings, "ifad_data.csv");
    output::write_source_csv(&path, ifad::EXTRA_COLUMNS, &records)?;
    println!("Wrote {} IFAD records to {}", records.len(), path.display());
    Ok(())
}

fn run_wbp(settings: &Settings, listing: &Path, limit: Option<usize>) -> Result<()> {
    let countries = countries::wbp();
    let rows = wbp::load_listing(listing)?;
    println!("Filtering {} World Bank listing rows...", rows.len());

    let mut fetcher = HttpFetcher::new(settings)?;
    let mut pacer = Pacer::new(wbp::MIN_DELAY);
    let records = wbp::collect(&mut fetcher, &mut pacer, &rows, &countries, limit);

    let path = data_path(settings, "wbp_data.csv");
    output::write_source_csv(&path, wbp::EXTRA_COLUMNS, &records)?;
    println!("Wrote {} World Bank records to {}", records.len(), path.display());
    Ok(())
}

fn run_wdi(settings: &Settings, indicators: &Path) -> Result<()> {
    let countries = countries::wdi();
    let indicators = wdi::load_indicators(indicators)?;
    println!("Downloading {} WDI indicators...", indicators.len());

    let mut fetcher = HttpFetcher::new(settings)?;
    let mut pacer = Pacer::new(wdi::MIN_DELAY);
    let table = wdi::collect(&mut fetcher, &mut pacer, &indicators, &countries);
    if table.is_empty() {
        println!("No indicator data returned.");
        return Ok(());
    }

    let path = data_path(settings, "wdi_data.csv");
    output::write_rows(&path, &table.headers(), &table.rows())?;
    println!("Wrote indicator table to {}", path.display());
    Ok(())
}

fn run_merge(settings: &Settings) -> Result<()> {
    let data_dir = PathBuf::from(&settings.data_dir);
    let rows = merge::run(&data_dir)?;
    println!(
        "Merged {} records into {}",
        rows,
        data_dir.join(merge::MERGED_FILE).display()
    );
    Ok(())
}

fn data_path(settings: &Settings, file: &str) -> PathBuf {
    PathBuf::from(&settings.data_dir).join(file)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
