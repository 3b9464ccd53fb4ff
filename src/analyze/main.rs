//! Travel-time access analysis for one administrative region.
//!
//! Selects the region, gathers facilities and population, requests a
//! catchment per facility and reports the share of people who can reach one.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use healthreach::catchment::{CatchmentService, OpenRouteService};
use healthreach::config::{AccessConfig, FacilitySource};
use healthreach::export::write_report;
use healthreach::models::{FacilitySet, LevelFilter, Region};
use healthreach::pipeline::AccessPipeline;
use healthreach::region::RegionSelector;
use healthreach::sources::{load_boundaries, load_facilities, load_population, OverpassClient};
use healthreach::spatial::SpatialJoinEngine;

#[derive(Parser, Debug)]
#[command(name = "analyze")]
#[command(about = "Estimate the population within a travel-time budget of a health facility")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "healthreach.toml")]
    config: PathBuf,

    /// Region filter LEVEL=NAME, repeatable; replaces region.path
    #[arg(short, long = "region", value_name = "LEVEL=NAME")]
    region: Vec<LevelFilter>,

    /// Travel-time budget in seconds
    #[arg(long)]
    time_budget: Option<u32>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

async fn facilities_for(config: &AccessConfig, region: &Region) -> Result<FacilitySet> {
    match config.facilities.source {
        FacilitySource::Geojson => load_facilities(&config.facilities),
        FacilitySource::Overpass => {
            let bbox = region
                .bbox()
                .context("Selected region has no extent to query facilities in")?;
            OverpassClient::new(&config.facilities)?.fetch(bbox).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = AccessConfig::load_from_file(&args.config)?;
    if !args.region.is_empty() {
        config.region.path = args.region;
    }
    if let Some(budget) = args.time_budget {
        config.routing.time_budget_secs = budget;
    }
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    config.validate()?;

    info!("Config: {}", args.config.display());

    let boundaries = load_boundaries(&config.region)?;
    let region = RegionSelector::new(&boundaries).select(&config.region.path)?;
    info!("Region: {}", region.display_name());

    let fetched = facilities_for(&config, &region).await?;
    let facilities = FacilitySet::new(
        fetched.crs.clone(),
        SpatialJoinEngine::facilities_within(&fetched, &region)?,
    );
    if facilities.is_empty() {
        warn!("No facilities in the region; every cell will be reported without access");
    }
    let grid = load_population(&config.population)?;

    let provider = OpenRouteService::new(&config.routing)?;
    info!("Routing via {}", provider.endpoint());
    let mut pipeline = AccessPipeline::new(CatchmentService::new(provider, &config.routing));

    let pb = ProgressBar::new(facilities.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} catchments {msg}")?
            .progress_chars("#>-"),
    );

    let report = pipeline
        .run(&region, &grid, &facilities, |outcome| {
            pb.inc(1);
            pb.set_message(outcome.facility.name.clone());
        })
        .await?;
    pb.finish_and_clear();

    let paths = write_report(&report, &config.output.dir)?;

    let coverage = &report.coverage;
    info!(
        "{}: {} of {} catchments available",
        region.display_name(),
        report.available_catchments(),
        report.catchments.len()
    );
    info!(
        "Population with access within {} minutes: {} of {} ({:.2}%)",
        report.time_budget_secs / 60,
        coverage.population_with_access,
        coverage.total_population,
        coverage.percent_with_access
    );
    info!("Summary written to {}", paths.summary.display());

    Ok(())
}
