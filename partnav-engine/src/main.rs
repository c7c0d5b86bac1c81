//! partnav - command-line front end for the catalog navigator
//!
//! Loads a catalog snapshot, runs one navigator command against it and
//! prints the result. Logs go to stderr; results go to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use partnav_common::config::NavigatorConfig;
use partnav_common::{
    CategoryId, EngineId, MakeId, ModelId, SearchResult, VehicleCoordinates, VehicleScope, Year,
};
use partnav_engine::{
    Catalog, CatalogProvider, ExpansionOutcome, InMemoryCatalog, Navigator, NavigatorCommand,
};

/// Command-line arguments for partnav
#[derive(Parser, Debug)]
#[command(name = "partnav")]
#[command(about = "Browse and search an auto-parts catalog by vehicle fitment")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog snapshot (JSON); overrides `catalog_path` from the config
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a free-text query into vehicles and parts
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Search category names, optionally for one vehicle
    Categories {
        query: String,
        #[arg(long)]
        year: Option<Year>,
        #[arg(long)]
        make: Option<MakeId>,
        #[arg(long)]
        model: Option<ModelId>,
        #[arg(long)]
        engine: Option<EngineId>,
    },

    /// Resolve a query and reveal one of its vehicle results in the tree
    Reveal {
        #[arg(required = true)]
        query: Vec<String>,
        /// Which vehicle result to reveal (0 = first)
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// Select a part type for a vehicle and list its parts
    Select {
        #[arg(long)]
        year: Year,
        #[arg(long)]
        make: MakeId,
        #[arg(long)]
        model: ModelId,
        #[arg(long)]
        engine: EngineId,
        #[arg(long)]
        category: CategoryId,
        /// Filter the parts list
        #[arg(long, default_value = "")]
        filter: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = NavigatorConfig::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting partnav v{}", env!("CARGO_PKG_VERSION"));

    let catalog_path = args
        .catalog
        .or_else(|| config.catalog_path.clone())
        .ok_or_else(|| anyhow!("No catalog given: pass --catalog or set catalog_path in the config"))?;
    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;

    let provider = Arc::new(
        InMemoryCatalog::new(catalog)
            .with_latency(config.provider.latency())
            .with_max_results(config.search.max_results),
    );

    match args.command {
        Command::Search { query } => {
            let results = provider.search(&query.join(" ")).await?;
            print_results(&results);
        }

        Command::Categories { query, year, make, model, engine } => {
            let context = match (year, make, model) {
                (Some(year), Some(make), Some(model)) => {
                    Some(vehicle_scope(provider.catalog(), year, make, model, engine)?)
                }
                (None, None, None) if engine.is_none() => None,
                _ => bail!("--year, --make and --model must be given together"),
            };
            let results = provider.search_categories(&query, context.as_ref()).await?;
            print_results(&results);
        }

        Command::Reveal { query, index } => {
            let query = query.join(" ");
            let results = provider.search(&query).await?;
            let result = results
                .into_iter()
                .filter(|r| r.vehicle().is_some())
                .nth(index)
                .ok_or_else(|| anyhow!("No vehicle result #{} for {:?}", index, query))?;

            let navigator = Navigator::start(provider.clone(), &config).await?;
            println!("revealing  {}", result.label());
            let outcome = navigator.execute(NavigatorCommand::ExpandToVehicle(result)).await;
            print_outcome(&outcome);

            for key in navigator.tree().expanded_keys(None).await {
                println!("expanded   {}", key);
            }
        }

        Command::Select { year, make, model, engine, category, filter } => {
            let navigator = Navigator::start(provider.clone(), &config).await?;
            let request = SearchResult::Category {
                label: format!("category {}", category),
                category_id: category,
                category_name: String::new(),
                vehicle: VehicleCoordinates {
                    year: Some(year),
                    make_id: Some(make),
                    model_id: Some(model),
                    engine_id: Some(engine),
                    ..Default::default()
                },
            };

            let outcome = navigator.execute(NavigatorCommand::ExpandToCategory(request)).await;
            print_outcome(&outcome);
            if let ExpansionOutcome::Selected(_) = outcome {
                println!("{}", navigator.breadcrumb().await);
                for (position, parts) in navigator.parts_by_position(&filter).await? {
                    println!("[{}]", position);
                    for part in parts {
                        println!(
                            "  {:<10} {:<12} {:>9.2}  {:<12} {}",
                            part.brand,
                            part.part_number,
                            part.price,
                            part.tier.label(),
                            part.description
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn vehicle_scope(
    catalog: &Catalog,
    year: Year,
    make_id: MakeId,
    model_id: ModelId,
    engine_id: Option<EngineId>,
) -> Result<VehicleScope> {
    let make = catalog.make(make_id).ok_or_else(|| anyhow!("Unknown make {}", make_id))?;
    let model = catalog.model(model_id).ok_or_else(|| anyhow!("Unknown model {}", model_id))?;
    let engine_name = match engine_id {
        Some(id) => Some(
            catalog
                .engine(id)
                .ok_or_else(|| anyhow!("Unknown engine {}", id))?
                .name
                .clone(),
        ),
        None => None,
    };

    Ok(VehicleScope {
        year,
        make_id,
        make_name: make.name.clone(),
        model_id,
        model_name: model.name.clone(),
        engine_id,
        engine_name,
    })
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results found");
    }
    for result in results {
        println!("{:<9} {}", result.kind(), result.label());
    }
}

fn print_outcome(outcome: &ExpansionOutcome) {
    match outcome {
        ExpansionOutcome::Revealed { path } => println!(
            "selected   year={:?} make={:?} model={:?} engine={:?}",
            path.year, path.make_id, path.model_id, path.engine_id
        ),
        ExpansionOutcome::Selected(selection) => println!(
            "selected   {} {} {} {} / {}",
            selection.year,
            selection.make.name,
            selection.model.name,
            selection.engine.name,
            selection.category.name
        ),
        ExpansionOutcome::Rejected(reason) => println!("rejected   {}", reason),
        ExpansionOutcome::ResolutionFailed { unresolved } => {
            let missing: Vec<String> = unresolved.iter().map(ToString::to_string).collect();
            println!("unresolved {}", missing.join(", "));
        }
        other => println!("{:?}", other),
    }
}
