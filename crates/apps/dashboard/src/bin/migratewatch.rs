use std::sync::Arc;

use analysis::species_info::fetch_species_info;
use analysis::{AnalysisPanels, Conversation};
use clap::{Parser, Subcommand};
use dashboard::Session;
use layers::headless::HeadlessFactory;
use layers::ViewMode;
use rand::rngs::StdRng;
use rand::SeedableRng;
use selection::{find_species, species_id, DataKey, SelectionStore, DEFAULT_SPECIES};
use serde::Serialize;
use serde_json::json;
use sources::{DataClient, SourceConfig, TextRelay};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Marine migration and shipping conflict dashboard")]
struct Args {
    /// Base URL of the migration/shipping data service
    #[arg(long)]
    data_url: Option<String>,

    /// Base URL of the OBIS occurrence API
    #[arg(long)]
    obis_url: Option<String>,

    /// Text-generation relay endpoint (repeatable)
    #[arg(long = "relay-url")]
    relay_urls: Vec<String>,

    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Seed for randomized analysis defaults
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a species' migration route
    Migration {
        /// Scientific name, e.g. "Gadus morhua"
        #[arg(long, default_value = DEFAULT_SPECIES)]
        species: String,

        #[arg(long)]
        year: Option<String>,

        /// Month 1-12; requires --year
        #[arg(long)]
        month: Option<String>,
    },

    /// Fetch the shipping lane for a period
    Shipping {
        #[arg(long)]
        year: Option<String>,

        #[arg(long)]
        month: Option<String>,
    },

    /// Run the four analysis panels
    Analysis {
        #[arg(long, default_value = DEFAULT_SPECIES)]
        species: String,

        #[arg(long)]
        year: Option<String>,

        #[arg(long)]
        month: Option<String>,
    },

    /// Summarize OBIS occurrences and ask the relay for an analysis
    SpeciesInfo {
        #[arg(long, default_value = DEFAULT_SPECIES)]
        species: String,
    },

    /// Ask the assistant a question
    Ask {
        question: String,
    },

    /// Render a headless session and print the display-list summary
    Render {
        /// Species id from the catalog, e.g. "thunnus-thynnus"
        #[arg(long)]
        species_id: Option<String>,

        #[arg(long)]
        year: Option<String>,

        #[arg(long)]
        month: Option<String>,

        /// "2d" or "3d"
        #[arg(long, default_value = "2d")]
        view: String,

        /// Frames to run after the data settles
        #[arg(long, default_value_t = 60)]
        frames: usize,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Validates the period the same way the dashboard selection does.
fn data_key(
    species: &str,
    year: Option<&str>,
    month: Option<&str>,
) -> Result<DataKey, Box<dyn std::error::Error>> {
    let mut store = SelectionStore::default();
    store.select_species(&species_id(species), species)?;
    if let Some(year) = year {
        store.select_year(year);
    }
    if let Some(month) = month {
        store.select_month(month)?;
    }
    Ok(store.current().data_key())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = SourceConfig::from_env();
    if let Some(url) = args.data_url {
        config.data_url = url;
    }
    if let Some(url) = args.obis_url {
        config.obis_url = url;
    }
    if !args.relay_urls.is_empty() {
        config.relay_urls = args.relay_urls;
    }
    if let Some(ms) = args.timeout_ms {
        config.timeout_ms = ms;
    }
    info!(data_url = %config.data_url, relays = config.relay_urls.len(), "starting");

    let client = DataClient::connect(config)?;
    let relay: Arc<dyn TextRelay> = Arc::new(client.relay());
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match args.command {
        Command::Migration {
            species,
            year,
            month,
        } => {
            let key = data_key(&species, year.as_deref(), month.as_deref())?;
            let fetch = client
                .migration(&key.species_name, key.year.as_deref(), key.month.as_deref())
                .await;
            print_json(&fetch)?;
        }
        Command::Shipping { year, month } => {
            let key = data_key(DEFAULT_SPECIES, year.as_deref(), month.as_deref())?;
            let series = client
                .shipping(key.year.as_deref(), key.month.as_deref())
                .await;
            print_json(&series)?;
        }
        Command::Analysis {
            species,
            year,
            month,
        } => {
            let key = data_key(&species, year.as_deref(), month.as_deref())?;
            let mut panels = AnalysisPanels::new();
            panels.load(relay.as_ref(), key, &mut rng).await;
            print_json(&panels)?;
        }
        Command::SpeciesInfo { species } => {
            match fetch_species_info(&client, relay.as_ref(), &species).await {
                Ok(info) => print_json(&info)?,
                Err(e) => {
                    error!(error = %e, species = %species, "species info failed");
                    print_json(&json!({ "error": e.to_string() }))?;
                    std::process::exit(1);
                }
            }
        }
        Command::Ask { question } => {
            let mut conversation = Conversation::new();
            let origin = conversation.send(relay.as_ref(), &question, &mut rng).await;
            print_json(&json!({
                "origin": origin,
                "messages": conversation.messages(),
            }))?;
        }
        Command::Render {
            species_id,
            year,
            month,
            view,
            frames,
        } => {
            let mode = ViewMode::parse(&view);
            let seed = args.seed.unwrap_or(0);
            let mut session = Session::new(
                client,
                relay,
                Box::new(HeadlessFactory::default()),
                mode,
            )
            .with_seed(seed);

            if let Some(id) = species_id {
                let name = find_species(&id).ok_or_else(|| format!("unknown species id '{id}'"))?;
                session.select_species(&id, name)?;
            }
            if let Some(year) = year {
                session.select_year(&year);
            }
            if let Some(month) = month {
                session.select_month(&month)?;
            }
            if session.in_flight() == 0 {
                session.refresh();
            }
            session.settle().await;
            let ran = session.tick_frames(frames);

            let summary = session.display_list().map(|list| list.summary());
            print_json(&json!({
                "session": session.snapshot(),
                "framesRun": ran,
                "displayList": summary,
            }))?;
        }
    }
    Ok(())
}
