use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

// Import the library
use rsa_builder::config::{self, ApiConfig, FileStore};
use rsa_builder::error::{GenerationError, ModelError};
use rsa_builder::export::ExportDocument;
use rsa_builder::generation::{self, Provider};
use rsa_builder::models::{Campaign, MatchType};
use rsa_builder::optimiser::FeedField;
use rsa_builder::{AdBuilder, FeedOptimiser, KeywordOptions};

/// Google Ads RSA bulk-upload builder and Shopping feed optimiser
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding saved settings
    #[arg(long, global = true, default_value = ".rsa-builder")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export campaigns to a bulk-upload CSV
    Export {
        /// Path to the campaigns JSON file
        #[arg(short, long)]
        campaigns: PathBuf,

        /// Output file path (defaults to the dated export filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate ad copy and write it back into the campaigns file
    Generate {
        /// Path to the campaigns JSON file
        #[arg(short, long)]
        campaigns: PathBuf,

        /// Only this ad group (defaults to every ad group with product info)
        #[arg(short, long)]
        ad_group: Option<String>,
    },

    /// Generate keywords for one ad group
    Keywords {
        /// Path to the campaigns JSON file
        #[arg(short, long)]
        campaigns: PathBuf,

        #[arg(short, long)]
        ad_group: String,

        /// What the keywords should be about
        #[arg(short, long)]
        prompt: String,

        /// Maximum number of keyword ideas
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Match types to create, e.g. exact,phrase,negative-exact
        #[arg(long, value_delimiter = ',', default_values = ["exact", "phrase"])]
        match_types: Vec<MatchType>,
    },

    /// Optimise titles or descriptions in a product feed
    Feed {
        /// Path to the TSV feed
        #[arg(short, long)]
        input: PathBuf,

        /// Rewrite product titles
        #[arg(long)]
        titles: bool,

        /// Rewrite product descriptions
        #[arg(long)]
        descriptions: bool,

        /// 1-based product rows to optimise (defaults to all)
        #[arg(long, value_delimiter = ',')]
        rows: Vec<usize>,

        /// Attributes listed in the prompt (defaults to brand,color,size,material)
        #[arg(long, value_delimiter = ',')]
        attributes: Vec<String>,

        /// Output file path (defaults to the dated export filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or change the generation provider settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the saved provider and whether a key is set
    Show,

    /// Save provider and/or key
    Set {
        /// gemini-2.5-flash or claude-sonnet-4
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        key: Option<String>,
    },

    /// Remove the saved settings
    Clear,
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rsa_builder=info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;

    // Library code logs through the log facade
    tracing_log::LogTracer::init()?;
    Ok(())
}

async fn read_campaigns(path: &Path) -> Result<Vec<Campaign>, Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

async fn write_campaigns(path: &Path, campaigns: &[Campaign]) -> Result<(), Box<dyn std::error::Error>> {
    tokio::fs::write(path, serde_json::to_string_pretty(campaigns)?).await?;
    Ok(())
}

async fn write_document(document: &ExportDocument, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(&document.filename));
    tokio::fs::write(&path, &document.contents).await?;
    println!("Written to {}", path.display());
    Ok(())
}

fn generation_client(state_dir: &Path) -> Result<Box<dyn generation::GenerationService>, Box<dyn std::error::Error>> {
    let store = FileStore::new(state_dir);
    let config = config::load_api_config(&store);
    Ok(generation::client_for(&config)?)
}

fn mask(key: &str) -> String {
    if key.is_empty() {
        "(not set)".to_string()
    } else {
        format!("{}****", key.chars().take(4).collect::<String>())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;
    let cli = Cli::parse();
    let today = Local::now().date_naive();

    match &cli.command {
        Commands::Export { campaigns, output } => {
            let mut builder = AdBuilder::from_campaigns(read_campaigns(campaigns).await?);
            let document = builder.export(today)?;
            write_document(&document, output.as_deref()).await?;
        }
        Commands::Generate { campaigns, ad_group } => {
            let service = generation_client(&cli.state_dir)?;
            let mut builder = AdBuilder::from_campaigns(read_campaigns(campaigns).await?);

            match ad_group {
                Some(name) => {
                    let (campaign_id, ad_group_id) = builder
                        .find_ad_group(name)
                        .ok_or_else(|| ModelError::AdGroupNotFound(name.clone()))?;
                    builder
                        .generate_ad_copy(service.as_ref(), campaign_id, ad_group_id)
                        .await?;
                }
                None => {
                    for outcome in builder.generate_all_ad_copy(service.as_ref()).await {
                        match outcome.result {
                            Ok(()) => println!("{}: ok", outcome.ad_group_name),
                            Err(e) => println!("{}: {}", outcome.ad_group_name, e),
                        }
                    }
                }
            }

            if let Some(message) = builder.status.success.as_deref().or(builder.status.error.as_deref()) {
                println!("{}", message);
            }
            write_campaigns(campaigns, builder.campaigns()).await?;
        }
        Commands::Keywords {
            campaigns,
            ad_group,
            prompt,
            count,
            match_types,
        } => {
            let service = generation_client(&cli.state_dir)?;
            let mut builder = AdBuilder::from_campaigns(read_campaigns(campaigns).await?);
            let (campaign_id, ad_group_id) = builder
                .find_ad_group(ad_group)
                .ok_or_else(|| ModelError::AdGroupNotFound(ad_group.clone()))?;

            let options = KeywordOptions {
                prompt: prompt.clone(),
                count: *count,
                match_types: match_types.clone(),
            };
            let added = builder
                .generate_keywords(service.as_ref(), campaign_id, ad_group_id, &options)
                .await?;
            println!("Added {} keywords to {}", added, ad_group);
            write_campaigns(campaigns, builder.campaigns()).await?;
        }
        Commands::Feed {
            input,
            titles,
            descriptions,
            rows,
            attributes,
            output,
        } => {
            let mut optimiser = FeedOptimiser::new();
            optimiser.load(&tokio::fs::read_to_string(input).await?)?;
            if !attributes.is_empty() {
                optimiser.settings.selected_attributes = attributes.clone();
            }

            if *titles || *descriptions {
                let service = generation_client(&cli.state_dir)?;
                let ids: Vec<_> = optimiser
                    .feed()
                    .map(|feed| feed.rows().iter().map(|r| r.id).collect())
                    .unwrap_or_default();
                if rows.is_empty() {
                    optimiser.select_all();
                } else {
                    for &row in rows {
                        let id = row
                            .checked_sub(1)
                            .and_then(|i| ids.get(i))
                            .ok_or_else(|| ModelError::MissingInput(format!("No product row {}", row)))?;
                        optimiser.select(*id);
                    }
                }

                let fields = [(*titles, FeedField::Title), (*descriptions, FeedField::Description)];
                for (_, field) in fields.into_iter().filter(|(wanted, _)| *wanted) {
                    for outcome in optimiser.optimise_selected(service.as_ref(), field).await {
                        if let Err(e) = outcome.result {
                            println!("Row {}: {}", outcome.row_id, e);
                        }
                    }
                }
            }

            let document = optimiser.export(today)?;
            write_document(&document, output.as_deref()).await?;
        }
        Commands::Config { action } => {
            let store = FileStore::new(&cli.state_dir);
            match action {
                ConfigAction::Show => {
                    let api_config = config::load_api_config(&store);
                    println!("Provider: {}", api_config.provider);
                    println!("Key: {}", mask(&api_config.key));
                    println!("Connected: {}", api_config.is_connected());
                }
                ConfigAction::Set { provider, key } => {
                    let mut api_config: ApiConfig = config::load_api_config(&store);
                    if let Some(provider) = provider {
                        if Provider::from_id(provider).is_none() {
                            return Err(GenerationError::UnsupportedProvider(provider.clone()).into());
                        }
                        api_config.provider = provider.clone();
                    }
                    if let Some(key) = key {
                        api_config.key = key.clone();
                    }
                    config::save_api_config(&store, &api_config)?;
                    println!("API configuration saved");
                }
                ConfigAction::Clear => {
                    config::clear_api_config(&store)?;
                    println!("API configuration cleared!");
                }
            }
        }
    }

    Ok(())
}
