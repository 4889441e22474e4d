use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transync::config::{ClientFileConfig, LoggingConfig, ProductConfig};
use transync::{ClientContext, DataSourceManager};

#[derive(Parser)]
#[command(
    name = "transync",
    version,
    about = "Translation client with cache, bundle and server data sources",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (falls back to TRANSYNC_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Product to operate on (defaults to the only configured product)
    #[arg(short, long, global = true)]
    product: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Print Prometheus metrics before exiting
    #[arg(long, global = true, default_value = "false")]
    print_metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the product's translations and report what was loaded
    Warm,

    /// Print all messages of one component
    Get {
        /// Locale tag
        locale: String,

        /// Component name
        component: String,
    },

    /// Print a single message
    Message {
        /// Locale tag
        locale: String,

        /// Component name
        component: String,

        /// Message key
        key: String,
    },

    /// Print one component's keyed cache entry and its expiry state
    Cached {
        /// Locale tag
        locale: String,

        /// Component name
        component: String,
    },

    /// List cached locales
    Locales,

    /// List cached components
    Components,

    /// Re-run the fallback chain once
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (products, logging) = load_config(cli.config.as_deref())?;
    let log_format = cli.log_format.as_deref().unwrap_or(&logging.format);
    setup_tracing(log_format, &logging.level, cli.verbose)?;

    if let Err(e) = transync::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed");
    }

    tracing::info!(products = products.len(), "transync starting");

    let context = ClientContext::new();
    for product in products {
        context
            .register(product)
            .await
            .context("Invalid product configuration")?;
    }

    let product = resolve_product(&context, cli.product).await?;
    let manager = context
        .manager(&product)
        .await
        .with_context(|| format!("Failed to load translations for {product}"))?;

    match cli.command {
        Commands::Warm => warm(&manager).await,
        Commands::Get { locale, component } => get(&manager, &locale, &component).await?,
        Commands::Message {
            locale,
            component,
            key,
        } => message(&manager, &locale, &component, &key).await?,
        Commands::Cached { locale, component } => cached(&manager, &locale, &component).await?,
        Commands::Locales => {
            for locale in manager.locale_list().await {
                println!("{locale}");
            }
        }
        Commands::Components => {
            for component in manager.component_list().await {
                println!("{component}");
            }
        }
        Commands::Sync => {
            if !manager.sync_cache().await {
                anyhow::bail!("Sync failed for {product}");
            }
            println!("Synced {product}");
        }
    }

    if cli.print_metrics {
        let text = transync::metrics::encode_metrics()
            .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {e}"))?;
        print!("{text}");
    }

    tracing::info!("transync completed successfully");
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<(Vec<ProductConfig>, LoggingConfig)> {
    match path {
        Some(path) => {
            let file = ClientFileConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            Ok((file.all_products(), file.logging))
        }
        None => {
            let product = ProductConfig::from_env().context(
                "No --config given and TRANSYNC_PRODUCT / TRANSYNC_VERSION are not set",
            )?;
            Ok((vec![product], LoggingConfig::from_env()))
        }
    }
}

async fn resolve_product(context: &ClientContext, requested: Option<String>) -> Result<String> {
    if let Some(name) = requested {
        return Ok(name);
    }

    let mut names = context.configs().names().await;
    match names.len() {
        1 => Ok(names.remove(0)),
        0 => anyhow::bail!("No products configured"),
        _ => anyhow::bail!(
            "Several products configured ({}); pick one with --product",
            names.join(", ")
        ),
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("transync=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("transync={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

async fn warm(manager: &Arc<DataSourceManager>) {
    let locales = manager.locale_list().await;
    let components = manager.component_list().await;

    println!("Product: {}", manager.product_name());
    println!("  Locales ({}): {}", locales.len(), join(&locales));
    println!("  Components ({}): {}", components.len(), join(&components));
}

async fn get(manager: &Arc<DataSourceManager>, locale: &str, component: &str) -> Result<()> {
    let messages = manager
        .get_component_messages(locale, component)
        .await
        .with_context(|| format!("No messages for {component} in {locale}"))?;

    let sorted: BTreeMap<_, _> = messages.into_iter().collect();
    println!("{}", serde_json::to_string_pretty(&sorted)?);
    Ok(())
}

async fn message(
    manager: &Arc<DataSourceManager>,
    locale: &str,
    component: &str,
    key: &str,
) -> Result<()> {
    let text = manager
        .get_message(locale, component, key)
        .await
        .with_context(|| format!("No message {key} in {component}/{locale}"))?;
    println!("{text}");
    Ok(())
}

async fn cached(manager: &Arc<DataSourceManager>, locale: &str, component: &str) -> Result<()> {
    let (messages, info) = manager
        .cached_entry(locale, component)
        .await
        .with_context(|| format!("No cache entry for {component} in {locale}"))?;

    if let Some(info) = info {
        let updated = info
            .last_update
            .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
        println!("Last update: {updated}");
        println!("Expired: {}", info.is_expired());
    }

    let sorted: BTreeMap<_, _> = messages.into_iter().collect();
    println!("{}", serde_json::to_string_pretty(&sorted)?);
    Ok(())
}

fn join(items: &std::collections::BTreeSet<String>) -> String {
    items.iter().cloned().collect::<Vec<_>>().join(", ")
}
