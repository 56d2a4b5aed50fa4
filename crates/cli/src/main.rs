//! Storefront Cart CLI - Inspect and edit a file-backed cart.
//!
//! # Usage
//!
//! ```bash
//! # Add a product (repeat to increase its quantity)
//! cart-cli add --id p1 --name "Pineapple Tee" --price 19.99 --vendor Acme
//!
//! # Set a quantity (0 or less removes the line)
//! cart-cli update --id p1 --quantity 3
//!
//! # Show the cart, or print it as the stored JSON record
//! cart-cli show
//! cart-cli show --json
//!
//! # Print the checkout payload and clear the cart
//! cart-cli checkout
//! ```
//!
//! # Commands
//!
//! - `show` - Print lines and totals
//! - `add` - Add one unit of a product
//! - `remove` - Remove a product
//! - `update` - Set a product's quantity
//! - `clear` - Empty the cart
//! - `checkout` - Print the checkout payload and empty the cart
//!
//! Configuration is read from the environment; see `storefront_cart::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use storefront_cart::{CartConfig, CartStore, ChangeBus, FileStorage};
use storefront_cart_core::ProductId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Storefront cart CLI")]
struct Cli {
    /// Override the storage directory (`CART_STORAGE_DIR`)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart lines and totals
    Show {
        /// Print the stored JSON record instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add one unit of a product
    Add {
        /// Product id
        #[arg(short, long)]
        id: ProductId,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Unit price
        #[arg(short, long)]
        price: Decimal,

        /// Image URL
        #[arg(long)]
        image: Option<String>,

        /// Vendor name
        #[arg(long)]
        vendor: Option<String>,
    },
    /// Remove a product from the cart
    Remove {
        /// Product id
        #[arg(short, long)]
        id: ProductId,
    },
    /// Set the quantity of a product (0 or less removes it)
    Update {
        /// Product id
        #[arg(short, long)]
        id: ProductId,

        /// New quantity
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove every product from the cart
    Clear,
    /// Print the checkout payload as JSON and clear the cart
    Checkout,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    Some(sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr so stdout stays
/// machine-readable.
fn init_tracing(json_logs: bool, sentry_enabled: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_cart=warn,cart_cli=info".into());

    let (plain, json) = if json_logs {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        )
    } else {
        (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        )
    };

    let sentry = sentry_enabled.then(|| sentry_tracing::layer().event_filter(sentry_event_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(plain)
        .with(json)
        .with(sentry)
        .init();
}

fn main() {
    let cli = Cli::parse();

    // Load configuration first (needed for Sentry init)
    let config = CartConfig::from_env();
    let sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing(cli.json_logs, sentry_guard.is_some());

    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    let result: Result<(), Box<dyn std::error::Error>> = config
        .map_err(Into::into)
        .and_then(|config| run(cli.command, cli.dir, config));

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

fn run(
    command: Commands,
    dir: Option<PathBuf>,
    mut config: CartConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = dir {
        config.storage_dir = dir;
    }

    let storage = FileStorage::new(&config.storage_dir);
    let mut store = CartStore::open(storage, ChangeBus::new(), &config);
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Show { json } => commands::cart::show(&store, json, &mut out)?,
        Commands::Add {
            id,
            name,
            price,
            image,
            vendor,
        } => {
            let product = commands::cart::product_from_args(id, name, price, image, vendor);
            commands::cart::add(&mut store, &product, &mut out)?;
        }
        Commands::Remove { id } => commands::cart::remove(&mut store, &id, &mut out)?,
        Commands::Update { id, quantity } => {
            commands::cart::update(&mut store, &id, quantity, &mut out)?;
        }
        Commands::Clear => commands::cart::clear(&mut store, &mut out)?,
        Commands::Checkout => commands::cart::checkout(&mut store, &mut out)?,
    }

    store.close();
    Ok(())
}
