//! SimpleCurrency CLI
//!
//! Operator tool for inspecting the current rate table and checking how
//! amounts convert and render.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simplecurrency_common::CurrencyCode;
use simplecurrency_fx::{CurrencyFormatRegistry, FxConfig};

mod commands;

/// SimpleCurrency CLI
#[derive(Parser, Debug)]
#[command(name = "simplecurrency")]
#[command(about = "Inspect exchange rates and render prices")]
struct Args {
    /// Use fallback rates only, never query the live feed
    #[arg(long, global = true)]
    offline: bool,

    /// Latest-rates endpoint (overrides SIMPLECURRENCY_FEED_URL)
    #[arg(long, global = true)]
    feed_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current rate table
    Rates {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert an amount between two currencies
    Convert {
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        from: String,
        to: String,
    },

    /// Render an amount with its currency symbol
    Format {
        #[arg(allow_hyphen_values = true)]
        amount: Decimal,
        currency: String,
    },

    /// Show a product price as a visitor in another currency sees it
    Price {
        /// Currency the product is priced in
        #[arg(long)]
        currency: String,

        /// Product price in its own currency
        #[arg(long)]
        base_price: Decimal,

        /// Visitor currency
        #[arg(long)]
        to: String,
    },
}

fn init_logging(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = FxConfig::from_env();
    if args.offline {
        config.live_feed = false;
    }
    if let Some(url) = args.feed_url.clone() {
        config.feed_url = url;
    }

    init_logging(&config.log_level, args.json_logs);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(
        base = %config.base_currency,
        live_feed = config.live_feed,
        "Loading rates"
    );

    let provider = config.build_provider();
    let rates = provider.get_rates().await;
    let formats = CurrencyFormatRegistry::builtin();

    let output = match args.command {
        Command::Rates { json } => {
            if json {
                serde_json::to_string_pretty(rates.as_ref())?
            } else {
                commands::render_rates(&rates)
            }
        }
        Command::Convert { amount, from, to } => commands::render_conversion(
            amount,
            &CurrencyCode::new(from),
            &CurrencyCode::new(to),
            &rates,
            &formats,
        )?,
        Command::Format { amount, currency } => {
            commands::render_format(amount, &CurrencyCode::new(currency), &formats)
        }
        Command::Price {
            currency,
            base_price,
            to,
        } => commands::render_price(
            &CurrencyCode::new(currency),
            base_price,
            &CurrencyCode::new(to),
            &rates,
            &formats,
        )?,
    };

    println!("{output}");
    Ok(())
}
