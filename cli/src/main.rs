//! Obmin CLI
//!
//! Terminal front-end for the obmin currency converter: loads rates once
//! at startup (fresh cache, then network, then stale cache), then runs an
//! interactive session or a one-shot conversion.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use obmin_common::CurrencyCode;
use obmin_rates::{ConversionEngine, NbuProvider, RateCache, RateLoader, RateStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod session;

use session::Session;

/// Obmin currency converter CLI
#[derive(Parser, Debug)]
#[command(name = "obmin")]
#[command(about = "Hryvnia exchange-rate converter backed by the NBU daily rate list")]
struct Args {
    /// Cache file path (defaults to a slot under the OS temp directory)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Exchange-rate endpoint override
    #[arg(long)]
    endpoint: Option<String>,

    /// One-shot mode: convert this amount and exit
    #[arg(short, long)]
    amount: Option<String>,

    /// Currency to convert from
    #[arg(long, default_value = "USD")]
    from: String,

    /// Currency to convert to
    #[arg(long, default_value = "UAH")]
    to: String,

    /// Start the interactive session with auto-calculation disabled
    #[arg(long)]
    no_auto: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let cache_path = args.cache.unwrap_or_else(RateCache::default_path);
    let provider = match &args.endpoint {
        Some(endpoint) => NbuProvider::with_endpoint(endpoint),
        None => NbuProvider::new(),
    }
    .context("failed to build the rate provider")?;

    let store = Arc::new(RateStore::new(RateCache::new(cache_path)));
    let loader = RateLoader::new(Arc::new(provider));

    let outcome = loader
        .load(&store)
        .await
        .context("exchange-rate data unavailable (no network and no cache)")?;

    info!(?outcome, "Rates loaded");
    if outcome.is_possibly_stale() {
        eprintln!("Warning: using cached, possibly stale exchange rates.");
    }

    match args.amount {
        Some(raw) => {
            let engine = ConversionEngine::new(store);
            let result = engine.convert_text(
                &raw,
                CurrencyCode::new(&args.from),
                CurrencyCode::new(&args.to),
            )?;

            println!("{}", session::render_result(&result));
            Ok(())
        }
        None => Session::new(store, !args.no_auto).run().await,
    }
}
