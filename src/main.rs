mod allocation;
mod config;
mod error;
mod quotes;
mod rebalance;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{info, warn};

use crate::allocation::compute_buys;
use crate::config::Config;
use crate::error::AppError;
use crate::quotes::QuoteSession;

#[derive(Debug, Parser)]
#[command(about = "Compute a daily dip-buying plan for a basket of NSE tickers")]
struct Args {
    /// Basket configuration file
    #[arg(long, default_value = "input.yaml")]
    config: PathBuf,

    /// Persist updated per-ticker weights after computing the plan
    #[arg(short, long)]
    rebalance_weights: bool,

    /// Quote endpoint override (e.g. a local fixture server)
    #[arg(long, default_value = quotes::DEFAULT_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let mut config = Config::load(&args.config)?;
    info!(
        "loaded {} tickers from {}",
        config.tickers.len(),
        args.config.display()
    );

    let session = QuoteSession::acquire(&args.base_url).await?;
    let symbols: Vec<String> = config.tickers.keys().cloned().collect();
    let quotes = session.fetch_snapshots(&symbols).await;
    info!("got quotes for {}/{} symbols", quotes.len(), symbols.len());

    let plan = compute_buys(config.daily_limit, config.threshold, &config.tickers, &quotes);

    if plan.orders.is_empty() {
        warn!("no ticker qualified for a buy today");
        println!("No buys today.");
    } else {
        println!("Buy orders:");
        for (symbol, shares) in &plan.orders {
            if let Some(quote) = quotes.get(symbol) {
                println!(
                    "  {symbol:<12} {shares:>5} @ {:>10.2} = {:.2}",
                    quote.last_price,
                    *shares as f64 * quote.last_price
                );
            }
        }
        println!("Total expenditure: {:.2}", plan.total_expenditure);
    }

    // Weight mutation is opt-in; the default run never writes.
    if args.rebalance_weights {
        rebalance::apply_rebalance(&mut config, &plan);
        config.save(&args.config)?;
        info!("weights updated and written to {}", args.config.display());
    }

    Ok(())
}
