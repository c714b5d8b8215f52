//! Fare Probe
//!
//! Runs a single provider query and prints what the parser makes of each
//! listing. Useful when the page layout changes and prices stop updating.

use clap::Parser;
use fare_watch::domain::{parse_fare, Fare};
use fare_watch::infra::Config;
use fare_watch::io::{HttpListingProvider, ListingProvider};

#[derive(Parser, Debug)]
#[command(name = "fare-probe", about = "Query one route and show the parsed fares")]
struct Args {
    /// Origin location code
    origin: String,

    /// Destination location code
    destination: String,

    /// Travel date, passed to the provider as-is
    date: String,

    /// Provider URL (overrides the config file)
    #[arg(long)]
    url: Option<String>,

    /// Config file to read the provider URL from
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,

    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Also print the raw text of rejected listings
    #[arg(long)]
    raw: bool,
}

fn price_label(fare: &Fare) -> String {
    if fare.has_known_price() {
        format!("R$ {}", fare.price)
    } else {
        "unknown".to_string()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let url = match args.url {
        Some(url) => url,
        None => Config::from_file(&args.config)?.provider_url().to_string(),
    };

    println!("\nProvider: {}", url);
    println!("Query:    {} -> {} on {}\n", args.origin, args.destination, args.date);

    let provider = HttpListingProvider::new(&url, args.timeout_ms)?;
    let listings = provider.query(&args.origin, &args.destination, &args.date).await?;

    let mut fares = Vec::new();
    let mut rejected = 0usize;
    for (i, raw) in listings.iter().enumerate() {
        match parse_fare(raw) {
            Ok(fare) => fares.push(fare),
            Err(e) => {
                rejected += 1;
                println!("listing #{:<3} rejected: {}", i, e);
                if args.raw {
                    println!("    {:?}", raw);
                }
            }
        }
    }

    // Stable sort keeps provider order among equal prices
    fares.sort_by_key(|f| f.price);

    println!("\n{} listings, {} parsed, {} rejected\n", listings.len(), fares.len(), rejected);
    for fare in &fares {
        println!(
            "  {:>12}  {:<20} {} -> {}  {:<10} {}",
            price_label(fare),
            fare.carrier,
            fare.departure_time,
            fare.arrival_time,
            fare.duration,
            fare.stops
        );
    }

    if let Some(best) = fares.first() {
        println!("\nCheapest: {}", best);
    }
    Ok(())
}
