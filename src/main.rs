use anyhow::{anyhow, Result};
use auto24_api::{Auto24Client, Auto24Config, SearchQuery};
use dotenv::dotenv;
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Usage: `auto24 make=bmw priceTo=20000 page=2`
///
/// Configuration comes from `AUTO24_*` variables (see `Auto24Config::from_env`).
#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut query = SearchQuery::new();
    for arg in std::env::args().skip(1) {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("expected a key=value filter, got '{}'", arg))?;
        query = query.param(key, value);
    }

    let config = Auto24Config::from_env()?;
    let mut client = Auto24Client::new(config)?;
    let response = client.search(&query).await?;

    let summary = json!({
        "stats": response.stats(),
        "count": response.search_results().len(),
        "results": response.search_results(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
