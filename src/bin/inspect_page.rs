//! Inspect a saved page (by default the `out.html` dump written when a
//! search finds no payload) and report what the client would make of it.

use anyhow::{Context, Result};
use auto24_api::extract::{self, PageKind};
use auto24_api::SearchResponse;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "out.html".to_string());
    let html = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    println!("{}: {} bytes", path, html.len());

    match extract::classify_page(&html) {
        PageKind::Captcha => println!("captcha page: the site served an anti-bot challenge"),
        PageKind::MissingPayload => {
            println!("no initial-state script found");
            let document = scraper::Html::parse_document(&html);
            let title = scraper::Selector::parse("title")
                .ok()
                .and_then(|sel| document.select(&sel).next().map(|t| t.text().collect::<String>()));
            println!("page title: {}", title.as_deref().unwrap_or("<none>").trim());
        }
        PageKind::Payload(script) => {
            println!("initial-state script: {} bytes", script.len());
            let state = extract::parse_initial_state(&script).context("payload is not valid JSON")?;
            match SearchResponse::from_state(state) {
                Ok(response) => {
                    println!("stats: {}", response.stats());
                    println!("search results: {}", response.search_results().len());
                }
                Err(e) => println!("payload parsed but unusable: {}", e),
            }
        }
    }

    Ok(())
}
