//! ML Data Scraper operator binary.
//!
//! Asks for a search subject, reads the page bound from the first result
//! page, asks how many pages to collect and in which format, then scrapes
//! and exports the table.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::{Input, theme::ColorfulTheme};
use tracing::{error, info, warn};

use ml_data_scraper_lib::domain::MAX_PAGES;
use ml_data_scraper_lib::infrastructure::{
    ConfigManager, ExportFormat, HttpClient, export, init_logging_with_config, log_system_info,
};
use ml_data_scraper_lib::{PageEstimate, ScrapeService};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load_config()?;
    init_logging_with_config(config.logging.clone())?;
    log_system_info();
    info!("Configuration file: {:?}", config_manager.config_path());

    let transport = Arc::new(HttpClient::from_scraper_config(&config.scraper)?);
    let service = ScrapeService::from_config(transport, &config)
        .context("Invalid selector configuration")?;

    let theme = ColorfulTheme::default();
    let subject: String = Input::with_theme(&theme)
        .with_prompt("What do you want to search for?")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("The search subject cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let subject = subject.trim().to_string();

    let session = match service.start(&subject).await {
        Ok(session) => session,
        Err(abort) => {
            error!("Could not load the first result page: {}", abort);
            return Err(abort.into());
        }
    };

    let estimate = *session.estimate();
    print_estimate_notes(&estimate);

    let upper = estimate.total_pages.max(1);
    let pages: u32 = Input::with_theme(&theme)
        .with_prompt(format!("How many pages do you want to scrape? (1-{})", upper))
        .validate_with(|pages: &u32| -> Result<(), String> {
            if *pages < 1 {
                Err("At least one page must be scraped".to_string())
            } else if *pages > upper {
                warn!("Requested {} pages, above the bound of {}", pages, upper);
                Err(format!("Only {} pages are available", upper))
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let format: ExportFormat = Input::with_theme(&theme)
        .with_prompt("Export format (CSV/EXCEL)")
        .interact_text()?;

    let report = match session.collect(pages).await {
        Ok(report) => report,
        Err(abort) => {
            warn!(
                "Discarding {} records collected before page {} failed; nothing was exported",
                abort.partial.len(),
                abort.page
            );
            return Err(abort.into());
        }
    };

    let output_dir = config.export.resolve_output_dir();
    let path = export(&report.result_set, &subject, format, &output_dir)?;

    println!();
    println!("Items scraped: {}", report.len());
    println!("Pages visited: {}", report.pages_visited());
    println!("Saved to: {}", path.display());
    println!("Elapsed time: {:.1?}", report.elapsed);

    Ok(())
}

/// Advisory notes about the page bound shown before asking for a page count
fn print_estimate_notes(estimate: &PageEstimate) {
    match estimate.advertised_results {
        Some(results) => println!(
            "The site reports {} results, about {} pages of {}.",
            results, estimate.total_pages, estimate.page_size
        ),
        None => println!("The results counter could not be read; only the first page is known to exist."),
    }
    println!("Note: the results counter is an estimate, the number of items scraped may differ.");
    if estimate.is_capped() {
        println!("Note: the site never serves more than {} result pages.", MAX_PAGES);
    }
}
