use anyhow::{Context, Result};

use bbref_harvest::aggregator::Aggregator;
use bbref_harvest::config::CrawlConfig;
use bbref_harvest::crawl::run_crawl;
use bbref_harvest::page_source::HttpPageSource;
use bbref_harvest::persist::write_snapshot;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let config = CrawlConfig::default();
    let source = HttpPageSource::new()?;
    let aggregator = Aggregator::new();

    let summary = run_crawl(&config, &source, &aggregator)?;
    log::info!(
        "discovery pages: {}/{} ok, stubs: {}, profiles submitted: {}",
        summary.index.pages_visited,
        summary.index.pages_visited + summary.index.pages_failed,
        summary.index.stubs_inserted,
        summary.index.tasks_submitted
    );
    log::info!(
        "profiles merged: {}, failed: {}, unmatched: {}, panicked: {}",
        summary.profiles_merged,
        summary.profiles_failed,
        summary.profiles_unmatched,
        summary.drained.panicked
    );

    let written = write_snapshot(&aggregator, &config.output)
        .with_context(|| format!("snapshot to {} failed", config.output.display()))?;
    log::info!("wrote {written} players to {}", config.output.display());

    println!("Done");
    Ok(())
}
