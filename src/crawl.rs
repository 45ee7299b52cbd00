use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;

use crate::aggregator::{Aggregator, MergeOutcome};
use crate::config::CrawlConfig;
use crate::index_crawl::{IndexStats, ProfileTask, crawl_index};
use crate::page_source::PageSource;
use crate::profile_fetch::ProfileParser;
use crate::scheduler::{DrainReport, Scheduler};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub index: IndexStats,
    pub drained: DrainReport,
    pub profiles_merged: usize,
    pub profiles_failed: usize,
    pub profiles_unmatched: usize,
}

/// Discovery on the calling thread, profile fetches on the scheduler lanes.
/// Returns once every submitted profile has been merged, failed, or discarded,
/// so `aggregator` is ready to snapshot.
pub fn run_crawl(
    config: &CrawlConfig,
    source: &dyn PageSource,
    aggregator: &Aggregator,
) -> Result<CrawlSummary> {
    let profiles = ProfileParser::new()?;
    let scheduler = Scheduler::new(config.parallelism, config.delay, config.queue_capacity);
    log::info!(
        "crawling {} discovery pages with {} lanes, {:?} apart",
        config.letters.len(),
        scheduler.parallelism(),
        scheduler.delay()
    );

    let merged = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let unmatched = AtomicUsize::new(0);

    let fetch_profile = |task: ProfileTask| {
        println!("Visiting {}", task.url);
        let profile = match profiles.fetch(source, &task.url) {
            Ok(profile) => profile,
            Err(err) => {
                log::warn!("dropping {:?}: {err:#}", task.stub_name);
                failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let heading = profile.name.clone();
        let seasons = profile.season_averages.len();
        match aggregator.merge_profile(profile) {
            MergeOutcome::Merged => {
                log::debug!("merged {seasons} seasons into {heading:?}");
                merged.fetch_add(1, Ordering::Relaxed);
            }
            MergeOutcome::NoMatchingStub => {
                log::debug!(
                    "profile heading {heading:?} matches no stub (listed as {:?})",
                    task.stub_name
                );
                unmatched.fetch_add(1, Ordering::Relaxed);
            }
        }
    };

    let (index, drained) = scheduler.run(fetch_profile, |submitter| {
        crawl_index(
            source,
            &config.base_url,
            &config.letters,
            aggregator,
            submitter,
        )
    })?;

    Ok(CrawlSummary {
        index: index?,
        drained,
        profiles_merged: merged.into_inner(),
        profiles_failed: failed.into_inner(),
        profiles_unmatched: unmatched.into_inner(),
    })
}
