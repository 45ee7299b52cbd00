use anyhow::{Context, Result};
use scraper::{Html, Selector};

use crate::aggregator::Aggregator;
use crate::page_source::PageSource;
use crate::parse::{child_attr, child_text, selector};
use crate::player::PlayerRecord;
use crate::scheduler::Submitter;

const HALL_OF_FAME_MARKER: char = '*';

#[derive(Debug, Clone, PartialEq)]
pub struct IndexRow {
    pub stub: PlayerRecord,
    pub profile_link: String,
}

/// One profile to fetch. `stub_name` is the key the index row was stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileTask {
    pub url: String,
    pub stub_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub pages_visited: usize,
    pub pages_failed: usize,
    pub stubs_inserted: usize,
    pub tasks_submitted: usize,
}

#[derive(Debug)]
pub struct IndexParser {
    rows: Selector,
    name: Selector,
    link: Selector,
    active: Selector,
    position: Selector,
    height: Selector,
}

impl IndexParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rows: selector("tbody tr")?,
            name: selector("th")?,
            link: selector("a[href]")?,
            active: selector("strong")?,
            position: selector("td[data-stat='pos']")?,
            height: selector("td[data-stat='height']")?,
        })
    }

    pub fn parse(&self, html: &str) -> Vec<IndexRow> {
        let document = Html::parse_document(html);
        let mut rows = Vec::new();
        for row in document.select(&self.rows) {
            let Some(profile_link) = child_attr(row, &self.link, "href").filter(|l| !l.is_empty())
            else {
                log::trace!("skipping index row without a profile link");
                continue;
            };

            let (name, is_hall_of_fame) = strip_hall_of_fame(&child_text(row, &self.name));
            let is_active = !child_text(row, &self.active).is_empty();
            let stub = PlayerRecord::stub(
                name,
                is_active,
                is_hall_of_fame,
                child_text(row, &self.position),
                child_text(row, &self.height),
            )
            .with_profile_link(profile_link.as_str());

            rows.push(IndexRow { stub, profile_link });
        }
        rows
    }
}

/// Removes every hall-of-fame marker from a listed name.
pub fn strip_hall_of_fame(raw: &str) -> (String, bool) {
    if raw.contains(HALL_OF_FAME_MARKER) {
        let name = raw.replace(HALL_OF_FAME_MARKER, "");
        (name.trim().to_string(), true)
    } else {
        (raw.trim().to_string(), false)
    }
}

pub fn discovery_url(base_url: &str, letter: char) -> String {
    format!("{}/players/{letter}/", base_url.trim_end_matches('/'))
}

pub fn profile_url(base_url: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    format!("{}{link}", base_url.trim_end_matches('/'))
}

/// Walks the discovery pages in letter order on the calling thread. Each row
/// becomes a stub in `aggregator` and a profile task on `submitter`.
pub fn crawl_index(
    source: &dyn PageSource,
    base_url: &str,
    letters: &[char],
    aggregator: &Aggregator,
    submitter: &Submitter<ProfileTask>,
) -> Result<IndexStats> {
    let parser = IndexParser::new()?;
    let mut stats = IndexStats::default();

    for &letter in letters {
        let url = discovery_url(base_url, letter);
        println!("Visiting {url}");
        let body = match source
            .fetch(&url)
            .with_context(|| format!("discovery page failed: {url}"))
        {
            Ok(body) => body,
            Err(err) => {
                log::warn!("{err:#}");
                stats.pages_failed += 1;
                continue;
            }
        };
        stats.pages_visited += 1;

        let rows = parser.parse(&body);
        log::debug!("{} rows on discovery page {letter}", rows.len());
        for row in rows {
            let name = row.stub.name.clone();
            log::debug!("stub {name:?} -> {}", row.profile_link);
            if let Some(previous) = aggregator.upsert_stub(row.stub)
                && previous.profile_link != row.profile_link
            {
                log::warn!(
                    "name collision for {name:?}: {} replaced by {}",
                    previous.profile_link,
                    row.profile_link
                );
            }
            stats.stubs_inserted += 1;

            submitter.submit(ProfileTask {
                url: profile_url(base_url, &row.profile_link),
                stub_name: name,
            })?;
            stats.tasks_submitted += 1;
        }
    }

    Ok(stats)
}
