use std::path::PathBuf;
use std::time::Duration;

pub const BASE_URL: &str = "https://www.basketball-reference.com";
pub const DEFAULT_OUTPUT: &str = "players.json";
pub const DEFAULT_PARALLELISM: usize = 2;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Fixed crawl settings. The binary always runs with the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub base_url: String,
    pub letters: Vec<char>,
    pub parallelism: usize,
    pub delay: Duration,
    pub queue_capacity: usize,
    pub output: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            letters: ('a'..='z').collect(),
            parallelism: DEFAULT_PARALLELISM,
            delay: DEFAULT_DELAY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_crawl_constants() {
        let config = CrawlConfig::default();
        assert_eq!(config.base_url, BASE_URL);
        assert_eq!(config.letters.len(), 26);
        assert_eq!(config.letters.first(), Some(&'a'));
        assert_eq!(config.letters.last(), Some(&'z'));
        assert_eq!(config.parallelism, 2);
        assert_eq!(config.delay, Duration::from_secs(2));
        assert_eq!(config.output, PathBuf::from("players.json"));
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn discovery_letters_are_visited_alphabetically() {
        let letters: String = CrawlConfig::default().letters.into_iter().collect();
        assert_eq!(letters, "abcdefghijklmnopqrstuvwxyz");
    }
}
