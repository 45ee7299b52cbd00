pub mod aggregator;
pub mod config;
pub mod crawl;
pub mod http_client;
pub mod index_crawl;
pub mod page_source;
pub mod parse;
pub mod persist;
pub mod player;
pub mod profile_fetch;
pub mod scheduler;
