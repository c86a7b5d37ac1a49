pub mod client;
pub mod collector;
pub mod error;
pub mod parse;
pub mod urls;

pub use client::SourceClient;
pub use collector::{CollectionSummary, Collector, CollectorSettings};
pub use error::ScraperError;
pub use parse::{extract_article_links, parse_article};
