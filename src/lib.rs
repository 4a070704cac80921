//! crawl70 walks a gopher server's menu tree, mirrors every text and
//! binary resource it references into a local directory, probes links to
//! foreign servers, and keeps statistics over the whole traversal.

pub mod gopher;
pub mod indexer;
pub mod stats;
pub mod storage;
pub mod transport;

pub use indexer::Crawler;
pub use stats::{render_report, CrawlStats};
