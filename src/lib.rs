pub mod config;
pub mod crawler;
pub mod detail;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod model;
pub mod parse;
pub mod rank;
pub mod render;

pub use config::{CrawlConfig, CrawlConfigBuilder};
pub use crawler::{Crawler, GroupOutcome};
pub use error::{Error, FetchError, ParseError, Result};
pub use fetch::{DocumentFetcher, HttpFetcher};
pub use model::{ArticleRecord, ArticleReference, Group};
pub use rank::GroupRanking;
pub use render::{OutputFormat, Presenter, Renderer};
