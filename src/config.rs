use crate::{
    error::{Error, Result},
    model::Group,
};
use derive_builder::Builder;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://ithelp.ithome.com.tw/ironman/signup/list";
pub const DEFAULT_GROUPS: [&str; 3] = ["web", "software-dev", "self"];
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
pub const DEFAULT_MIN_SUBSCRIBERS: u64 = 10;

#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct CrawlConfig {
    /// Listing endpoint; `group` and `page` are appended as query parameters.
    #[builder(setter(into), default = "DEFAULT_BASE_URL.to_string()")]
    base_url: String,
    /// Groups are crawled one after another, in this order.
    #[builder(default = "default_groups()")]
    groups: Vec<Group>,
    #[builder(default = "DEFAULT_TIMEOUT")]
    timeout: Duration,
    /// Upper bound on detail pages fetched at once.
    #[builder(default = "DEFAULT_MAX_CONCURRENCY")]
    max_concurrency: usize,
    #[builder(default = "DEFAULT_CHANNEL_CAPACITY")]
    channel_capacity: usize,
    /// Rows below this count are left out of the rendered ranking.
    #[builder(default = "DEFAULT_MIN_SUBSCRIBERS")]
    min_subscribers: u64,
}

impl CrawlConfig {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    pub fn min_subscribers(&self) -> u64 {
        self.min_subscribers
    }

    /// Listing page URL for `group`. `None` leaves the page implicit, which
    /// the site serves as page 1.
    pub fn listing_url(&self, group: &Group, page: Option<u32>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| Error::Config(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("group", group.as_str());
            if let Some(page) = page {
                query.append_pair("page", &page.to_string());
            }
        }
        Ok(url)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            groups: default_groups(),
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            min_subscribers: DEFAULT_MIN_SUBSCRIBERS,
        }
    }
}

impl CrawlConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|e| format!("invalid base url {base_url:?}: {e}"))?;
        }
        if self.max_concurrency == Some(0) {
            return Err("max_concurrency must be at least 1".into());
        }
        if self.channel_capacity == Some(0) {
            return Err("channel_capacity must be at least 1".into());
        }
        Ok(())
    }
}

fn default_groups() -> Vec<Group> {
    DEFAULT_GROUPS.into_iter().map(Group::from).collect()
}
