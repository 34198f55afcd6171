use crate::{
    config::CrawlConfig,
    detail::{aggregate, DetailReport},
    discovery::{discover, DiscoveryReport},
    error::{Error, Result},
    fetch::{DocumentFetcher, HttpFetcher},
    model::Group,
    rank::GroupRanking,
    render::Presenter,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn DocumentFetcher>,
    cancel: CancellationToken,
}

#[derive(Debug, Clone)]
pub struct GroupOutcome {
    pub ranking: GroupRanking,
    pub discovery: DiscoveryReport,
    pub details: DetailReport,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.timeout())?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(config: CrawlConfig, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            config,
            fetcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the crawl when cancelled. In-flight fetches give up
    /// and no further group is started.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Runs both pipeline stages for one group and ranks the result.
    pub async fn crawl_group(&self, group: &Group) -> Result<GroupOutcome> {
        let discovery = discover(self.fetcher.clone(), &self.config, group, &self.cancel).await?;
        let (records, details) = aggregate(
            self.fetcher.clone(),
            discovery.references,
            self.config.max_concurrency(),
            &self.cancel,
        )
        .await;
        let discovery = discovery.report.await?;

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        Ok(GroupOutcome {
            ranking: GroupRanking::new(group.clone(), records, self.config.min_subscribers()),
            discovery,
            details,
        })
    }

    /// Crawls every configured group in order, handing each ranking to
    /// `presenter` before moving on to the next group.
    pub async fn run<P: Presenter>(&self, presenter: &mut P) -> anyhow::Result<Vec<GroupOutcome>> {
        let mut outcomes = vec![];
        for group in self.config.groups() {
            let outcome = match self.crawl_group(group).await {
                Ok(outcome) => outcome,
                Err(Error::Cancelled) => {
                    info!(%group, "crawl cancelled");
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            info!(
                %group,
                pages = outcome.discovery.pages,
                pages_failed = outcome.discovery.pages_failed,
                published = outcome.discovery.published,
                withdrawn = outcome.discovery.withdrawn,
                skipped_links = outcome.discovery.skipped_links,
                articles = outcome.details.aggregated,
                articles_failed = outcome.details.failed,
                "group crawled"
            );

            presenter.present(&outcome.ranking)?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
