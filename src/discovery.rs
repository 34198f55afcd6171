use crate::{
    config::CrawlConfig,
    error::{Error, Result},
    fetch::{fetch_or_cancel, DocumentFetcher},
    model::{ArticleReference, Group},
    parse::{page_count, parse_listing, ListingEntry},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub pages: u32,
    pub pages_failed: u32,
    /// The page count could not be read and one page was assumed.
    pub probe_failed: bool,
    pub published: usize,
    pub withdrawn: usize,
    /// Entries whose link was missing, blank or not an http(s) URL.
    pub skipped_links: usize,
}

/// The stream of article references for one group, plus the coordinator
/// that closes it.
#[derive(Debug)]
pub struct Discovery {
    pub references: mpsc::Receiver<ArticleReference>,
    pub report: JoinHandle<DiscoveryReport>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageSummary {
    pub published: usize,
    pub withdrawn: usize,
    pub skipped_links: usize,
}

pub async fn probe_page_count(
    fetcher: &dyn DocumentFetcher,
    config: &CrawlConfig,
    group: &Group,
    cancel: &CancellationToken,
) -> Result<u32> {
    let url = config.listing_url(group, None)?;
    let html = fetch_or_cancel(fetcher, &url, cancel).await?;
    page_count(&html).map_err(|e| Error::parse(url, e))
}

/// Fetches one listing page and publishes every usable article link on it.
pub async fn fetch_page(
    fetcher: &dyn DocumentFetcher,
    url: &Url,
    references: &mpsc::Sender<ArticleReference>,
    cancel: &CancellationToken,
) -> Result<PageSummary> {
    let html = fetch_or_cancel(fetcher, url, cancel).await?;
    let entries = parse_listing(&html).map_err(|e| Error::parse(url.as_str(), e))?;

    let mut summary = PageSummary::default();
    for entry in entries {
        match entry {
            ListingEntry::Article(href) => match resolve_reference(url, &href) {
                Some(reference) => {
                    // a closed receiver means nobody is draining any more
                    references
                        .send(reference)
                        .await
                        .map_err(|_| Error::Cancelled)?;
                    summary.published += 1;
                }
                None => {
                    warn!(page = %url, href = %href, "skipping unusable article link");
                    summary.skipped_links += 1;
                }
            },
            ListingEntry::Withdrawn => summary.withdrawn += 1,
            ListingEntry::MissingLink => {
                warn!(page = %url, "skipping entry without article link");
                summary.skipped_links += 1;
            }
        }
    }

    Ok(summary)
}

/// Starts discovery for `group`: probes the page count, then fetches every
/// listing page concurrently. The returned stream closes once all page
/// fetches are done.
pub async fn discover(
    fetcher: Arc<dyn DocumentFetcher>,
    config: &CrawlConfig,
    group: &Group,
    cancel: &CancellationToken,
) -> Result<Discovery> {
    let (n_pages, probe_failed) =
        match probe_page_count(fetcher.as_ref(), config, group, cancel).await {
            Ok(n) => (n, false),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e @ Error::Config(_)) => return Err(e),
            Err(e) => {
                warn!(%group, error = %e, "page count unavailable, assuming a single page");
                (1, true)
            }
        };
    debug!(%group, pages = n_pages, "listing pages found");

    let (tx, rx) = mpsc::channel(config.channel_capacity());
    let mut pages = JoinSet::new();
    for page in 1..=n_pages {
        let url = config.listing_url(group, Some(page))?;
        let fetcher = fetcher.clone();
        let tx = tx.clone();
        let cancel = cancel.clone();
        pages.spawn(async move {
            let res = fetch_page(fetcher.as_ref(), &url, &tx, &cancel).await;
            (url, res)
        });
    }

    let group = group.clone();
    let report = tokio::spawn(async move {
        let mut report = DiscoveryReport {
            pages: n_pages,
            probe_failed,
            ..Default::default()
        };
        while let Some(joined) = pages.join_next().await {
            match joined {
                Ok((url, Ok(summary))) => {
                    debug!(%group, page = %url, published = summary.published, "listing page done");
                    report.published += summary.published;
                    report.withdrawn += summary.withdrawn;
                    report.skipped_links += summary.skipped_links;
                }
                Ok((url, Err(e))) => {
                    warn!(%group, page = %url, error = %e, "listing page skipped");
                    report.pages_failed += 1;
                }
                Err(e) => {
                    warn!(%group, error = %e, "listing page task failed");
                    report.pages_failed += 1;
                }
            }
        }
        // every producer is gone; dropping the last sender closes the stream
        drop(tx);
        report
    });

    Ok(Discovery {
        references: rx,
        report,
    })
}

fn resolve_reference(page: &Url, href: &str) -> Option<ArticleReference> {
    let url = page.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
