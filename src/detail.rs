use crate::{
    error::{Error, Result},
    fetch::{fetch_or_cancel, DocumentFetcher},
    model::{Aggregation, ArticleRecord, ArticleReference},
    parse::parse_detail,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Semaphore},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailReport {
    pub received: usize,
    pub aggregated: usize,
    pub failed: usize,
}

pub async fn fetch_article(
    fetcher: &dyn DocumentFetcher,
    reference: &ArticleReference,
    cancel: &CancellationToken,
) -> Result<ArticleRecord> {
    let html = fetch_or_cancel(fetcher, reference, cancel).await?;
    let detail = parse_detail(&html).map_err(|e| Error::parse(reference.as_str(), e))?;

    Ok(ArticleRecord {
        title: detail.title,
        url: reference.to_string(),
        subscribers: detail.subscribers,
    })
}

/// Drains `references`, fetching each article concurrently, and returns the
/// collected records once the stream is closed and every fetch has finished.
///
/// A failed article is logged and counted, never recorded.
pub async fn aggregate(
    fetcher: Arc<dyn DocumentFetcher>,
    mut references: mpsc::Receiver<ArticleReference>,
    max_concurrency: usize,
    cancel: &CancellationToken,
) -> (Vec<ArticleRecord>, DetailReport) {
    let aggregation = Aggregation::new();
    let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut report = DetailReport::default();

    while let Some(reference) = references.recv().await {
        report.received += 1;
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let fetcher = fetcher.clone();
        let aggregation = aggregation.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let _permit = permit;
            match fetch_article(fetcher.as_ref(), &reference, &cancel).await {
                Ok(record) => {
                    debug!(url = %reference, subscribers = record.subscribers, "article fetched");
                    aggregation.push(record).await;
                    Ok(())
                }
                Err(e) => Err((reference, e)),
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err((url, Error::Cancelled))) => {
                debug!(%url, "article fetch cancelled");
                report.failed += 1;
            }
            Ok(Err((url, e))) => {
                warn!(%url, error = %e, "article skipped");
                report.failed += 1;
            }
            Err(e) => {
                warn!(error = %e, "article task failed");
                report.failed += 1;
            }
        }
    }

    let records = aggregation.drain().await;
    report.aggregated = records.len();
    (records, report)
}
