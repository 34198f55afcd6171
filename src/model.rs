use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;
use url::Url;

/// A listing partition on the contest site, e.g. `web` or `self`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(String);

/// Link to one contestant's detail page, as found on a listing page.
pub type ArticleReference = Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub subscribers: u64,
}

/// Records collected for one group by concurrent detail fetches.
///
/// Writers only ever append; the order of the underlying vector reflects
/// task completion order and carries no meaning.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    records: Arc<Mutex<Vec<ArticleRecord>>>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Group {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, record: ArticleRecord) {
        self.records.lock().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Takes every record out, leaving the aggregation empty.
    pub async fn drain(&self) -> Vec<ArticleRecord> {
        std::mem::take(&mut *self.records.lock().await)
    }
}
