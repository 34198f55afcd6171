use crate::model::{ArticleRecord, Group};

/// Every record collected for a group, most subscribed first.
#[derive(Debug, Clone)]
pub struct GroupRanking {
    group: Group,
    records: Vec<ArticleRecord>,
    min_subscribers: u64,
}

impl GroupRanking {
    /// Ranks `records` by subscriber count, descending. Equal counts keep the
    /// order they had in `records`.
    pub fn new(group: Group, mut records: Vec<ArticleRecord>, min_subscribers: u64) -> Self {
        records.sort_by(|a, b| b.subscribers.cmp(&a.subscribers));
        Self {
            group,
            records,
            min_subscribers,
        }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    /// All ranked records, including those too small to be shown.
    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    /// The records worth showing.
    pub fn rows(&self) -> impl Iterator<Item = &ArticleRecord> + '_ {
        self.records
            .iter()
            .filter(move |r| r.subscribers >= self.min_subscribers)
    }
}
