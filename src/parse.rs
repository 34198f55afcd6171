//! Selector-based extraction from listing and detail pages.
//!
//! `scraper::Html` is not `Send`, so every function here takes the raw HTML
//! and hands back owned values; no document is ever held across an await.

use crate::error::ParseError;
use scraper::{ElementRef, Html, Selector};

const PAGINATION_ITEM: &str = "ul.pagination li";
const ENTRY: &str = ".contestants-wrapper .contestants-list";
const FAILED_MARKER: &str = ".team-dashboard__box.team-progress--fail";
const ENTRY_LINK: &str = "a.contestants-list__title";
const TITLE: &str = ".qa-list__title.qa-list__title--ironman";
const SUBSCRIBERS: &str = "span.subscription-amount";

/// Decorative marker the site appends to every series title.
const SERIES_SUFFIX: &str = "系列";

/// The pagination control lists "previous" and "next" besides the pages.
const PAGINATION_NAV_ITEMS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    Article(String),
    /// The contestant failed or withdrew.
    Withdrawn,
    /// The entry had no usable link.
    MissingLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDetail {
    pub title: String,
    pub subscribers: u64,
}

pub fn page_count(html: &str) -> Result<u32, ParseError> {
    let document = Html::parse_document(html);
    let items = document.select(&selector(PAGINATION_ITEM)?).count();
    // no control (or a stray item) means everything fits on page 1
    if items < PAGINATION_NAV_ITEMS {
        return Ok(1);
    }
    let pages = items - PAGINATION_NAV_ITEMS;
    Ok(u32::try_from(pages).unwrap_or(u32::MAX))
}

pub fn parse_listing(html: &str) -> Result<Vec<ListingEntry>, ParseError> {
    let document = Html::parse_document(html);
    let failed = selector(FAILED_MARKER)?;
    let link = selector(ENTRY_LINK)?;

    let entries = document
        .select(&selector(ENTRY)?)
        .map(|entry| {
            if entry.select(&failed).next().is_some() {
                return ListingEntry::Withdrawn;
            }
            match entry
                .select(&link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::trim)
            {
                Some(href) if !href.is_empty() => ListingEntry::Article(href.to_string()),
                _ => ListingEntry::MissingLink,
            }
        })
        .collect();

    Ok(entries)
}

pub fn parse_detail(html: &str) -> Result<ArticleDetail, ParseError> {
    let document = Html::parse_document(html);

    let title = first_text(&document, TITLE)?;
    let count = first_text(&document, SUBSCRIBERS)?;
    let subscribers = count
        .trim()
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidCount {
            text: count.clone(),
        })?;

    Ok(ArticleDetail {
        title: clean_title(&title),
        subscribers,
    })
}

fn clean_title(raw: &str) -> String {
    let title = raw.trim();
    title
        .strip_suffix(SERIES_SUFFIX)
        .map(str::trim_end)
        .unwrap_or(title)
        .to_string()
}

fn first_text(document: &Html, css: &str) -> Result<String, ParseError> {
    document
        .select(&selector(css)?)
        .next()
        .map(|el: ElementRef| el.text().collect::<String>())
        .ok_or_else(|| ParseError::MissingElement {
            selector: css.to_string(),
        })
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector {
        selector: css.to_string(),
        reason: format!("{e:?}"),
    })
}
