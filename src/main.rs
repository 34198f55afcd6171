use anyhow::Result;
use clap::Parser;
use ironman_rank::{
    config::{
        DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENCY, DEFAULT_MIN_SUBSCRIBERS, DEFAULT_TIMEOUT,
    },
    CrawlConfigBuilder, Crawler, Group, OutputFormat, Renderer,
};
use std::{io, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rank Ironman contest series by subscriber count.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Group to crawl; repeat for several. Defaults to web, software-dev and self.
    #[arg(short, long = "group")]
    groups: Vec<String>,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Detail pages fetched at once.
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,

    /// Hide series with fewer subscribers than this.
    #[arg(long, default_value_t = DEFAULT_MIN_SUBSCRIBERS)]
    min_subscribers: u64,

    #[arg(long, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let mut builder = CrawlConfigBuilder::default();
    builder
        .base_url(args.base_url)
        .timeout(Duration::from_secs(args.timeout_secs))
        .max_concurrency(args.max_concurrency)
        .min_subscribers(args.min_subscribers);
    if !args.groups.is_empty() {
        builder.groups(args.groups.into_iter().map(Group::new).collect());
    }
    let config = builder.build()?;

    let crawler = Crawler::new(config)?;
    let cancel = crawler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, stopping crawl");
            cancel.cancel();
        }
    });

    let mut renderer = Renderer::new(args.format, io::stdout().lock());
    crawler.run(&mut renderer).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_should_follow_config_defaults() {
        let args = Args::try_parse_from(["ironman-rank"]).unwrap();

        assert!(args.groups.is_empty());
        assert_eq!(args.base_url, DEFAULT_BASE_URL);
        assert_eq!(Duration::from_secs(args.timeout_secs), DEFAULT_TIMEOUT);
        assert_eq!(args.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(args.min_subscribers, DEFAULT_MIN_SUBSCRIBERS);
        assert_eq!(args.format, OutputFormat::Table);
    }

    #[test]
    fn cli_should_collect_repeated_groups() {
        let args =
            Args::try_parse_from(["ironman-rank", "-g", "web", "--group", "self", "--format", "json"])
                .unwrap();

        assert_eq!(args.groups, ["web", "self"]);
        assert_eq!(args.format, OutputFormat::Json);
    }
}
