use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use time::OffsetDateTime;
use tokio::time::sleep;
use twitter::{FetchResult, Page};

use crate::config::Config;
use crate::record::AssetDownloader;
use crate::sink::CsvSink;
use crate::source::SearchSource;

/// Why a harvest stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    MinimumReached,
    Exhausted,
    Aborted(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestSummary {
    pub records_written: u64,
    pub pages_fetched: u64,
    pub rate_limit_waits: u64,
    pub stop: StopReason,
}

enum State {
    Start,
    Fetching(Option<String>),
    HavePage(Page),
    RateLimited {
        reset: OffsetDateTime,
        cursor: Option<String>,
    },
    Exhausted,
    Done(StopReason),
}

/// Pages through a search and writes one CSV row per tweet.
pub struct Harvester<S> {
    source: S,
    assets: AssetDownloader,
    sink: CsvSink,
    minimum: u64,
    delay_secs: RangeInclusive<u64>,
}

impl<S: SearchSource> Harvester<S> {
    /// Create the output directories and truncate the CSV file.
    pub async fn new(source: S, config: &Config) -> Result<Self> {
        let assets = AssetDownloader::new(config)?;
        assets.prepare().await?;
        let sink = CsvSink::create(&config.output.csv).await?;
        let [low, high] = config.search.delay_secs;

        Ok(Self {
            source,
            assets,
            sink,
            minimum: config.search.minimum_tweets,
            delay_secs: low..=high,
        })
    }

    pub async fn run(self) -> HarvestSummary {
        let mut written = 0;
        let mut pages = 0;
        let mut rate_limit_waits = 0;
        let mut state = State::Start;

        let stop = loop {
            state = match state {
                State::Start => {
                    if self.minimum == 0 {
                        State::Done(StopReason::MinimumReached)
                    } else {
                        tracing::info!(query = %self.source.describe(), "getting tweets");
                        State::Fetching(None)
                    }
                }
                State::Fetching(cursor) => match self.source.fetch(cursor.as_deref()).await {
                    FetchResult::Page(page) if page.is_empty() => {
                        pages += 1;
                        State::Exhausted
                    }
                    FetchResult::Page(page) => {
                        pages += 1;
                        State::HavePage(page)
                    }
                    FetchResult::RateLimited(reset) => State::RateLimited { reset, cursor },
                    FetchResult::Failed(e) => {
                        tracing::error!(error = %e, "an error occurred, stopping");
                        State::Done(StopReason::Aborted(e.to_string()))
                    }
                },
                State::RateLimited { reset, cursor } => {
                    let wait = until(reset);
                    tracing::warn!(
                        reset = %reset,
                        wait_secs = wait.as_secs(),
                        "rate limit reached, waiting"
                    );
                    sleep(wait).await;
                    rate_limit_waits += 1;
                    State::Fetching(cursor)
                }
                State::HavePage(page) => match self.process_page(page, &mut written).await {
                    Err(e) => {
                        tracing::error!(error = %e, "unable to write record, stopping");
                        State::Done(StopReason::Aborted(e.to_string()))
                    }
                    Ok(_) if written >= self.minimum => {
                        tracing::info!(count = written, "got tweets");
                        State::Done(StopReason::MinimumReached)
                    }
                    Ok(None) => State::Exhausted,
                    Ok(Some(cursor)) => {
                        tracing::info!(count = written, "got tweets");
                        let delay = self.page_delay();
                        tracing::info!(
                            delay_secs = delay.as_secs(),
                            "getting next tweets after delay"
                        );
                        sleep(delay).await;
                        State::Fetching(Some(cursor))
                    }
                },
                State::Exhausted => {
                    tracing::info!("no more tweets found");
                    State::Done(StopReason::Exhausted)
                }
                State::Done(stop) => break stop,
            };
        };

        tracing::info!(
            count = written,
            file = %self.sink.path().display(),
            "done"
        );
        HarvestSummary {
            records_written: written,
            pages_fetched: pages,
            rate_limit_waits,
            stop,
        }
    }

    /// Write records for `page` until the minimum is reached.
    ///
    /// Returns the cursor to continue from.
    async fn process_page(&self, page: Page, written: &mut u64) -> Result<Option<String>> {
        for tweet in &page.tweets {
            if *written >= self.minimum {
                break;
            }
            let sequence = *written + 1;
            tracing::debug!(sequence, id = ?tweet.id, "processing tweet");
            let record = self.assets.project(tweet, sequence).await;
            self.sink.append(&record).await?;
            *written = sequence;
        }
        Ok(page.cursor)
    }

    fn page_delay(&self) -> Duration {
        Duration::from_secs(rand::thread_rng().gen_range(self.delay_secs.clone()))
    }
}

/// Time left until `reset`, zero if it already passed.
fn until(reset: OffsetDateTime) -> Duration {
    Duration::try_from(reset - OffsetDateTime::now_utc()).unwrap_or_default()
}
