use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::buffer::RecordBuffer;
use crate::logging::{ConsoleFileLog, LogSink};
use crate::parse::parse_total_pages;
use crate::progress::{format_hms, Progress};
use crate::request::{Attempted, PageClient, PageFetcher, PageOutcome, ReqwestClient};
use crate::rotation::{IdentityPicker, RandomRotation};
use crate::sink::{CsvSink, RecordSink};
use crate::{info_time, Config, Error, Result};

/// Page used to discover how many pages there are.
const BOOTSTRAP_PAGE: u32 = 1;

/// What a finished run accomplished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total_pages: u32,
    pub pages_fetched: u32,
    pub records_written: usize,
    /// Pages given up on, in the order they were abandoned.
    pub abandoned_pages: Vec<u32>,
    pub elapsed: Duration,
}

/// Wires the production collaborators together and runs the whole download.
/// Recreates the CSV and log files.
pub async fn process_site(config: Config) -> Result<RunSummary> {
    config.validate()?;
    let mut sink = CsvSink::create(&config.csv_path)?;
    let log: Arc<dyn LogSink> = Arc::new(ConsoleFileLog::create(&config.log_path)?);
    let client = Arc::new(ReqwestClient::new(&config)?);
    let rotation = Arc::new(RandomRotation::new(
        config.proxies.clone(),
        config.user_agents.clone(),
    ));

    let scraper = Scraper::new(config, client, rotation, log.clone())?;
    let summary = scraper.start(&mut sink).await?;

    if summary.abandoned_pages.is_empty() {
        info_time!(log, "All pages fetched");
    } else {
        info_time!(
            log,
            "Finished with {} abandoned pages: {:?}",
            summary.abandoned_pages.len(),
            summary.abandoned_pages
        );
    }
    Ok(summary)
}

/// Drives one run: page count discovery, the batches, flushing and progress reporting.
pub struct Scraper {
    config: Config,
    fetcher: PageFetcher,
    log: Arc<dyn LogSink>,
}

impl Scraper {
    pub fn new(
        config: Config,
        client: Arc<dyn PageClient>,
        identities: Arc<dyn IdentityPicker>,
        log: Arc<dyn LogSink>,
    ) -> Result<Self> {
        config.validate()?;
        let fetcher = PageFetcher::new(
            client,
            identities,
            log.clone(),
            config.backoff.clone(),
            config.max_attempts,
        );
        Ok(Self {
            config,
            fetcher,
            log,
        })
    }

    pub async fn start(&self, sink: &mut dyn RecordSink) -> Result<RunSummary> {
        let start_time = Local::now();

        let total_pages = self.discover_total_pages().await?;
        info_time!(self.log, "Total pages to fetch: {total_pages}");

        let mut buffer = RecordBuffer::new(self.config.flush_threshold());
        let mut progress = Progress::new(total_pages, start_time);
        let limiter = Arc::new(Semaphore::new(self.config.concurrent_requests));
        let mut summary = RunSummary {
            total_pages,
            ..RunSummary::default()
        };

        for batch in plan_batches(total_pages, self.config.concurrent_requests) {
            let batch_len = batch.end() - batch.start() + 1;
            let outcomes = fetch_batch(&self.fetcher, &limiter, batch).await?;

            for outcome in outcomes {
                match outcome {
                    PageOutcome::Fetched { records, .. } => {
                        summary.pages_fetched += 1;
                        buffer.accumulate(records);
                    }
                    PageOutcome::Abandoned {
                        page,
                        attempts,
                        last_error,
                    } => {
                        info_time!(
                            self.log,
                            "Skipping page {page} after {attempts} attempts: {last_error}"
                        );
                        summary.abandoned_pages.push(page);
                    }
                }
            }
            progress.advance(batch_len);

            if let Some(written) = buffer.maybe_flush(sink)? {
                summary.records_written += written;
                info_time!(
                    self.log,
                    "Saved {} records (~{} pages) to CSV",
                    written,
                    self.estimated_pages(written)
                );
            }
            info_time!(self.log, "{}", progress.report(Local::now()));
        }

        if let Some(written) = buffer.flush_remainder(sink)? {
            summary.records_written += written;
            info_time!(
                self.log,
                "Saved the last {} records (~{} pages) to CSV",
                written,
                self.estimated_pages(written)
            );
        }

        summary.elapsed = (Local::now() - start_time).to_std().unwrap_or_default();
        info_time!(
            self.log,
            since start_time,
            "Total time: {}",
            format_hms(summary.elapsed.as_secs())
        );
        Ok(summary)
    }

    /// Fetches the first page and reads the page count from it.
    /// Transport errors are retried like any page, a missing count is fatal.
    async fn discover_total_pages(&self) -> Result<u32> {
        info_time!(
            self.log,
            "Requesting page {BOOTSTRAP_PAGE} to discover the total page count"
        );
        match self.fetcher.fetch_body(BOOTSTRAP_PAGE).await {
            Attempted::Done { value, .. } => parse_total_pages(&value),
            Attempted::Abandoned {
                attempts,
                last_error,
            } => Err(Error::BootstrapAbandoned {
                attempts,
                last_error,
            }),
        }
    }

    /// Only for log lines, short pages make it inaccurate.
    fn estimated_pages(&self, records: usize) -> usize {
        records / self.config.per_page as usize
    }
}

/// Splits `1..=total_pages` into consecutive batches of at most `batch_size` pages.
pub fn plan_batches(
    total_pages: u32,
    batch_size: usize,
) -> impl Iterator<Item = RangeInclusive<u32>> {
    let batch_size = u32::try_from(batch_size.max(1)).unwrap_or(u32::MAX);
    (1..=total_pages)
        .step_by(batch_size as usize)
        .map(move |start| start..=start.saturating_add(batch_size - 1).min(total_pages))
}

/// Spawns one task per page of the batch and waits for all of them.
/// Outcomes come back in completion order.
async fn fetch_batch(
    fetcher: &PageFetcher,
    limiter: &Arc<Semaphore>,
    batch: RangeInclusive<u32>,
) -> Result<Vec<PageOutcome>> {
    let mut task_set = JoinSet::new();
    for page in batch {
        task_set.spawn({
            // Fetcher is a bundle of Arcs so we can clone cheaply
            let fetcher = fetcher.clone();
            let limiter = limiter.clone();

            async move {
                let _permit = limiter.acquire_owned().await?;
                Ok::<_, Error>(fetcher.fetch(page).await)
            }
        });
    }

    let mut outcomes = Vec::with_capacity(task_set.len());
    while let Some(task) = task_set.join_next().await {
        outcomes.push(task??);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_are_planned_lazily() {
        let mut batches = plan_batches(u32::MAX, 10);
        assert_eq!(batches.next(), Some(1..=10));
        assert_eq!(batches.next(), Some(11..=20));
        let huge: Vec<_> = plan_batches(u32::MAX, 1 << 30).collect();
        assert_eq!(huge.len(), 4);
        assert_eq!(huge[3], 3_221_225_473..=u32::MAX);
    }

    #[test]
    fn batches_cover_every_page_exactly_once() {
        for total in [0u32, 1, 3, 9, 10, 11, 57, 100] {
            for size in [1usize, 3, 10, 64] {
                let batches: Vec<_> = plan_batches(total, size).collect();
                assert_eq!(batches.len(), (total as usize).div_ceil(size));
                assert!(batches.iter().all(|b| (b.end() - b.start() + 1) as usize <= size));

                let pages: Vec<u32> = batches.into_iter().flatten().collect();
                assert_eq!(pages, (1..=total).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn small_listing_fits_one_batch() {
        assert_eq!(plan_batches(3, 10).collect::<Vec<_>>(), vec![1..=3]);
        assert_eq!(
            plan_batches(25, 10).collect::<Vec<_>>(),
            vec![1..=10, 11..=20, 21..=25]
        );
    }
}
