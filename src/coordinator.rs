//! Partitioned, concurrent fetch of every comment page of a product.
//!
//! One discovery request for page 0 yields `maxPage`. The range `[0, maxPage]`
//! is split into one contiguous partition per worker. Each worker runs as its
//! own tokio task and fills a private buffer; the buffers are concatenated in
//! partition order once all workers have finished, so the final collection is
//! ordered by page.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::partition::{Partition, PartitionPlan};
use crate::types::{CommentRecord, FetchRequest, Score, SortType};

/// A page that contributed nothing to the result.
#[derive(Debug)]
pub struct PageFailure {
    pub page: u32,
    pub error: FetchError,
}

/// Collected comments plus every page that could not be loaded.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub max_page: u32,
    pub comments: Vec<CommentRecord>,
    pub failures: Vec<PageFailure>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_pages(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.page).collect()
    }
}

#[derive(Debug, Default)]
struct WorkerOutput {
    comments: Vec<CommentRecord>,
    failures: Vec<PageFailure>,
}

pub struct Coordinator {
    fetcher: Arc<dyn PageFetcher>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: CoordinatorConfig) -> Self {
        Coordinator { fetcher, config }
    }

    /// Fetches every page for the given product and filters.
    ///
    /// Only configuration and discovery problems are returned as `Err`;
    /// individual page failures end up in [`FetchReport::failures`].
    pub async fn run(
        &self,
        product_id: u64,
        score: Score,
        sort_type: SortType,
    ) -> Result<FetchReport, FetchError> {
        self.config.validate()?;

        let base_request = FetchRequest::new(product_id, score, sort_type, 0);
        let discovery = self.fetcher.fetch(&base_request).await.map_err(|e| {
            tracing::error!(product_id, error = %e, "loading page 0 failed");
            FetchError::Discovery(e.to_string())
        })?;
        let max_page = discovery.max_page.ok_or_else(|| {
            tracing::error!(product_id, "page 0 carries no maxPage");
            FetchError::Discovery("page 0 response has no maxPage".to_string())
        })?;

        let plan = PartitionPlan::new(self.config.strategy, max_page, self.config.workers)?;
        tracing::info!(
            product_id,
            max_page,
            workers = plan.len(),
            strategy = ?self.config.strategy,
            "starting partitioned fetch"
        );

        // Both sets abort their tasks when dropped, so abandoning this
        // future stops every worker and the deadline timer.
        let cancel_token = CancellationToken::new();
        let mut workers = JoinSet::new();
        let mut deadline_timer = JoinSet::new();
        let mut discovery_comments = Some(discovery.comments);

        for &partition in plan.partitions() {
            // page 0 is already loaded; hand it to whoever owns it
            let seed = if partition.contains(0) {
                discovery_comments.take()
            } else {
                None
            };
            let fetcher = self.fetcher.clone();
            let token = cancel_token.clone();
            workers.spawn(async move {
                let output = run_worker(fetcher, base_request, partition, seed, token).await;
                (partition.index, output)
            });
        }

        if let Some(deadline) = self.config.deadline {
            deadline_timer.spawn(cancel_after(deadline, cancel_token.clone()));
        }

        let mut outputs: Vec<Option<WorkerOutput>> = plan.partitions().iter().map(|_| None).collect();
        while let Some(result) = workers.join_next().await {
            match result {
                Ok((index, output)) => outputs[index] = Some(output),
                Err(join_error) => {
                    tracing::error!(error = %join_error, "worker task did not complete");
                }
            }
        }
        drop(deadline_timer);

        let mut report = FetchReport {
            max_page,
            ..Default::default()
        };
        for (partition, output) in plan.partitions().iter().zip(outputs) {
            match output {
                Some(output) => {
                    report.comments.extend(output.comments);
                    report.failures.extend(output.failures);
                }
                None => {
                    report.failures.extend(partition.pages().map(|page| PageFailure {
                        page,
                        error: FetchError::Worker(format!(
                            "worker {} did not complete",
                            partition.index
                        )),
                    }));
                }
            }
        }

        if report.failures.is_empty() {
            tracing::info!(comments = report.comments.len(), "fetch finished");
        } else {
            tracing::warn!(
                comments = report.comments.len(),
                failed_pages = report.failures.len(),
                "fetch finished with missing pages"
            );
        }

        Ok(report)
    }
}

async fn cancel_after(deadline: Duration, token: CancellationToken) {
    tokio::time::sleep(deadline).await;
    tracing::warn!(deadline_ms = deadline.as_millis() as u64, "deadline reached, cancelling workers");
    token.cancel();
}

/// Loads the pages of one partition in ascending order.
async fn run_worker(
    fetcher: Arc<dyn PageFetcher>,
    base_request: FetchRequest,
    partition: Partition,
    mut seed: Option<Vec<CommentRecord>>,
    cancel_token: CancellationToken,
) -> WorkerOutput {
    let mut output = WorkerOutput::default();

    for page in partition.pages() {
        if page == 0
            && let Some(comments) = seed.take()
        {
            output.comments.extend(comments);
            continue;
        }

        if cancel_token.is_cancelled() {
            output.failures.push(PageFailure {
                page,
                error: FetchError::Cancelled,
            });
            continue;
        }

        let request = base_request.for_page(page);
        let result = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => Err(FetchError::Cancelled),
            result = fetcher.fetch(&request) => result,
        };

        match result {
            Ok(page_result) => output.comments.extend(page_result.comments),
            Err(e) => {
                if !matches!(e, FetchError::Cancelled) {
                    tracing::warn!(worker = partition.index, page, error = %e, "skipping comment page");
                }
                output.failures.push(PageFailure { page, error: e });
            }
        }
    }

    output
}
