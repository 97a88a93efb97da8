use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use jd_comment_spider_rs::{
    Coordinator, CoordinatorConfig, FetchConfig, HttpPageFetcher, PartitionStrategy, RetryConfig,
    Score, SortType,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
    /// Product id, as found in https://item.jd.com/<id>.html
    #[clap(default_value_t = 2384789)]
    product_id: u64,

    /// Star rating filter, 1 (worst) to 5
    #[clap(short, long, default_value = "1")]
    score: Score,

    /// 5 sorts by date, 6 is the default order
    #[clap(long, default_value = "6")]
    sort_type: SortType,

    #[clap(short, long, default_value_t = 10)]
    workers: usize,

    #[clap(short, long, default_value = "comments.csv")]
    output: String,

    /// Per-request timeout
    #[clap(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Retries per page on transient failures
    #[clap(long, default_value_t = 3)]
    retries: u32,

    /// Give up on unfinished pages after this many seconds
    #[clap(long)]
    deadline_secs: Option<u64>,

    /// Spread pages evenly instead of giving the remainder to the last worker
    #[clap(long)]
    balanced: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    println!("{}", chrono::Local::now().format("%H:%M:%S"));

    let fetch_config = FetchConfig {
        request_timeout: Duration::from_secs(args.timeout_secs),
        retry: RetryConfig {
            max_retries: args.retries,
            ..Default::default()
        },
        ..Default::default()
    };
    let coordinator_config = CoordinatorConfig {
        workers: args.workers,
        strategy: if args.balanced {
            PartitionStrategy::Balanced
        } else {
            PartitionStrategy::Remainder
        },
        deadline: args.deadline_secs.map(Duration::from_secs),
    };

    let fetcher = HttpPageFetcher::new(fetch_config)?;
    let coordinator = Coordinator::new(Arc::new(fetcher), coordinator_config);

    let report = coordinator
        .run(args.product_id, args.score, args.sort_type)
        .await?;

    if !report.is_complete() {
        eprintln!(
            "{} of {} pages could not be loaded: {:?}",
            report.failures.len(),
            report.max_page + 1,
            report.failed_pages()
        );
    }

    jd_comment_spider_rs::write_to_csv(&report.comments, &args.output)?;

    println!("The comments were saved in file {:?}", args.output);
    println!("{}", chrono::Local::now().format("%H:%M:%S"));

    Ok(())
}
