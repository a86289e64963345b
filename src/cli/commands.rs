use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::app::{AppContext, MergeError, Result};
use crate::domain::{DedupReport, RunStats};
use crate::pipeline::{DedupFilter, MergeCoordinator};
use crate::sink::FileSink;

/// Exit status of a run cut short by SIGINT/SIGTERM (128 + SIGINT).
pub const INTERRUPTED_EXIT_STATUS: u8 = 130;

/// Everything a finished run has to say about itself.
#[derive(Debug)]
pub struct RunSummary {
    pub run: RunStats,
    pub dedup: DedupReport,
    pub output_bytes: u64,
    pub error_bytes: u64,
    /// A shutdown signal arrived and the feeds were drained early.
    pub interrupted: bool,
}

impl RunSummary {
    /// 0 when every feed drained, [`INTERRUPTED_EXIT_STATUS`] otherwise.
    pub fn exit_status(&self) -> u8 {
        if self.interrupted {
            INTERRUPTED_EXIT_STATUS
        } else {
            0
        }
    }
}

/// Run the whole pipeline, stopping feeds early on SIGINT/SIGTERM.
pub async fn run_merge(ctx: &AppContext) -> Result<RunSummary> {
    let cancel = CancellationToken::new();
    let listener = spawn_shutdown_listener(cancel.clone());
    let result = run_pipeline(ctx, cancel).await;
    listener.abort();
    result
}

/// Wire channels, sinks, the dedup filter and the coordinator, then drain
/// them in order: feeds, page channel, filter, output sink, error sink.
pub async fn run_pipeline(ctx: &AppContext, cancel: CancellationToken) -> Result<RunSummary> {
    let pipeline = &ctx.config.pipeline;
    let output = &ctx.config.output;

    let (page_tx, page_rx) = mpsc::channel(pipeline.page_channel_capacity.max(1));
    let (err_tx, err_rx) = mpsc::channel(pipeline.error_channel_capacity.max(1));
    let (out_tx, out_rx) = mpsc::channel(pipeline.output_channel_capacity.max(1));

    // Both files exist before any feed is contacted
    let error_file = FileSink::create(&output.errors_path()).await?;
    let output_file = FileSink::create(&output.records_path()).await?;

    let error_sink = tokio::spawn(error_file.record_errors(err_rx));
    let output_sink = tokio::spawn(output_file.record_bytes(out_rx));

    let dedup = tokio::spawn(
        DedupFilter::new(pipeline.identity_field.clone())
            .with_diagnostics(pipeline.diagnostics)
            .run(page_rx, err_tx.clone(), out_tx),
    );

    let coordinator =
        MergeCoordinator::new(ctx.fetcher.clone(), pipeline.max_pages(), cancel.clone())
            .with_diagnostics(pipeline.diagnostics);

    info!(feeds = ctx.endpoints.len(), "Merging feeds");
    let merged = coordinator
        .run(&ctx.endpoints, &pipeline.path_suffix, &page_tx, &err_tx)
        .await;
    if let Err(e) = &merged {
        warn!("error merging feeds because {}", e);
    }

    // Last page sender: closing it lets the filter write the closing fragment
    drop(page_tx);
    let dedup_report = join(dedup, "dedup filter").await?;
    let output_bytes = join(output_sink, "output sink").await??;

    drop(err_tx);
    let error_bytes = join(error_sink, "error sink").await??;

    let run = merged?;
    Ok(RunSummary {
        run,
        dedup: dedup_report,
        output_bytes,
        error_bytes,
        interrupted: cancel.is_cancelled(),
    })
}

async fn join<T>(handle: JoinHandle<T>, what: &str) -> Result<T> {
    handle
        .await
        .map_err(|e| MergeError::Other(format!("{} task failed: {}", what, e)))
}

fn spawn_shutdown_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        watch_signals(cancel, wait_for_shutdown_signal).await;
        std::process::exit(INTERRUPTED_EXIT_STATUS.into());
    })
}

/// First signal cancels the run so it drains; returns on the second one.
async fn watch_signals<S, F>(cancel: CancellationToken, mut next_signal: S)
where
    S: FnMut() -> F,
    F: Future<Output = ()>,
{
    next_signal().await;
    warn!("Interrupt received; letting in-flight requests finish, then flushing output (interrupt again to abort)");
    cancel.cancel();

    next_signal().await;
    error!("Second interrupt received; aborting without waiting for in-flight requests");
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigterm), Ok(mut sigint)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) else {
        tracing::error!("Failed to set up signal handlers; interrupts will not drain the run");
        return std::future::pending().await;
    };

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to set up Ctrl-C handler; interrupts will not drain the run");
        std::future::pending::<()>().await;
    }
}

pub fn print_summary(ctx: &AppContext, summary: &RunSummary) {
    for (endpoint, feed) in ctx.endpoints.iter().zip(&summary.run.feeds) {
        if feed.errors > 0 {
            eprintln!(
                "  {}: {} pages, {} errors",
                endpoint.display_name(),
                feed.pages,
                feed.errors
            );
        } else {
            println!("  {}: {} pages", endpoint.display_name(), feed.pages);
        }
    }

    println!(
        "Merge complete: {} records kept, {} duplicates dropped, {} errors ({:.1}s)",
        summary.dedup.forwarded,
        summary.dedup.duplicate_count(),
        summary.run.total_errors() as u64
            + summary.dedup.parse_errors
            + summary.dedup.marshal_errors,
        summary.run.elapsed_secs()
    );
    println!(
        "Output: {} ({} bytes)",
        ctx.config.output.records_path().display(),
        summary.output_bytes
    );
    if summary.error_bytes > 0 {
        println!(
            "Errors: {} ({} bytes)",
            ctx.config.output.errors_path().display(),
            summary.error_bytes
        );
    }
    if summary.interrupted {
        eprintln!("Run was interrupted; only pages fetched before the interrupt are included");
    }
}
