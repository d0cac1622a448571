//! Perf Toolkit demo
//!
//! Wires the shared instances from environment configuration, runs a short
//! workload through them and prints the resulting statistics as JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perf_toolkit::{
    debounce, memoize, DebounceOptions, MemoizeOptions, Toolkit, ToolkitConfig, WindowCalculator,
    WindowConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perf_toolkit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ToolkitConfig::from_env();
    info!(?config, "Configuration loaded");

    let toolkit = Toolkit::from_config(&config).context("building toolkit")?;
    toolkit.monitor.write().await.mark("demo:start");

    run_queue_workload(&toolkit).await;
    run_memoize_demo();
    run_debounce_demo().await;
    run_window_demo()?;

    toolkit
        .monitor
        .write()
        .await
        .measure("demo", "demo:start", None);

    let swept = toolkit.cleanup().await;
    info!(swept, "Expired cache entries removed");

    let snapshot = toolkit.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Pushes a handful of jobs through the shared queue, caching their results
/// and timing each one.
async fn run_queue_workload(toolkit: &Toolkit) {
    let handles: Vec<_> = (0..8u64)
        .map(|id| {
            let toolkit = toolkit.clone();
            let queue = toolkit.queue.clone();
            queue.add(move || async move {
                let mark = format!("job:{}:start", id);
                toolkit.monitor.write().await.mark(mark.clone());

                tokio::time::sleep(Duration::from_millis(10 * (id % 3 + 1))).await;
                if id == 5 {
                    anyhow::bail!("job {} rejected", id);
                }

                let value = json!({ "id": id, "square": id * id });
                toolkit
                    .api_cache
                    .write()
                    .await
                    .set(format!("job:{}", id), value.clone(), None);
                toolkit.monitor.write().await.measure("job", &mark, None);
                Ok(value)
            })
        })
        .collect();

    for handle in handles {
        match handle.await {
            Ok(value) => info!(%value, "Job finished"),
            Err(err) => warn!(error = %err, "Job did not finish"),
        }
    }
}

fn run_memoize_demo() {
    let fib = memoize(
        |n: u64| {
            let (mut a, mut b) = (0u64, 1u64);
            for _ in 0..n {
                (a, b) = (b, a.wrapping_add(b));
            }
            a
        },
        MemoizeOptions::new().max_size(16),
    );

    for n in [40, 40, 60, 40] {
        info!(n, value = fib.call(n), "Fibonacci");
    }
    info!(stats = ?fib.get_stats(), "Memoized fibonacci");
}

async fn run_debounce_demo() {
    let searches = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&searches);
    let search = debounce(
        move |query: String| sink.lock().push(query),
        Duration::from_millis(50),
        DebounceOptions::default(),
    );

    for prefix in ["r", "ru", "rus", "rust"] {
        search.call(prefix.to_string());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    info!(queries = ?searches.lock(), "Debounced searches");
}

fn run_window_demo() -> anyhow::Result<()> {
    let window = WindowCalculator::from_config(&WindowConfig::new(20.0, 100.0).with_overscan(1))?;
    let rows: Vec<u32> = (0..1000).collect();
    let visible = window.visible_items(&rows, 200.0);

    if let Some(range) = visible.range {
        info!(
            start = range.start_index,
            end = range.end_index,
            offset_y = range.offset_y,
            rows = visible.items.len(),
            total_height = window.total_height(rows.len()),
            "Visible window"
        );
    }
    Ok(())
}
