//! # Example: Graceful suspend of a toy server
//!
//! Three activities take part:
//! - `acceptor` (FIRST): stops accepting connections first, reopens last;
//! - `workers` (DEFAULT): drains in-flight jobs;
//! - `cache` (LAST): flushes once nothing else can write to it.
//!
//! Run with:
//! ```text
//! RUST_LOG=debug cargo run --example basic --features logging
//! ```

use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use suspendvisor::{
    ActivityError, ActivityFn, ActivityRef, ControllerConfig, LogWriter, Priority, ResumeContext,
    Subscribe, SuspendContext, SuspendController,
};

/// Activity whose phases just sleep for `work_ms`, honouring cancellation.
fn make_activity(name: &'static str, work_ms: u64) -> ActivityRef {
    let pause = Duration::from_millis(work_ms);
    ActivityFn::builder(name)
        .on_prepare(move |_ctx: SuspendContext, _cancel: CancellationToken| async move {
            println!("[{name}] prepare");
            Ok::<(), ActivityError>(())
        })
        .on_suspend(move |ctx: SuspendContext, cancel: CancellationToken| async move {
            println!("[{name}] suspending (stopping={})", ctx.is_stopping());
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = cancel.cancelled() => println!("[{name}] suspend abandoned"),
            }
            Ok::<(), ActivityError>(())
        })
        .on_resume(move |ctx: ResumeContext, _cancel: CancellationToken| async move {
            println!("[{name}] resuming (starting={})", ctx.is_starting());
            tokio::time::sleep(pause / 2).await;
            Ok::<(), ActivityError>(())
        })
        .arc()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let controller = SuspendController::builder(ControllerConfig::default())
        .with_subscribers(subs)
        .build();

    controller
        .register_activity(make_activity("acceptor", 50), Priority::FIRST)
        .await?;
    controller
        .register_activity(make_activity("workers", 200), Priority::DEFAULT)
        .await?;
    controller
        .register_activity(make_activity("cache", 100), Priority::LAST)
        .await?;

    println!("-- boot --");
    controller
        .resume(ResumeContext::new().with_starting(true))
        .await?;
    println!("state: {}", controller.state());

    println!("-- graceful suspend --");
    controller
        .suspend(SuspendContext::new())
        .with_timeout(Duration::from_secs(5))
        .await?;
    println!("state: {}", controller.state());

    println!("-- resume --");
    controller.resume(ResumeContext::new()).await?;
    println!("state: {}", controller.state());

    println!("-- suspend interrupted by resume --");
    let attempt = controller.suspend(SuspendContext::new().with_stopping(true));
    tokio::time::sleep(Duration::from_millis(120)).await;
    controller.resume(ResumeContext::new()).await?;
    match attempt.await {
        Ok(()) => println!("suspend finished before resume"),
        Err(e) => println!("suspend attempt: {}", e.as_message()),
    }
    println!("state: {}", controller.state());

    controller.close_listeners().await;
    Ok(())
}
