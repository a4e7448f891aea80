use std::time::Instant;

use caterpillar::{config::Config, logging::init_tracing, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;
    let _log_guard = init_tracing(&config.log)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.max_workers)
        .enable_all()
        .build()?;

    let started = Instant::now();
    let result = runtime.block_on(server::run(config));
    tracing::info!(run_time = ?started.elapsed(), "run summary");

    if let Err(err) = &result {
        tracing::error!(error = %err, "caterpillar exited with error");
    }
    result?;
    Ok(())
}
